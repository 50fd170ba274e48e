//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// extforge - build native Python extensions with conan and CMake
#[derive(Parser)]
#[command(name = "extforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Interpreter to build for (defaults to `python3` on PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub python: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build extensions into the build-lib directory
    Build(BuildArgs),

    /// Build extensions in place, next to the Python sources
    Develop(DevelopArgs),

    /// Print the merged link descriptor of an extension as JSON
    Descriptor(DescriptorArgs),

    /// Rename the generated CMake presets for the current interpreter
    Presets(PresetsArgs),

    /// Check that the interpreter, nanobind, conan and cmake can be found
    Check,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Specific extensions to build (default: all)
    #[arg(short, long = "extension", value_name = "NAME")]
    pub extensions: Vec<String>,

    /// Directory the built extensions are installed into
    #[arg(long, value_name = "DIR")]
    pub build_lib: Option<PathBuf>,
}

#[derive(Args)]
pub struct DevelopArgs {
    /// Specific extensions to build (default: all)
    #[arg(short, long = "extension", value_name = "NAME")]
    pub extensions: Vec<String>,
}

#[derive(Args)]
pub struct DescriptorArgs {
    /// Extension name as declared in Extforge.toml
    pub extension: String,

    /// Only merge this dependency's build info
    #[arg(long, value_name = "NAME")]
    pub dependency: Option<String>,

    /// Build path to read conan's output from
    #[arg(long, value_name = "DIR")]
    pub build_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct PresetsArgs {
    /// New configure preset name
    pub config: String,

    /// New build preset name
    pub build: String,

    /// New test preset name
    pub test: String,

    /// Top-level presets file
    #[arg(long, value_name = "FILE", default_value = "CMakeUserPresets.json")]
    pub file: PathBuf,

    /// Only accept a generated document under this build directory
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,
}
