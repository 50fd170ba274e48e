//! Subprocess execution utilities.
//!
//! Commands are always argument lists. Nothing here goes through a shell.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};

use crate::util::errors::ExtforgeError;

/// Builder for subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command, capturing its output.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd.output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))
    }

    /// Execute with captured output and require success.
    pub fn exec_and_check(&self) -> Result<Output> {
        let output = self.exec()?;
        if !output.status.success() {
            let err = anyhow::Error::new(ExtforgeError::ExternalCommandFailure {
                command: self.display_command(),
                code: output.status.code(),
            });
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(if stderr.is_empty() { err } else { err.context(stderr) });
        }
        Ok(output)
    }

    /// Execute with inherited stdio so tool output streams to the user,
    /// and require success.
    pub fn run(&self) -> Result<()> {
        let status = self
            .build_command()
            .status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))?;

        if !status.success() {
            return Err(ExtforgeError::ExternalCommandFailure {
                command: self.display_command(),
                code: status.code(),
            }
            .into());
        }
        Ok(())
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Runs external commands to completion.
///
/// The orchestrator only talks to the outside world through this seam, so
/// tests can swap in a recording runner.
pub trait CommandRunner {
    /// Run the command, blocking until it exits. Non-zero exit is an error.
    fn run(&self, cmd: &ProcessBuilder) -> Result<()>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<()> {
        tracing::debug!("Running `{}`", cmd.display_command());
        cmd.run()
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, cmd: &ProcessBuilder) -> Result<()> {
        (**self).run(cmd)
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find an executable inside a specific directory only.
pub fn find_executable_in(name: &str, dir: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    which::which_in(name, Some(dir), cwd).ok()
}

/// Where to look for one external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolSource {
    /// Search PATH, or only the given directory when set.
    Search { dir: Option<PathBuf> },
    /// Use this program as-is.
    Fixed(PathBuf),
}

impl Default for ToolSource {
    fn default() -> Self {
        ToolSource::Search { dir: None }
    }
}

impl ToolSource {
    /// Build a source from config values; an explicit program wins over a directory.
    pub fn from_config(program: Option<PathBuf>, dir: Option<PathBuf>) -> Self {
        match program {
            Some(program) => ToolSource::Fixed(program),
            None => ToolSource::Search { dir },
        }
    }

    /// Resolve the executable, failing with `ToolNotFound` when absent.
    pub fn locate(&self, name: &str) -> Result<PathBuf, ExtforgeError> {
        match self {
            ToolSource::Fixed(program) => Ok(program.clone()),
            ToolSource::Search { dir: Some(dir) } => find_executable_in(name, dir)
                .ok_or_else(|| ExtforgeError::tool_not_found(name, Some(dir.clone()))),
            ToolSource::Search { dir: None } => {
                find_executable(name).ok_or_else(|| ExtforgeError::tool_not_found(name, None))
            }
        }
    }
}

/// Locations of the external tools the orchestrator drives.
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    pub conan: ToolSource,
    pub cmake: ToolSource,
}

impl ToolLocator {
    /// Use fixed programs for both tools.
    pub fn fixed(conan: impl Into<PathBuf>, cmake: impl Into<PathBuf>) -> Self {
        ToolLocator {
            conan: ToolSource::Fixed(conan.into()),
            cmake: ToolSource::Fixed(cmake.into()),
        }
    }
}
