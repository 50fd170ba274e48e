//! `Extforge.toml` parsing.
//!
//! ```toml
//! [package]
//! name = "uiucprescon.pymediaconch"
//!
//! [[extension]]
//! name = "uiucprescon.pymediaconch.mediaconch"
//! sources = ["src/uiucprescon/pymediaconch/pymediaconch.cpp"]
//! libraries = ["mediaconch"]
//! conanfile = "conanfile.py"
//! cxx-std = 11
//! py-limited-api = true
//! cmake-args = ["-Duiucprescon_PyMediaConch_build_python_extension=ON"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::descriptor::{parse_definition, LinkDescriptor};
use crate::util::fs::resolve_against;

/// Parsed manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub package: PackageMeta,

    #[serde(default, rename = "extension")]
    pub extensions: Vec<Extension>,

    /// Directory containing the manifest; not part of the file.
    #[serde(skip)]
    pub root: PathBuf,
}

/// `[package]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMeta {
    pub name: String,
    /// Directory holding the Python packages, for in-place builds
    #[serde(default, rename = "package-dir")]
    pub package_dir: Option<PathBuf>,
}

/// One `[[extension]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Extension {
    /// Dotted module name, e.g. `pkg.sub.module`
    pub name: String,
    pub sources: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    /// `NAME` or `NAME=VALUE`
    pub define_macros: Vec<String>,
    /// Dependency recipe passed to `conan install` (defaults to the project root)
    pub conanfile: Option<PathBuf>,
    pub cxx_std: Option<u32>,
    pub py_limited_api: bool,
    /// Extra arguments passed verbatim to the CMake configure step
    pub cmake_args: Vec<String>,
}

impl Manifest {
    /// Load and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        let mut manifest: Manifest = toml::from_str(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;

        manifest.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            bail!("`{}` declares no [[extension]] entries", self.package.name);
        }
        let mut seen: Vec<&str> = Vec::new();
        for ext in &self.extensions {
            if ext.name.is_empty() {
                bail!("extension without a name in `{}`", self.package.name);
            }
            if seen.contains(&ext.name.as_str()) {
                bail!("extension `{}` declared twice", ext.name);
            }
            seen.push(&ext.name);
        }
        Ok(())
    }

    /// Install prefix for in-place builds.
    pub fn inplace_dir(&self) -> PathBuf {
        match &self.package.package_dir {
            Some(dir) => resolve_against(&self.root, dir),
            None => self.root.clone(),
        }
    }

    /// Find an extension by name.
    pub fn extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.name == name)
    }

    /// Select extensions by name; an empty selection means all of them.
    pub fn select(&self, names: &[String]) -> Result<Vec<&Extension>> {
        if names.is_empty() {
            return Ok(self.extensions.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.extension(name)
                    .with_context(|| format!("no extension named `{}`", name))
            })
            .collect()
    }
}

impl Extension {
    /// Initial link descriptor from the manifest's own settings.
    ///
    /// Relative directories are resolved against the project root.
    pub fn descriptor(&self, root: &Path) -> LinkDescriptor {
        let mut desc = LinkDescriptor::new();
        desc.append_libraries(self.libraries.iter().cloned());
        desc.append_include_dirs(self.include_dirs.iter().map(|d| resolve_against(root, d)));
        desc.append_library_dirs(self.library_dirs.iter().map(|d| resolve_against(root, d)));
        desc.append_macros(self.define_macros.iter().map(|d| parse_definition(d)));
        desc
    }

    /// Directory name used under the build temp directory.
    pub fn build_dir_name(&self) -> String {
        format!("{}_build", self.name)
    }
}
