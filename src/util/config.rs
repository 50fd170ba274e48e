//! Configuration file support for extforge.
//!
//! Two configuration file locations are read:
//! - Global: `~/.extforge/config.toml` - User-wide defaults
//! - Project: `.extforge/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::CompilerKind;
use crate::util::process::{ToolLocator, ToolSource};

/// extforge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Interpreter to build for (defaults to `python3` on PATH)
    pub python: Option<PathBuf>,

    /// Temporary build directory
    pub build_temp: Option<PathBuf>,

    /// Output directory for built extensions
    pub build_lib: Option<PathBuf>,

    /// Explicit cmake executable
    pub cmake: Option<PathBuf>,

    /// Directory holding the cmake executable (search is scoped to it)
    pub cmake_dir: Option<PathBuf>,

    /// Explicit conan executable
    pub conan: Option<PathBuf>,

    /// Directory holding the conan executable (search is scoped to it)
    pub conan_dir: Option<PathBuf>,

    /// Compiler family used for link fixups (unix, msvc, mingw32)
    pub compiler: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let BuildConfig {
            python,
            build_temp,
            build_lib,
            cmake,
            cmake_dir,
            conan,
            conan_dir,
            compiler,
        } = other.build;

        if python.is_some() {
            self.build.python = python;
        }
        if build_temp.is_some() {
            self.build.build_temp = build_temp;
        }
        if build_lib.is_some() {
            self.build.build_lib = build_lib;
        }
        if cmake.is_some() {
            self.build.cmake = cmake;
        }
        if cmake_dir.is_some() {
            self.build.cmake_dir = cmake_dir;
        }
        if conan.is_some() {
            self.build.conan = conan;
        }
        if conan_dir.is_some() {
            self.build.conan_dir = conan_dir;
        }
        if compiler.is_some() {
            self.build.compiler = compiler;
        }
    }

    /// Tool locations described by this config.
    pub fn tools(&self) -> ToolLocator {
        ToolLocator {
            conan: ToolSource::from_config(self.build.conan.clone(), self.build.conan_dir.clone()),
            cmake: ToolSource::from_config(self.build.cmake.clone(), self.build.cmake_dir.clone()),
        }
    }

    /// Configured compiler family, or the host default.
    pub fn compiler(&self) -> Result<CompilerKind> {
        match &self.build.compiler {
            Some(name) => name.parse().map_err(|e| anyhow::anyhow!("{}", e)),
            None => Ok(CompilerKind::host_default()),
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.extforge/config.toml)
/// 2. Global config (~/.extforge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global extforge config directory (~/.extforge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".extforge"))
}

/// Get the project config path (.extforge/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".extforge").join("config.toml")
}
