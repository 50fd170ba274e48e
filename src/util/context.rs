//! Global context for extforge operations.
//!
//! Provides centralized access to paths, configuration and the environment
//! variables the orchestrator honours. The environment is captured once into
//! an [`EnvSnapshot`] so the rest of the crate never reads process-wide state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_dir, load_config, project_config_path, Config};
use crate::util::errors::ExtforgeError;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Extforge.toml";

/// Overrides the temporary build directory.
pub const BUILD_TEMP_ENV: &str = "EXTFORGE_BUILD_TEMP_DIR";

/// Overrides the minimum macOS version.
pub const DEPLOYMENT_TARGET_ENV: &str = "MACOSX_DEPLOYMENT_TARGET";

/// Environment values read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    /// `EXTFORGE_BUILD_TEMP_DIR`
    pub build_temp_dir: Option<PathBuf>,
    /// `MACOSX_DEPLOYMENT_TARGET`
    pub macosx_deployment_target: Option<String>,
}

impl EnvSnapshot {
    /// Capture the relevant variables from the process environment.
    /// Empty values count as unset.
    pub fn capture() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        EnvSnapshot {
            build_temp_dir: non_empty(BUILD_TEMP_ENV).map(PathBuf::from),
            macosx_deployment_target: non_empty(DEPLOYMENT_TARGET_ENV),
        }
    }
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global extforge data (~/.extforge/)
    home: Option<PathBuf>,

    /// Captured environment
    env: EnvSnapshot,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process state.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext {
            cwd,
            home: global_config_dir(),
            env: EnvSnapshot::capture(),
            verbose: false,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Replace the captured environment.
    pub fn with_env(mut self, env: EnvSnapshot) -> Self {
        self.env = env;
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the captured environment.
    pub fn env(&self) -> &EnvSnapshot {
        &self.env
    }

    /// Get the global configuration file path, if a home directory exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join("config.toml"))
    }

    /// Load global + project configuration for a project root.
    pub fn load_config(&self, project_root: &Path) -> Config {
        let global = self.config_path().unwrap_or_default();
        load_config(&global, &project_config_path(project_root))
    }

    /// Find `Extforge.toml` starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf, ExtforgeError> {
        let mut searched = Vec::new();
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(MANIFEST_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate);
            if !current.pop() {
                return Err(ExtforgeError::artifact_not_found(MANIFEST_NAME, searched));
            }
        }
    }
}
