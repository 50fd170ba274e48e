//! Facts about the Python interpreter driving the build.
//!
//! The interpreter is probed once per process by running a short script that
//! prints its sysconfig values as JSON. Everything downstream works from the
//! resulting [`InterpreterInfo`] and never runs Python again.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::errors::ExtforgeError;
use crate::util::process::{find_executable, ProcessBuilder};

const PROBE_SCRIPT: &str = r#"
import json, sys, sysconfig
paths = sysconfig.get_paths()
cfg = sysconfig.get_config_vars()
def text(value):
    return None if value is None else str(value)
try:
    import nanobind
    nanobind_dir = nanobind.cmake_dir()
except ImportError:
    nanobind_dir = None
print(json.dumps({
    "executable": sys.executable,
    "prefix": paths.get("data"),
    "include_dir": paths.get("include"),
    "version": [sys.version_info[0], sys.version_info[1]],
    "configure_cflags": text(cfg.get("CONFIGURE_CFLAGS")),
    "macosx_deployment_target": text(cfg.get("MACOSX_DEPLOYMENT_TARGET")),
    "nanobind_cmake_dir": nanobind_dir,
}))
"#;

/// Interpreter paths and build configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterInfo {
    /// `sys.executable`
    pub executable: PathBuf,
    /// Installation prefix (`sysconfig.get_paths()["data"]`)
    pub prefix: Option<PathBuf>,
    /// Header directory
    pub include_dir: PathBuf,
    /// `(major, minor)`
    pub version: (u32, u32),
    /// `CONFIGURE_CFLAGS` the interpreter was built with
    #[serde(default)]
    pub configure_cflags: Option<String>,
    /// `MACOSX_DEPLOYMENT_TARGET` the interpreter was built with
    #[serde(default)]
    pub macosx_deployment_target: Option<String>,
    /// CMake package directory of the installed nanobind, if any
    #[serde(default)]
    pub nanobind_cmake_dir: Option<PathBuf>,
}

impl InterpreterInfo {
    /// Probe the given interpreter.
    pub fn probe(python: &Path) -> Result<Self> {
        tracing::debug!("Probing interpreter {}", python.display());
        let output = ProcessBuilder::new(python)
            .arg("-c")
            .arg(PROBE_SCRIPT)
            .exec_and_check()
            .with_context(|| format!("failed to query interpreter {}", python.display()))?;

        Self::from_probe_output(&String::from_utf8_lossy(&output.stdout))
            .with_context(|| format!("unexpected probe output from {}", python.display()))
    }

    /// Parse the JSON printed by the probe script.
    pub fn from_probe_output(stdout: &str) -> Result<Self> {
        let info: InterpreterInfo = serde_json::from_str(stdout.trim())?;
        Ok(info)
    }

    /// Installation prefix, which CMake needs as `Python_ROOT_DIR`.
    pub fn prefix(&self) -> Result<&Path> {
        self.prefix
            .as_deref()
            .context("unable to locate python installation prefix")
    }

    /// nanobind's CMake directory, which the generated project needs.
    pub fn nanobind_dir(&self) -> Result<&Path, ExtforgeError> {
        self.nanobind_cmake_dir
            .as_deref()
            .ok_or_else(|| ExtforgeError::tool_not_found("nanobind", Some(self.executable.clone())))
    }

    /// Short version tag, e.g. `3.12`.
    pub fn version_tag(&self) -> String {
        format!("{}.{}", self.version.0, self.version.1)
    }
}

/// Resolve which interpreter to build for.
///
/// An explicit path is used as-is; otherwise `python3` (or `python`) is
/// looked up on PATH.
pub fn locate_python(explicit: Option<&Path>) -> Result<PathBuf, ExtforgeError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    ["python3", "python"]
        .iter()
        .find_map(|name| find_executable(name))
        .ok_or_else(|| ExtforgeError::tool_not_found("python3", None))
}
