//! Environment checks for `extforge check`.
//!
//! Verifies that everything a build needs can be found before any
//! external tool runs:
//!
//! - the target interpreter and its nanobind installation
//! - `conan` and `cmake`
//! - the platform variant the build would use

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::PlatformVariantResolver;
use crate::core::interpreter::locate_python;
use crate::core::{HostPlatform, InterpreterInfo, PlatformVariant};
use crate::util::context::GlobalContext;
use crate::util::process::{ProcessBuilder, ToolSource};
use crate::util::report::TracingReporter;

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..Self::pass(name, message)
        }
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Summary of all checks.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub checks: Vec<CheckResult>,

    /// Variant a build on this host would use, when the interpreter was found
    pub variant: Option<PlatformVariant>,
}

impl CheckReport {
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }
}

/// Run every check for a project rooted at `root`.
pub fn check(root: &Path, ctx: &GlobalContext, python: Option<&Path>) -> CheckReport {
    let config = ctx.load_config(root);
    let tools = config.tools();
    let mut report = CheckReport::default();

    let python = python.map(Path::to_path_buf).or(config.build.python);
    match probe_interpreter(python.as_deref()) {
        Ok(info) => {
            report.add(
                CheckResult::pass(
                    "Python",
                    format!("Python {} ({})", info.version_tag(), info.executable.display()),
                )
                .with_path(info.executable.clone()),
            );
            report.add(check_nanobind(&info));
            report.variant = Some(
                PlatformVariantResolver::new(&info, ctx.env())
                    .resolve(HostPlatform::current(), &TracingReporter),
            );
        }
        Err(e) => report.add(CheckResult::fail("Python", format!("{:#}", e))),
    }

    report.add(check_tool("conan", &tools.conan));
    report.add(check_tool("cmake", &tools.cmake));
    report
}

fn probe_interpreter(python: Option<&Path>) -> Result<InterpreterInfo> {
    let python = locate_python(python)?;
    InterpreterInfo::probe(&python)
}

fn check_nanobind(info: &InterpreterInfo) -> CheckResult {
    match info.nanobind_dir() {
        Ok(dir) => CheckResult::pass("nanobind", "nanobind CMake package found")
            .with_path(dir.to_path_buf()),
        Err(e) => CheckResult::fail("nanobind", e.to_string()),
    }
}

/// Locate a tool and ask it for its version.
pub fn check_tool(name: &str, source: &ToolSource) -> CheckResult {
    let path = match source.locate(name) {
        Ok(path) => path,
        Err(e) => return CheckResult::fail(name, e.to_string()),
    };

    match ProcessBuilder::new(&path).arg("--version").exec_and_check() {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let version = stdout.lines().next().unwrap_or("").trim().to_string();
            CheckResult::pass(name, format!("{} is available", name))
                .with_path(path)
                .with_version(version)
        }
        Err(e) => CheckResult::fail(name, format!("{:#}", e)).with_path(path),
    }
}

/// Format a report for the terminal.
pub fn format_report(report: &CheckReport, verbose: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let _ = writeln!(output, "  {} {}", status, check.name);

        if verbose || !check.passed {
            let _ = writeln!(output, "      {}", check.message);
        }
        if verbose {
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
            if let Some(version) = &check.version {
                let _ = writeln!(output, "      Version: {}", version);
            }
        }
    }

    if let Some(variant) = &report.variant {
        let _ = writeln!(output, "\nPlatform ({}):", HostPlatform::current());
        let arches = if variant.has_architectures() {
            variant.architectures.join(", ")
        } else {
            "(default)".to_string()
        };
        let _ = writeln!(output, "  architectures: {}", arches);
        if let Some(version) = &variant.min_os_version {
            let _ = writeln!(output, "  minimum OS version: {}", version);
        }
    }

    let failed = report.failed_count();
    if failed == 0 {
        let _ = writeln!(output, "\nAll checks passed.");
    } else {
        let _ = writeln!(output, "\n{} check(s) failed.", failed);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::interpreter;
    use tempfile::TempDir;

    #[test]
    fn test_missing_tool_fails() {
        let tmp = TempDir::new().unwrap();
        let source = ToolSource::Search {
            dir: Some(tmp.path().to_path_buf()),
        };

        let result = check_tool("conan", &source);

        assert!(!result.passed);
        assert!(result.message.contains("conan"));
        assert!(result.path.is_none());
    }

    #[test]
    fn test_nanobind_check() {
        assert!(check_nanobind(&interpreter()).passed);

        let mut info = interpreter();
        info.nanobind_cmake_dir = None;
        assert!(!check_nanobind(&info).passed);
    }

    #[test]
    fn test_format_report() {
        let mut report = CheckReport::default();
        report.add(CheckResult::pass("cmake", "cmake is available").with_version("cmake version 3.28.1"));
        report.add(CheckResult::fail("conan", "conan not found"));
        report.variant = Some(PlatformVariant {
            architectures: vec!["arm64".to_string()],
            min_os_version: Some("11.0".to_string()),
        });

        let text = format_report(&report, false);

        assert!(text.contains("[OK] cmake"));
        assert!(text.contains("[!!] conan"));
        assert!(text.contains("conan not found"));
        assert!(!text.contains("cmake version 3.28.1"));
        assert!(text.contains("architectures: arm64"));
        assert!(text.contains("1 check(s) failed."));
        assert!(format_report(&report, true).contains("Version: cmake version 3.28.1"));
    }
}
