//! Test utilities for extforge unit tests.
//!
//! Nothing here spawns a process: [`RecordingRunner`] stands in for the
//! external tools and can simulate the files they generate.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;

use crate::core::InterpreterInfo;
use crate::util::errors::ExtforgeError;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::report::{Reporter, Status};

/// A Linux-style CPython 3.12 with nanobind installed.
pub fn interpreter() -> InterpreterInfo {
    InterpreterInfo {
        executable: PathBuf::from("/usr/bin/python3"),
        prefix: Some(PathBuf::from("/usr")),
        include_dir: PathBuf::from("/usr/include/python3.12"),
        version: (3, 12),
        configure_cflags: None,
        macosx_deployment_target: None,
        nanobind_cmake_dir: Some(PathBuf::from("/usr/lib/nanobind/cmake")),
    }
}

type Hook = Box<dyn Fn(&ProcessBuilder) + Send + Sync>;

/// Records every command instead of running it.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<String>>,
    fail_prefix: Option<String>,
    hook: Option<Hook>,
}

impl RecordingRunner {
    /// Fail any command whose display form starts with `prefix`.
    pub fn failing_on(prefix: &str) -> Self {
        RecordingRunner {
            fail_prefix: Some(prefix.to_string()),
            ..Self::default()
        }
    }

    /// Call `hook` after each successful command, e.g. to write the files
    /// the real tool would have generated.
    pub fn with_hook(hook: impl Fn(&ProcessBuilder) + Send + Sync + 'static) -> Self {
        RecordingRunner {
            hook: Some(Box::new(hook)),
            ..Self::default()
        }
    }

    /// Commands run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<()> {
        let line = cmd.display_command();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        if let Some(prefix) = &self.fail_prefix {
            if line.starts_with(prefix.as_str()) {
                return Err(ExtforgeError::ExternalCommandFailure {
                    command: line,
                    code: Some(1),
                }
                .into());
            }
        }

        if let Some(hook) = &self.hook {
            hook(cmd);
        }
        Ok(())
    }
}

/// Collects reported messages.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    statuses: Mutex<Vec<(Status, String)>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn statuses(&self) -> Vec<(Status, String)> {
        self.statuses.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn status(&self, status: Status, message: &str) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push((status, message.to_string()));
        }
    }

    fn warn(&self, message: &str) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(message.to_string());
        }
    }

    fn debug(&self, _message: &str) {}
}
