//! Progress reporting for build steps.
//!
//! The orchestrator receives a [`Reporter`] at construction instead of
//! reaching for a global logger. Production code uses [`TracingReporter`];
//! tests use a recorder that keeps every message.

use std::fmt;

/// Semantic status of a reported step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // In-progress
    Resolving,
    Configuring,
    Building,

    // Done
    Finished,
    Updated,

    // Informational
    Info,
}

impl Status {
    /// Get the display text for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Resolving => "Resolving",
            Status::Configuring => "Configuring",
            Status::Building => "Building",
            Status::Finished => "Finished",
            Status::Updated => "Updated",
            Status::Info => "Info",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Right-aligned like cargo status lines
        write!(f, "{:>12}", self.as_str())
    }
}

/// Sink for orchestration progress messages.
pub trait Reporter {
    /// A user-visible step.
    fn status(&self, status: Status, message: &str);

    /// Something suspicious that does not stop the build.
    fn warn(&self, message: &str);

    /// Detail only shown in verbose mode.
    fn debug(&self, message: &str);
}

/// Reporter backed by `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn status(&self, status: Status, message: &str) {
        tracing::info!("{} {}", status, message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn status(&self, status: Status, message: &str) {
        (**self).status(status, message)
    }

    fn warn(&self, message: &str) {
        (**self).warn(message)
    }

    fn debug(&self, message: &str) {
        (**self).debug(message)
    }
}
