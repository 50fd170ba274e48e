//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod errors;
pub mod fs;
pub mod process;
pub mod report;

pub use config::Config;
pub use context::{EnvSnapshot, GlobalContext};
pub use diagnostic::Diagnostic;
pub use errors::{ExtforgeError, Inconsistency};
pub use report::{Reporter, Status, TracingReporter};
