//! extforge - builds native Python extensions with conan and CMake
//!
//! The library drives two external tools: conan installs the C/C++
//! dependencies, and CMake configures, builds and installs the extension
//! against the interpreter running the build.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities for extforge unit tests.
///
/// Only available when compiling tests. Provides an interpreter fixture and
/// recording stand-ins for the command runner and reporter.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{Extension, InterpreterInfo, LinkDescriptor, Manifest};
pub use util::context::GlobalContext;
pub use util::errors::ExtforgeError;
