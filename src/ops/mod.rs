//! High-level operations.
//!
//! This module contains the implementation of extforge commands.

pub mod check;
pub mod descriptor;
pub mod extforge_build;

pub use check::{check, format_report, CheckReport, CheckResult};
pub use descriptor::{link_descriptor, DescriptorOptions};
pub use extforge_build::{
    build, limited_api_tag, system_builder, BuildMode, BuildOptions, BuildPaths, BuildReport,
    ExtensionBuilder,
};
