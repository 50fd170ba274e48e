//! Command construction and build-directory inspection.
//!
//! Nothing in this module spawns a process; it builds commands and reads or
//! rewrites the files the external tools generate.

pub mod build_info;
pub mod cmake;
pub mod conan;
pub mod consistency;
pub mod platform;
pub mod presets;
pub mod strategy;

pub use build_info::{BuildInfoLocator, BuildMetadataMerger, DependencyBuildInfo};
pub use cmake::CMakeInvocation;
pub use conan::ConanInvocation;
pub use consistency::ConsistencyGate;
pub use platform::PlatformVariantResolver;
pub use presets::{PresetNames, PresetReconciler, ReconcileOutcome};
pub use strategy::{CommandBuilder, CommandBuilderStrategy, DefaultStrategy, MacOsStrategy};
