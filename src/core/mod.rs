//! Core data types: manifest, interpreter facts, platform and the link
//! descriptor.

pub mod descriptor;
pub mod interpreter;
pub mod manifest;
pub mod platform;

pub use descriptor::LinkDescriptor;
pub use interpreter::InterpreterInfo;
pub use manifest::{Extension, Manifest};
pub use platform::{CompilerKind, HostPlatform, PlatformVariant};
