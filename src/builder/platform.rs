//! Platform variant resolution.
//!
//! Derives target architectures and the minimum macOS version from the
//! interpreter's compile flags and the captured environment. Pure: the same
//! inputs always give the same variant.

use crate::core::{HostPlatform, InterpreterInfo, PlatformVariant};
use crate::util::context::EnvSnapshot;
use crate::util::errors::ExtforgeError;
use crate::util::report::Reporter;

/// Architecture tokens searched for in `CONFIGURE_CFLAGS`, in this order.
pub const ARCH_CANDIDATES: [&str; 2] = ["arm64", "x86_64"];

/// Lowest macOS version the binding layer supports.
pub const MIN_MACOS_FLOOR: (u32, u32) = (10, 13);

/// Map a compiler architecture token to conan's name for it.
pub fn conan_arch(arch: &str) -> &str {
    match arch {
        "arm64" => "armv8",
        other => other,
    }
}

/// Resolves a [`PlatformVariant`] from interpreter facts and environment.
#[derive(Debug, Clone, Copy)]
pub struct PlatformVariantResolver<'a> {
    interpreter: &'a InterpreterInfo,
    env: &'a EnvSnapshot,
}

impl<'a> PlatformVariantResolver<'a> {
    pub fn new(interpreter: &'a InterpreterInfo, env: &'a EnvSnapshot) -> Self {
        PlatformVariantResolver { interpreter, env }
    }

    /// Architectures named in the interpreter's compile flags.
    ///
    /// Fails with `NoArchitectureDetected` when none of the candidates
    /// appear; callers are expected to fall back to the default architecture.
    pub fn detect_architectures(&self) -> Result<Vec<String>, ExtforgeError> {
        let cflags = self.interpreter.configure_cflags.as_deref().unwrap_or("");
        let arches: Vec<String> = ARCH_CANDIDATES
            .iter()
            .filter(|arch| cflags.contains(*arch))
            .map(|arch| arch.to_string())
            .collect();

        if arches.is_empty() {
            return Err(ExtforgeError::NoArchitectureDetected {
                cflags: cflags.to_string(),
            });
        }
        Ok(arches)
    }

    /// Minimum macOS version to target.
    ///
    /// An explicit `MACOSX_DEPLOYMENT_TARGET` always wins. Otherwise the
    /// interpreter's own build value is used, with a `.0` minor added to a
    /// bare major version and anything below 10.13 raised to 10.13.
    pub fn min_os_version(&self) -> String {
        if let Some(explicit) = &self.env.macosx_deployment_target {
            return explicit.clone();
        }

        let built_with = match self.interpreter.macosx_deployment_target.as_deref() {
            Some(v) if !v.trim().is_empty() => v.trim(),
            _ => return format_version(MIN_MACOS_FLOOR),
        };

        match parse_version(built_with) {
            Some(version) if version < MIN_MACOS_FLOOR => format_version(MIN_MACOS_FLOOR),
            Some(_) if !built_with.contains('.') => format!("{}.0", built_with),
            Some(_) => built_with.to_string(),
            // Unparseable values are passed through for the tools to judge
            None => built_with.to_string(),
        }
    }

    /// Resolve the full variant for a host.
    ///
    /// Architecture detection failure degrades to an empty list, with a
    /// warning sent to `reporter`. The minimum OS version is only set on
    /// macOS.
    pub fn resolve(&self, host: HostPlatform, reporter: &dyn Reporter) -> PlatformVariant {
        match host {
            HostPlatform::Default => PlatformVariant::default(),
            HostPlatform::MacOs => {
                let architectures = self.detect_architectures().unwrap_or_else(|e| {
                    reporter.warn(&format!("{}; using the default architecture", e));
                    Vec::new()
                });
                PlatformVariant {
                    architectures,
                    min_os_version: Some(self.min_os_version()),
                }
            }
        }
    }
}

/// Parse `major[.minor[.patch]]`, ignoring anything past the minor.
fn parse_version(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(minor) => minor.parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}

fn format_version((major, minor): (u32, u32)) -> String {
    format!("{}.{}", major, minor)
}
