//! Host platform, compiler family and the per-build platform variant.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The host platform, as far as command construction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    /// Linux, Windows and everything without special handling
    Default,
    /// macOS: deployment target and universal-binary architectures
    MacOs,
}

impl HostPlatform {
    /// Platform of the running process. Decided at compile time.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            HostPlatform::MacOs
        } else {
            HostPlatform::Default
        }
    }

    /// Get the platform name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            HostPlatform::Default => "default",
            HostPlatform::MacOs => "macos",
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiler family used for the extension, for link fixups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerKind {
    Unix,
    Msvc,
    Mingw32,
}

impl CompilerKind {
    /// Compiler family the host builds with by default.
    pub fn host_default() -> Self {
        if cfg!(target_env = "msvc") {
            CompilerKind::Msvc
        } else if cfg!(windows) {
            CompilerKind::Mingw32
        } else {
            CompilerKind::Unix
        }
    }

    /// Get the compiler family name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerKind::Unix => "unix",
            CompilerKind::Msvc => "msvc",
            CompilerKind::Mingw32 => "mingw32",
        }
    }
}

impl FromStr for CompilerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unix" | "gcc" | "clang" => Ok(CompilerKind::Unix),
            "msvc" => Ok(CompilerKind::Msvc),
            "mingw32" | "mingw" => Ok(CompilerKind::Mingw32),
            _ => Err(format!(
                "invalid compiler '{}'; expected 'unix', 'msvc', or 'mingw32'",
                s
            )),
        }
    }
}

/// Platform-specific build parameters, derived once per build invocation.
///
/// `architectures` keeps detection order and holds no duplicates. An empty
/// list means detection failed and the tools' default architecture applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformVariant {
    pub architectures: Vec<String>,
    pub min_os_version: Option<String>,
}

impl PlatformVariant {
    /// Whether any architecture was detected.
    pub fn has_architectures(&self) -> bool {
        !self.architectures.is_empty()
    }
}
