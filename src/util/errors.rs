//! Orchestration error types.
//!
//! Every failure the orchestrator can raise lives here. Glue code wraps these
//! in `anyhow::Error` with extra context; tests match on the variants via
//! `downcast_ref`.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::util::context::MANIFEST_NAME;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// A mismatch between what the native build tool resolved and what is
/// driving the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inconsistency {
    /// Cache key the value came from (e.g. `Python_EXECUTABLE`)
    pub key: String,
    /// Value found in the generated cache
    pub found: PathBuf,
    /// Value the orchestrator expected
    pub expected: PathBuf,
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CMake found {} `{}` which does not match the interpreter running the build `{}`",
            self.key,
            self.found.display(),
            self.expected.display()
        )
    }
}

/// Errors raised while orchestrating an extension build.
#[derive(Debug, Error)]
pub enum ExtforgeError {
    #[error("`{tool}` executable not found")]
    ToolNotFound {
        tool: String,
        searched: Option<PathBuf>,
    },

    #[error("{what} not found (searched: {})", display_paths(.searched))]
    ArtifactNotFound { what: String, searched: Vec<PathBuf> },

    #[error("{} in {} (exactly one supported)", display_preset_count(.kind, .count), .path.display())]
    AmbiguousConfiguration {
        kind: String,
        count: usize,
        path: PathBuf,
    },

    #[error("no valid architecture found in CONFIGURE_CFLAGS `{cflags}`")]
    NoArchitectureDetected { cflags: String },

    #[error("{}", display_inconsistencies(.0))]
    ConsistencyViolation(Vec<Inconsistency>),

    #[error("`{command}` failed with exit code {}", display_code(.code))]
    ExternalCommandFailure { command: String, code: Option<i32> },

    #[error("dependency `{name}` not present in {}", .path.display())]
    UnknownDependency { name: String, path: PathBuf },
}

impl ExtforgeError {
    /// Shorthand for a missing executable.
    pub fn tool_not_found(tool: impl Into<String>, searched: Option<PathBuf>) -> Self {
        ExtforgeError::ToolNotFound {
            tool: tool.into(),
            searched,
        }
    }

    /// Shorthand for a missing generated file.
    pub fn artifact_not_found(what: impl Into<String>, searched: Vec<PathBuf>) -> Self {
        ExtforgeError::ArtifactNotFound {
            what: what.into(),
            searched,
        }
    }

    /// Convert to a user-facing diagnostic with hints.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            ExtforgeError::ToolNotFound { tool, searched } => {
                let diag = match searched {
                    Some(dir) => diag.with_context(format!("searched in {}", dir.display())),
                    None => diag.with_context("searched PATH"),
                };
                diag.with_suggestion(format!(
                    "Install `{}` or point the `[build]` config at it",
                    tool
                ))
            }
            ExtforgeError::ArtifactNotFound { what, searched } => {
                let diag = searched
                    .iter()
                    .fold(diag, |d, p| d.with_context(format!("tried {}", p.display())));
                if what == MANIFEST_NAME {
                    diag.with_suggestion(suggestions::NO_MANIFEST)
                } else {
                    diag
                }
            }
            ExtforgeError::AmbiguousConfiguration { path, count, .. } => {
                let diag = diag.with_location(path);
                if *count == 0 {
                    diag.with_suggestion("Regenerate the build directory with `conan install`")
                } else {
                    diag.with_suggestion("Remove the extra presets or regenerate the build directory")
                }
            }
            ExtforgeError::ConsistencyViolation(found) => diag
                .with_context(format!("{} mismatch(es)", found.len()))
                .with_suggestion("Delete the build directory and rebuild with the same interpreter"),
            ExtforgeError::ExternalCommandFailure { .. } => {
                diag.with_suggestion(suggestions::BUILD_FAILED)
            }
            ExtforgeError::NoArchitectureDetected { .. }
            | ExtforgeError::UnknownDependency { .. } => diag,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_preset_count(kind: &str, count: &usize) -> String {
    match *count {
        0 => format!("no {}", kind),
        n => format!("too many {} ({} found)", kind, n),
    }
}

fn display_inconsistencies(found: &[Inconsistency]) -> String {
    found
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_count_message() {
        let empty = ExtforgeError::AmbiguousConfiguration {
            kind: "buildPresets".into(),
            count: 0,
            path: PathBuf::from("CMakePresets.json"),
        };
        assert_eq!(
            empty.to_string(),
            "no buildPresets in CMakePresets.json (exactly one supported)"
        );

        let crowded = ExtforgeError::AmbiguousConfiguration {
            kind: "buildPresets".into(),
            count: 3,
            path: PathBuf::from("CMakePresets.json"),
        };
        assert!(crowded.to_string().starts_with("too many buildPresets (3 found)"));
    }

    #[test]
    fn test_artifact_not_found_lists_every_path() {
        let err = ExtforgeError::artifact_not_found(
            "conanbuildinfo.json",
            vec![PathBuf::from("/b/one"), PathBuf::from("/b/two")],
        );
        let msg = err.to_string();
        assert!(msg.contains("/b/one"));
        assert!(msg.contains("/b/two"));
    }

    #[test]
    fn test_consistency_violation_lists_all_mismatches() {
        let err = ExtforgeError::ConsistencyViolation(vec![
            Inconsistency {
                key: "Python_EXECUTABLE".into(),
                found: PathBuf::from("/opt/a/python3"),
                expected: PathBuf::from("/usr/bin/python3"),
            },
            Inconsistency {
                key: "Python_EXECUTABLE".into(),
                found: PathBuf::from("/opt/b/python3"),
                expected: PathBuf::from("/usr/bin/python3"),
            },
        ]);
        let msg = err.to_string();
        assert_eq!(msg.lines().count(), 2);
        assert!(msg.contains("/opt/a/python3"));
        assert!(msg.contains("/opt/b/python3"));
    }

    #[test]
    fn test_missing_manifest_suggests_creating_one() {
        let diag = ExtforgeError::artifact_not_found(MANIFEST_NAME, vec![PathBuf::from("/p/Extforge.toml")])
            .to_diagnostic();
        assert_eq!(diag.suggestions, vec![suggestions::NO_MANIFEST.to_string()]);
        assert_eq!(diag.context, vec!["tried /p/Extforge.toml".to_string()]);
    }
}
