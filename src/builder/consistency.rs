//! Interpreter consistency check against the generated CMake cache.
//!
//! CMake may find a different Python than the one running the build (a
//! system interpreter ahead of a virtualenv on PATH, say). The extension
//! would then link against the wrong headers and fail at import time, so the
//! cache is checked right after configure.

use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::util::errors::{ExtforgeError, Inconsistency};
use crate::util::fs::read_to_string;

/// File name of the generated cache.
pub const CMAKE_CACHE_FILE: &str = "CMakeCache.txt";

/// Cache key holding the interpreter CMake resolved.
pub const PYTHON_EXECUTABLE_KEY: &str = "Python_EXECUTABLE";

/// One `KEY:TYPE=VALUE` or `KEY=VALUE` entry from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMakeCacheFact {
    pub key: String,
    pub value_type: Option<String>,
    pub value: String,
}

/// Find the first `CMakeCache.txt` under `build_dir`.
///
/// Directory entries are visited in name order so the choice is stable.
pub fn locate_cmake_cache(build_dir: &Path) -> Result<PathBuf, ExtforgeError> {
    WalkDir::new(build_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_file() && e.file_name() == CMAKE_CACHE_FILE)
        .map(|e| e.into_path())
        .ok_or_else(|| {
            ExtforgeError::artifact_not_found(
                format!("{} (searched recursively)", CMAKE_CACHE_FILE),
                vec![build_dir.to_path_buf()],
            )
        })
}

/// Parse a single cache line. Comments and blank lines yield `None`.
pub fn parse_cache_line(line: &str) -> Option<CMakeCacheFact> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return None;
    }

    let (lhs, value) = line.split_once('=')?;
    let (key, value_type) = match lhs.split_once(':') {
        Some((key, ty)) => (key, Some(ty.to_string())),
        None => (lhs, None),
    };

    Some(CMakeCacheFact {
        key: key.trim().to_string(),
        value_type,
        value: value.to_string(),
    })
}

/// Parse every entry in a cache file's text.
pub fn parse_cache(text: &str) -> Vec<CMakeCacheFact> {
    text.lines().filter_map(parse_cache_line).collect()
}

/// Compare every `Python_EXECUTABLE` entry with the expected interpreter.
///
/// The parent directories are compared, not the files, so `python3` and
/// `python3.12` in the same environment are accepted. All mismatches are
/// returned so the caller can report them together.
pub fn verify(facts: &[CMakeCacheFact], expected: &Path) -> Vec<Inconsistency> {
    let expected_dir = expected.parent();
    facts
        .iter()
        .filter(|f| f.key == PYTHON_EXECUTABLE_KEY)
        .filter(|f| Path::new(&f.value).parent() != expected_dir)
        .map(|f| Inconsistency {
            key: f.key.clone(),
            found: PathBuf::from(&f.value),
            expected: expected.to_path_buf(),
        })
        .collect()
}

/// Checks the generated cache under a build directory.
#[derive(Debug, Clone)]
pub struct ConsistencyGate {
    expected_interpreter: PathBuf,
}

impl ConsistencyGate {
    pub fn new(expected_interpreter: impl Into<PathBuf>) -> Self {
        ConsistencyGate {
            expected_interpreter: expected_interpreter.into(),
        }
    }

    /// Locate and read the cache, returning every inconsistency.
    pub fn inspect(&self, build_dir: &Path) -> Result<Vec<Inconsistency>> {
        let cache = locate_cmake_cache(build_dir)?;
        tracing::debug!("Checking {}", cache.display());
        let facts = parse_cache(&read_to_string(&cache)?);
        Ok(verify(&facts, &self.expected_interpreter))
    }

    /// Fail with a single `ConsistencyViolation` listing every mismatch.
    pub fn check(&self, build_dir: &Path) -> Result<()> {
        let found = self.inspect(build_dir)?;
        if found.is_empty() {
            Ok(())
        } else {
            Err(ExtforgeError::ConsistencyViolation(found).into())
        }
    }
}
