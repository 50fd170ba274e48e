//! CMake preset reconciliation.
//!
//! conan writes a `CMakeUserPresets.json` next to the recipe that includes a
//! generated `CMakePresets.json` from the build directory. Building the same
//! project for several interpreters one after another would reuse the same
//! generated preset names, so the nested document's presets are renamed per
//! interpreter before CMake sees them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::util::errors::ExtforgeError;
use crate::util::fs::{read_to_string, resolve_against, write_string};

/// Top-level preset document written by conan.
pub const USER_PRESETS_FILE: &str = "CMakeUserPresets.json";

const CONFIGURE_PRESETS: &str = "configurePresets";
const BUILD_PRESETS: &str = "buildPresets";
const TEST_PRESETS: &str = "testPresets";

/// Target names for the configure, build and test presets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetNames {
    pub configure: String,
    pub build: String,
    pub test: String,
}

impl PresetNames {
    /// Names unique to one interpreter version, e.g. `python-3.12-config`.
    pub fn for_python(version: (u32, u32)) -> Self {
        let stem = format!("python-{}.{}", version.0, version.1);
        PresetNames {
            configure: format!("{}-config", stem),
            build: format!("{}-build", stem),
            test: format!("{}-test", stem),
        }
    }
}

/// Result of a reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The nested document already had the target names; nothing written.
    Unchanged(PathBuf),
    /// The nested document was rewritten.
    Updated(PathBuf),
}

impl ReconcileOutcome {
    /// Path of the nested preset document.
    pub fn path(&self) -> &Path {
        match self {
            ReconcileOutcome::Unchanged(p) | ReconcileOutcome::Updated(p) => p,
        }
    }
}

/// Rewrites generated preset names.
#[derive(Debug, Clone)]
pub struct PresetReconciler {
    top_level: PathBuf,
    build_dir: Option<PathBuf>,
}

impl PresetReconciler {
    /// Reconcile presets reachable from `top_level`.
    pub fn new(top_level: impl Into<PathBuf>) -> Self {
        PresetReconciler {
            top_level: top_level.into(),
            build_dir: None,
        }
    }

    /// Only accept an included document that lives under `build_dir`.
    ///
    /// conan appends one include per output folder, so a project built
    /// into several folders lists several documents.
    pub fn build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(build_dir.into());
        self
    }

    /// Rename the nested document's presets to `names`, writing only if
    /// something changed.
    pub fn reconcile(&self, names: &PresetNames) -> Result<ReconcileOutcome> {
        let nested_path = self.locate_nested()?;
        tracing::debug!("Found preset path {}", nested_path.display());

        let original = read_json(&nested_path)?;
        let mut updated = original.clone();
        rename_presets(&mut updated, names, &nested_path)?;

        if updated == original {
            return Ok(ReconcileOutcome::Unchanged(nested_path));
        }

        tracing::debug!("Updating file {}", nested_path.display());
        write_string(&nested_path, &to_pretty_json(&updated)?)?;
        Ok(ReconcileOutcome::Updated(nested_path))
    }

    /// Find the generated document among the top-level `include` entries.
    pub fn locate_nested(&self) -> Result<PathBuf> {
        if !self.top_level.is_file() {
            return Err(
                ExtforgeError::artifact_not_found(USER_PRESETS_FILE, vec![self.top_level.clone()])
                    .into(),
            );
        }

        let doc = read_json(&self.top_level)?;
        let base = self.top_level.parent().unwrap_or_else(|| Path::new(""));
        let includes: Vec<PathBuf> = doc
            .get("include")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| resolve_against(base, Path::new(s)))
                    .collect()
            })
            .unwrap_or_default();

        let build_dir = self.build_dir.as_deref().map(canonical);
        includes
            .iter()
            .find(|inc| {
                inc.is_file()
                    && build_dir
                        .as_ref()
                        .map_or(true, |dir| canonical(inc).starts_with(dir))
            })
            .cloned()
            .ok_or_else(|| {
                let what = match &self.build_dir {
                    Some(dir) => format!(
                        "preset document included by {} under {}",
                        self.top_level.display(),
                        dir.display()
                    ),
                    None => format!("preset document included by {}", self.top_level.display()),
                };
                ExtforgeError::artifact_not_found(what, includes.clone()).into()
            })
    }
}

/// Rename the sole configure, build and test presets in `doc`.
///
/// Every category must hold exactly one preset. A missing, empty or
/// crowded category is rejected before anything is touched. Build and test
/// presets are pointed back at the renamed configure preset.
pub fn rename_presets(doc: &mut Value, names: &PresetNames, path: &Path) -> Result<(), ExtforgeError> {
    for kind in [CONFIGURE_PRESETS, BUILD_PRESETS, TEST_PRESETS] {
        let count = preset_count(doc, kind);
        if count != 1 {
            return Err(ExtforgeError::AmbiguousConfiguration {
                kind: kind.to_string(),
                count,
                path: path.to_path_buf(),
            });
        }
    }

    if let Some(preset) = sole_preset(doc, CONFIGURE_PRESETS) {
        preset.insert("name".into(), Value::String(names.configure.clone()));
    }
    for (kind, name) in [(BUILD_PRESETS, &names.build), (TEST_PRESETS, &names.test)] {
        if let Some(preset) = sole_preset(doc, kind) {
            preset.insert("name".into(), Value::String(name.clone()));
            preset.insert(
                "configurePreset".into(),
                Value::String(names.configure.clone()),
            );
        }
    }
    Ok(())
}

fn preset_count(doc: &Value, kind: &str) -> usize {
    doc.get(kind).and_then(Value::as_array).map_or(0, Vec::len)
}

fn sole_preset<'a>(
    doc: &'a mut Value,
    kind: &str,
) -> Option<&'a mut serde_json::Map<String, Value>> {
    doc.get_mut(kind)?
        .as_array_mut()?
        .first_mut()?
        .as_object_mut()
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = read_to_string(path)?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

/// Serialize with four-space indentation, as CMake tooling writes it.
fn to_pretty_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(String::from_utf8(buf)?)
}
