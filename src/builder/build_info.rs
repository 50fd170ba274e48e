//! Dependency build-info merging.
//!
//! conan can emit a `conanbuildinfo.json` describing the libraries, search
//! paths and macros of every resolved dependency. This module finds that
//! file, reads the requested scope out of it and folds it into a
//! [`LinkDescriptor`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::descriptor::{parse_definition, LinkDescriptor};
use crate::core::CompilerKind;
use crate::util::errors::ExtforgeError;
use crate::util::fs::read_to_string;

/// File name of the build-info artifact.
pub const BUILD_INFO_FILE: &str = "conanbuildinfo.json";

/// System libraries MSVC builds need for the Windows version APIs used by
/// the bound library.
pub const MSVC_SYSTEM_LIBS: [&str; 2] = ["shlwapi", "version"];

/// Outcome of probing the candidate locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// First candidate that exists
    pub found: Option<PathBuf>,
    /// Every candidate, in probe order
    pub searched: Vec<PathBuf>,
}

impl Probe {
    /// Turn a miss into `ArtifactNotFound`.
    pub fn into_result(self) -> Result<PathBuf, ExtforgeError> {
        match self.found {
            Some(path) => Ok(path),
            None => Err(ExtforgeError::artifact_not_found(BUILD_INFO_FILE, self.searched)),
        }
    }
}

/// Finds the build-info artifact under a build root.
#[derive(Debug, Clone)]
pub struct BuildInfoLocator {
    root: PathBuf,
}

impl BuildInfoLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BuildInfoLocator { root: root.into() }
    }

    /// Candidate paths, in probe order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        [
            self.root.clone(),
            self.root.join("generators"),
            self.root.join("build").join("Release").join("generators"),
            self.root.join("build").join("generators"),
        ]
        .into_iter()
        .map(|dir| dir.join(BUILD_INFO_FILE))
        .collect()
    }

    /// Probe every candidate without failing.
    pub fn probe(&self) -> Probe {
        let searched = self.candidates();
        let found = searched.iter().find(|p| p.is_file()).cloned();
        Probe { found, searched }
    }

    /// Locate the artifact or fail listing every path tried.
    pub fn locate(&self) -> Result<PathBuf, ExtforgeError> {
        self.probe().into_result()
    }
}

/// Libraries, search paths and definitions for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DependencyBuildInfo {
    pub libs: Vec<String>,
    #[serde(alias = "lib_paths", alias = "libdirs")]
    pub lib_dirs: Vec<PathBuf>,
    #[serde(alias = "include_paths", alias = "includedirs")]
    pub include_dirs: Vec<PathBuf>,
    #[serde(alias = "defines")]
    pub definitions: Vec<String>,
}

impl DependencyBuildInfo {
    fn is_empty(&self) -> bool {
        self.libs.is_empty()
            && self.lib_dirs.is_empty()
            && self.include_dirs.is_empty()
            && self.definitions.is_empty()
    }

    fn extend(&mut self, other: &DependencyBuildInfo) {
        self.libs.extend(other.libs.iter().cloned());
        self.lib_dirs.extend(other.lib_dirs.iter().cloned());
        self.include_dirs.extend(other.include_dirs.iter().cloned());
        self.definitions.extend(other.definitions.iter().cloned());
    }
}

#[derive(Debug, Deserialize)]
struct NamedDependency {
    name: String,
    #[serde(flatten)]
    info: DependencyBuildInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildInfoDocument {
    #[serde(flatten)]
    aggregate: DependencyBuildInfo,
    dependencies: Vec<NamedDependency>,
}

/// Parse build info for `dependency`, or the aggregate scope when `None`.
///
/// The aggregate scope is the document's top-level fields; when those are
/// absent it is every dependency concatenated in document order.
pub fn parse_build_info(
    contents: &str,
    dependency: Option<&str>,
    path: &Path,
) -> Result<DependencyBuildInfo> {
    let doc: BuildInfoDocument = serde_json::from_str(contents)
        .with_context(|| format!("failed to parse build info: {}", path.display()))?;

    match dependency {
        Some(name) => doc
            .dependencies
            .into_iter()
            .find(|d| d.name == name)
            .map(|d| d.info)
            .ok_or_else(|| {
                ExtforgeError::UnknownDependency {
                    name: name.to_string(),
                    path: path.to_path_buf(),
                }
                .into()
            }),
        None if !doc.aggregate.is_empty() => Ok(doc.aggregate),
        None => {
            let mut all = DependencyBuildInfo::default();
            for dep in &doc.dependencies {
                all.extend(&dep.info);
            }
            Ok(all)
        }
    }
}

/// Merges dependency build info into link descriptors.
#[derive(Debug, Clone, Copy)]
pub struct BuildMetadataMerger {
    compiler: CompilerKind,
}

impl BuildMetadataMerger {
    pub fn new(compiler: CompilerKind) -> Self {
        BuildMetadataMerger { compiler }
    }

    /// Locate, parse and merge the build info under `build_root`.
    pub fn merge_from<'d>(
        &self,
        descriptor: &'d mut LinkDescriptor,
        build_root: &Path,
        dependency: Option<&str>,
    ) -> Result<&'d mut LinkDescriptor> {
        let path = BuildInfoLocator::new(build_root).locate()?;
        self.merge_file(descriptor, &path, dependency)
    }

    /// Parse and merge a specific build-info file.
    pub fn merge_file<'d>(
        &self,
        descriptor: &'d mut LinkDescriptor,
        path: &Path,
        dependency: Option<&str>,
    ) -> Result<&'d mut LinkDescriptor> {
        tracing::debug!("Reading build info from {}", path.display());
        let info = parse_build_info(&read_to_string(path)?, dependency, path)?;
        Ok(self.merge(descriptor, &info))
    }

    /// Merge parsed build info into `descriptor`.
    ///
    /// Libraries, include dirs and macros are appended; library dirs go in
    /// front so dependency paths are searched before system ones. Duplicates
    /// are skipped everywhere. Compiler fixups run last.
    pub fn merge<'d>(
        &self,
        descriptor: &'d mut LinkDescriptor,
        info: &DependencyBuildInfo,
    ) -> &'d mut LinkDescriptor {
        descriptor.append_libraries(info.libs.iter().cloned());
        descriptor.prepend_library_dirs(info.lib_dirs.iter().cloned());
        descriptor.append_include_dirs(info.include_dirs.iter().cloned());
        descriptor.append_macros(info.definitions.iter().map(|d| parse_definition(d)));

        self.apply_fixups(descriptor);

        descriptor.dedup();
        descriptor
    }

    fn apply_fixups(&self, descriptor: &mut LinkDescriptor) {
        if self.compiler == CompilerKind::Msvc {
            descriptor.libraries.extend(MSVC_SYSTEM_LIBS.iter().map(|s| s.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::fs::write_string;
    use tempfile::TempDir;

    fn info(libs: &[&str], lib_dirs: &[&str]) -> DependencyBuildInfo {
        DependencyBuildInfo {
            libs: libs.iter().map(|s| s.to_string()).collect(),
            lib_dirs: lib_dirs.iter().map(PathBuf::from).collect(),
            ..DependencyBuildInfo::default()
        }
    }

    #[test]
    fn test_merge_preserves_order_and_uniqueness() {
        let mut desc = LinkDescriptor::new();
        desc.append_libraries(["z", "a"]);

        BuildMetadataMerger::new(CompilerKind::Unix).merge(&mut desc, &info(&["a", "b", "a"], &[]));

        assert_eq!(desc.libraries, vec!["z", "a", "b"]);
    }

    #[test]
    fn test_library_dirs_prepended() {
        let mut desc = LinkDescriptor::new();
        desc.append_library_dirs(["/usr/lib"]);

        BuildMetadataMerger::new(CompilerKind::Unix).merge(&mut desc, &info(&[], &["/dep/lib"]));

        assert_eq!(
            desc.library_dirs,
            vec![PathBuf::from("/dep/lib"), PathBuf::from("/usr/lib")]
        );
    }

    #[test]
    fn test_macros_and_includes_appended() {
        let mut desc = LinkDescriptor::new();
        desc.append_include_dirs(["/src/include"]);
        let build_info = DependencyBuildInfo {
            include_dirs: vec![PathBuf::from("/dep/include"), PathBuf::from("/src/include")],
            definitions: vec!["LIBXML_STATIC".to_string(), "ZEN_LEVEL=3".to_string()],
            ..DependencyBuildInfo::default()
        };

        BuildMetadataMerger::new(CompilerKind::Unix).merge(&mut desc, &build_info);

        assert_eq!(
            desc.include_dirs,
            vec![PathBuf::from("/src/include"), PathBuf::from("/dep/include")]
        );
        assert_eq!(
            desc.macros,
            vec![
                ("LIBXML_STATIC".to_string(), None),
                ("ZEN_LEVEL".to_string(), Some("3".to_string())),
            ]
        );
    }

    #[test]
    fn test_msvc_fixup_appends_system_libs_once() {
        let mut desc = LinkDescriptor::new();
        desc.append_libraries(["shlwapi", "mediaconch"]);

        BuildMetadataMerger::new(CompilerKind::Msvc).merge(&mut desc, &info(&["zen"], &[]));

        assert_eq!(desc.libraries, vec!["shlwapi", "mediaconch", "zen", "version"]);
    }

    #[test]
    fn test_unix_has_no_fixups() {
        let mut desc = LinkDescriptor::new();
        BuildMetadataMerger::new(CompilerKind::Unix).merge(&mut desc, &info(&["zen"], &[]));
        assert_eq!(desc.libraries, vec!["zen"]);
    }

    #[test]
    fn test_parse_named_and_aggregate_scopes() {
        let contents = r#"{
            "dependencies": [
                {"name": "zlib", "libs": ["z"], "lib_paths": ["/c/zlib/lib"], "defines": []},
                {"name": "libxml2", "libs": ["xml2"], "libdirs": ["/c/xml/lib"],
                 "include_paths": ["/c/xml/include"], "defines": ["LIBXML_STATIC"]}
            ]
        }"#;
        let path = Path::new("conanbuildinfo.json");

        let xml = parse_build_info(contents, Some("libxml2"), path).unwrap();
        assert_eq!(xml.libs, vec!["xml2"]);
        assert_eq!(xml.lib_dirs, vec![PathBuf::from("/c/xml/lib")]);
        assert_eq!(xml.include_dirs, vec![PathBuf::from("/c/xml/include")]);
        assert_eq!(xml.definitions, vec!["LIBXML_STATIC"]);

        let all = parse_build_info(contents, None, path).unwrap();
        assert_eq!(all.libs, vec!["z", "xml2"]);
        assert_eq!(
            all.lib_dirs,
            vec![PathBuf::from("/c/zlib/lib"), PathBuf::from("/c/xml/lib")]
        );
    }

    #[test]
    fn test_top_level_fields_are_the_aggregate() {
        let contents = r#"{"libs": ["all"], "lib_dirs": ["/agg"], "definitions": ["X=1"],
                           "dependencies": [{"name": "zlib", "libs": ["z"]}]}"#;

        let agg = parse_build_info(contents, None, Path::new("x.json")).unwrap();

        assert_eq!(agg.libs, vec!["all"]);
        assert_eq!(agg.definitions, vec!["X=1"]);
    }

    #[test]
    fn test_unknown_dependency() {
        let err = parse_build_info(r#"{"dependencies": []}"#, Some("openssl"), Path::new("x.json"))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ExtforgeError>(),
            Some(ExtforgeError::UnknownDependency { name, .. }) if name == "openssl"
        ));
    }

    #[test]
    fn test_locate_lists_every_candidate() {
        let tmp = TempDir::new().unwrap();

        match BuildInfoLocator::new(tmp.path()).locate() {
            Err(ExtforgeError::ArtifactNotFound { searched, .. }) => {
                assert_eq!(searched.len(), 4);
                assert_eq!(searched[0], tmp.path().join(BUILD_INFO_FILE));
                assert_eq!(
                    searched[2],
                    tmp.path().join("build/Release/generators").join(BUILD_INFO_FILE)
                );
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_probe_prefers_earlier_candidate() {
        let tmp = TempDir::new().unwrap();
        let generators = tmp.path().join("generators").join(BUILD_INFO_FILE);
        let release = tmp
            .path()
            .join("build/Release/generators")
            .join(BUILD_INFO_FILE);
        write_string(&release, "{}").unwrap();
        write_string(&generators, "{}").unwrap();

        let probe = BuildInfoLocator::new(tmp.path()).probe();

        assert_eq!(probe.found, Some(generators));
        assert_eq!(probe.searched.len(), 4);
    }

    #[test]
    fn test_merge_from_build_root() {
        let tmp = TempDir::new().unwrap();
        write_string(
            &tmp.path().join("generators").join(BUILD_INFO_FILE),
            r#"{"libs": ["mediainfo", "zen"], "lib_dirs": ["/c/lib"]}"#,
        )
        .unwrap();
        let mut desc = LinkDescriptor::new();
        desc.append_libraries(["mediaconch"]);

        BuildMetadataMerger::new(CompilerKind::Unix)
            .merge_from(&mut desc, tmp.path(), None)
            .unwrap();

        assert_eq!(desc.libraries, vec!["mediaconch", "mediainfo", "zen"]);
        assert_eq!(desc.library_dirs, vec![PathBuf::from("/c/lib")]);
    }
}
