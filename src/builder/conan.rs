//! conan command construction.
//!
//! Produces the `conan install` invocation that builds native dependencies
//! into the extension's build directory.

use std::path::{Path, PathBuf};

use crate::builder::platform::conan_arch;
use crate::core::PlatformVariant;
use crate::util::errors::ExtforgeError;
use crate::util::process::{ProcessBuilder, ToolSource};

/// Inputs shared by every platform's `conan install` command.
#[derive(Debug, Clone)]
pub struct ConanInvocation {
    program: ToolSource,
    conanfile: Option<PathBuf>,
}

impl ConanInvocation {
    pub fn new(program: ToolSource) -> Self {
        ConanInvocation {
            program,
            conanfile: None,
        }
    }

    /// Recipe to install from. Without one conan uses the current directory.
    pub fn conanfile(mut self, conanfile: Option<PathBuf>) -> Self {
        self.conanfile = conanfile;
        self
    }

    /// Arguments common to every platform:
    /// `install <recipe> --build=missing -of <build_dir>`.
    pub fn base_args(&self, build_dir: &Path) -> Vec<String> {
        let recipe = self
            .conanfile
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ".".to_string());

        vec![
            "install".to_string(),
            recipe,
            "--build=missing".to_string(),
            "-of".to_string(),
            build_dir.display().to_string(),
        ]
    }

    /// The default `conan install` command.
    pub fn command(&self, build_dir: &Path) -> Result<ProcessBuilder, ExtforgeError> {
        let conan = self.program.locate("conan")?;
        Ok(ProcessBuilder::new(conan).args(self.base_args(build_dir)))
    }
}

/// macOS settings appended to `conan install`.
///
/// The architecture setting is sorted so the command string does not depend
/// on detection order. Without detected architectures it is omitted and
/// conan picks its default; the resolver has already reported why.
pub fn macos_settings(variant: &PlatformVariant) -> Vec<String> {
    let mut settings = Vec::new();

    if let Some(version) = &variant.min_os_version {
        settings.push(format!("-s=os.version={}", version));
    }

    if variant.has_architectures() {
        let mut arches: Vec<&str> = variant
            .architectures
            .iter()
            .map(|a| conan_arch(a))
            .collect();
        arches.sort_unstable();
        arches.dedup();
        settings.push(format!("-s=arch={}", arches.join("|")));
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(arches: &[&str]) -> PlatformVariant {
        PlatformVariant {
            architectures: arches.iter().map(|a| a.to_string()).collect(),
            min_os_version: Some("11.0".to_string()),
        }
    }

    #[test]
    fn test_base_args() {
        let conan = ConanInvocation::new(ToolSource::Fixed("conan".into()))
            .conanfile(Some(PathBuf::from("conanfile.py")));

        assert_eq!(
            conan.base_args(Path::new("build/ext_build")),
            vec!["install", "conanfile.py", "--build=missing", "-of", "build/ext_build"]
        );
    }

    #[test]
    fn test_default_recipe_is_cwd() {
        let conan = ConanInvocation::new(ToolSource::Fixed("conan".into()));
        assert_eq!(conan.base_args(Path::new("b"))[1], ".");
    }

    #[test]
    fn test_macos_arch_setting_sorted_and_mapped() {
        assert_eq!(
            macos_settings(&variant(&["x86_64", "arm64"])),
            vec!["-s=os.version=11.0", "-s=arch=armv8|x86_64"]
        );
        assert_eq!(
            macos_settings(&variant(&["arm64", "x86_64"])),
            vec!["-s=os.version=11.0", "-s=arch=armv8|x86_64"]
        );
    }

    #[test]
    fn test_macos_without_arch_omits_setting() {
        assert_eq!(macos_settings(&variant(&[])), vec!["-s=os.version=11.0"]);
    }

    #[test]
    fn test_command_locates_program() {
        let conan = ConanInvocation::new(ToolSource::Fixed("/opt/bin/conan".into()));
        let cmd = conan.command(Path::new("b")).unwrap();

        assert_eq!(cmd.get_program(), Path::new("/opt/bin/conan"));
        assert_eq!(cmd.get_args()[0], "install");
    }
}
