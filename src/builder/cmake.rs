//! CMake command construction for the extension project.

use std::path::Path;

use anyhow::Result;

use crate::core::{InterpreterInfo, PlatformVariant};
use crate::util::fs::absolute;
use crate::util::process::{ProcessBuilder, ToolSource};
use crate::util::report::Reporter;

const NO_PRESET_WARNING: &str =
    "No CMake preset specified. This may lead to unexpected build results.";

/// Inputs shared by every platform's CMake commands.
#[derive(Debug, Clone)]
pub struct CMakeInvocation {
    program: ToolSource,
    interpreter: InterpreterInfo,
    config_preset: Option<String>,
    build_preset: Option<String>,
    extra_args: Vec<String>,
}

impl CMakeInvocation {
    pub fn new(program: ToolSource, interpreter: InterpreterInfo) -> Self {
        CMakeInvocation {
            program,
            interpreter,
            config_preset: None,
            build_preset: None,
            extra_args: Vec::new(),
        }
    }

    /// Configure preset passed as `--preset=`.
    pub fn config_preset(mut self, preset: Option<String>) -> Self {
        self.config_preset = preset;
        self
    }

    /// Build preset passed as `--preset=`.
    pub fn build_preset(mut self, preset: Option<String>) -> Self {
        self.build_preset = preset;
        self
    }

    /// Project-specific configure arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Platform-independent configure command.
    ///
    /// The interpreter variables pin CMake to the exact Python driving the
    /// build; the consistency gate checks the result afterwards. Without a
    /// configure preset the project is configured into `build_dir` and a
    /// warning goes to `reporter`.
    pub fn configure_command(
        &self,
        build_dir: &Path,
        output_dir: &Path,
        reporter: &dyn Reporter,
    ) -> Result<ProcessBuilder> {
        let cmake = self.program.locate("cmake")?;
        let mut cmd = ProcessBuilder::new(cmake);

        match &self.config_preset {
            Some(preset) => cmd = cmd.arg(format!("--preset={}", preset)),
            None => {
                reporter.warn(NO_PRESET_WARNING);
                cmd = cmd.arg("-B").arg(build_dir);
            }
        }

        let info = &self.interpreter;
        let python_root = info.prefix()?;
        let nanobind_dir = info.nanobind_dir()?;
        let install_prefix = absolute(output_dir)?;

        cmd = cmd
            .args(&self.extra_args)
            .arg(format!("-DPython_ROOT_DIR:PATH={}", python_root.display()))
            .arg(format!("-DPython_EXECUTABLE:FILEPATH={}", info.executable.display()))
            .arg(format!("-DPython_INCLUDE_DIR:FILEPATH={}", info.include_dir.display()))
            .arg("-DPython_ARTIFACTS_INTERACTIVE=true")
            .arg("-DCMAKE_POSITION_INDEPENDENT_CODE=true")
            .arg(format!("-Dnanobind_DIR:PATH={}", nanobind_dir.display()))
            .arg("-DPython_FIND_STRATEGY=LOCATION")
            .arg(format!("-DCMAKE_INSTALL_PREFIX:PATH={}", install_prefix.display()));

        Ok(cmd)
    }

    /// Build command. Always runs the `install` target so the project
    /// installs into the configured prefix.
    pub fn build_command(&self, build_dir: &Path, reporter: &dyn Reporter) -> Result<ProcessBuilder> {
        let cmake = self.program.locate("cmake")?;
        let mut cmd = ProcessBuilder::new(cmake).arg("--build");

        match &self.build_preset {
            Some(preset) => cmd = cmd.arg(format!("--preset={}", preset)),
            None => {
                reporter.warn(NO_PRESET_WARNING);
                cmd = cmd.arg(build_dir);
            }
        }

        Ok(cmd.args(["--target", "install"]))
    }
}

/// macOS settings appended to the configure command.
///
/// CMake takes multiple architectures separated by `;`, in detection order.
/// Without detected architectures CMake's default is used.
pub fn macos_configure_args(variant: &PlatformVariant) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(version) = &variant.min_os_version {
        args.push(format!("-DCMAKE_OSX_DEPLOYMENT_TARGET={}", version));
    }

    if variant.has_architectures() {
        args.push(format!(
            "-DCMAKE_OSX_ARCHITECTURES={}",
            variant.architectures.join(";")
        ));
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{interpreter, RecordingReporter};
    use crate::util::errors::ExtforgeError;
    use crate::util::report::TracingReporter;

    fn invocation() -> CMakeInvocation {
        CMakeInvocation::new(ToolSource::Fixed("cmake".into()), interpreter())
    }

    #[test]
    fn test_configure_with_preset() {
        let cmd = invocation()
            .config_preset(Some("python-3.12-config".to_string()))
            .args(["-Dmy_ext_build_python_extension=ON"])
            .configure_command(Path::new("build/x"), Path::new("/out"), &TracingReporter)
            .unwrap();
        let args = cmd.get_args();

        assert_eq!(args[0], "--preset=python-3.12-config");
        assert_eq!(args[1], "-Dmy_ext_build_python_extension=ON");
        assert!(args.contains(&"-DPython_EXECUTABLE:FILEPATH=/usr/bin/python3".to_string()));
        assert!(args.contains(&"-DPython_ROOT_DIR:PATH=/usr".to_string()));
        assert!(args.contains(&"-DPython_INCLUDE_DIR:FILEPATH=/usr/include/python3.12".to_string()));
        assert!(args.contains(&"-DCMAKE_POSITION_INDEPENDENT_CODE=true".to_string()));
        assert!(args.contains(&"-DPython_ARTIFACTS_INTERACTIVE=true".to_string()));
        assert!(args.contains(&"-Dnanobind_DIR:PATH=/usr/lib/nanobind/cmake".to_string()));
        assert!(args.contains(&"-DPython_FIND_STRATEGY=LOCATION".to_string()));
        assert_eq!(args.last().unwrap(), "-DCMAKE_INSTALL_PREFIX:PATH=/out");
        assert!(!args.contains(&"-B".to_string()));
    }

    #[test]
    fn test_configure_without_preset_uses_build_dir() {
        let reporter = RecordingReporter::default();
        let cmd = invocation()
            .configure_command(Path::new("/b/x"), Path::new("/out"), &reporter)
            .unwrap();

        assert_eq!(&cmd.get_args()[..2], &["-B".to_string(), "/b/x".to_string()]);
        assert_eq!(reporter.warnings(), vec![NO_PRESET_WARNING]);
    }

    #[test]
    fn test_install_prefix_is_absolute() {
        let cmd = invocation()
            .config_preset(Some("p".to_string()))
            .configure_command(Path::new("b"), Path::new("build/lib"), &TracingReporter)
            .unwrap();
        let prefix = cmd
            .get_args()
            .iter()
            .find_map(|a| a.strip_prefix("-DCMAKE_INSTALL_PREFIX:PATH="))
            .unwrap();

        assert!(Path::new(prefix).is_absolute());
        assert!(prefix.ends_with("lib"));
    }

    #[test]
    fn test_missing_nanobind_is_tool_not_found() {
        let mut info = interpreter();
        info.nanobind_cmake_dir = None;
        let err = CMakeInvocation::new(ToolSource::Fixed("cmake".into()), info)
            .configure_command(Path::new("b"), Path::new("/out"), &TracingReporter)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ExtforgeError>(),
            Some(ExtforgeError::ToolNotFound { tool, .. }) if tool == "nanobind"
        ));
    }

    #[test]
    fn test_missing_cmake_is_tool_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = CMakeInvocation::new(
            ToolSource::Search {
                dir: Some(tmp.path().to_path_buf()),
            },
            interpreter(),
        )
        .build_command(Path::new("b"), &TracingReporter)
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ExtforgeError>(),
            Some(ExtforgeError::ToolNotFound { tool, .. }) if tool == "cmake"
        ));
    }

    #[test]
    fn test_build_command_targets_install() {
        let reporter = RecordingReporter::default();
        let cmd = invocation()
            .build_preset(Some("python-3.12-build".to_string()))
            .build_command(Path::new("b"), &reporter)
            .unwrap();

        assert_eq!(
            cmd.display_command(),
            "cmake --build --preset=python-3.12-build --target install"
        );
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_build_command_without_preset() {
        let reporter = RecordingReporter::default();
        let cmd = invocation().build_command(Path::new("b"), &reporter).unwrap();

        assert_eq!(cmd.display_command(), "cmake --build b --target install");
        assert_eq!(reporter.warnings(), vec![NO_PRESET_WARNING]);
    }

    #[test]
    fn test_macos_configure_args() {
        let variant = PlatformVariant {
            architectures: vec!["arm64".to_string(), "x86_64".to_string()],
            min_os_version: Some("10.13".to_string()),
        };

        assert_eq!(
            macos_configure_args(&variant),
            vec![
                "-DCMAKE_OSX_DEPLOYMENT_TARGET=10.13",
                "-DCMAKE_OSX_ARCHITECTURES=arm64;x86_64"
            ]
        );
    }

    #[test]
    fn test_macos_configure_args_without_arch() {
        let variant = PlatformVariant {
            architectures: vec![],
            min_os_version: Some("11.0".to_string()),
        };

        assert_eq!(
            macos_configure_args(&variant),
            vec!["-DCMAKE_OSX_DEPLOYMENT_TARGET=11.0"]
        );
    }
}
