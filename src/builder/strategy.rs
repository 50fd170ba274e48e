//! Platform-specific command construction.
//!
//! Each host platform gets one [`CommandBuilderStrategy`]. The strategy is
//! picked once when the [`CommandBuilder`] is created; nothing after that
//! branches on the platform again.

use std::fmt;
use std::path::Path;

use anyhow::Result;

use crate::builder::cmake::{macos_configure_args, CMakeInvocation};
use crate::builder::conan::{macos_settings, ConanInvocation};
use crate::builder::presets::PresetNames;
use crate::core::{HostPlatform, PlatformVariant};
use crate::util::process::ProcessBuilder;
use crate::util::report::Reporter;

/// Builds the install, configure and build commands for one platform.
pub trait CommandBuilderStrategy: fmt::Debug {
    /// Platform this strategy serves.
    fn platform(&self) -> HostPlatform;

    /// `conan install` command.
    fn install_command(&self, conan: &ConanInvocation, build_dir: &Path) -> Result<ProcessBuilder>;

    /// CMake configure command.
    fn configure_command(
        &self,
        cmake: &CMakeInvocation,
        build_dir: &Path,
        output_dir: &Path,
        reporter: &dyn Reporter,
    ) -> Result<ProcessBuilder>;

    /// CMake build command.
    fn build_command(
        &self,
        cmake: &CMakeInvocation,
        build_dir: &Path,
        reporter: &dyn Reporter,
    ) -> Result<ProcessBuilder> {
        cmake.build_command(build_dir, reporter)
    }
}

/// Linux, Windows and other hosts: base commands only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStrategy;

impl CommandBuilderStrategy for DefaultStrategy {
    fn platform(&self) -> HostPlatform {
        HostPlatform::Default
    }

    fn install_command(&self, conan: &ConanInvocation, build_dir: &Path) -> Result<ProcessBuilder> {
        Ok(conan.command(build_dir)?)
    }

    fn configure_command(
        &self,
        cmake: &CMakeInvocation,
        build_dir: &Path,
        output_dir: &Path,
        reporter: &dyn Reporter,
    ) -> Result<ProcessBuilder> {
        cmake.configure_command(build_dir, output_dir, reporter)
    }
}

/// macOS: adds the deployment target and architectures.
#[derive(Debug, Clone)]
pub struct MacOsStrategy {
    variant: PlatformVariant,
}

impl MacOsStrategy {
    pub fn new(variant: PlatformVariant) -> Self {
        MacOsStrategy { variant }
    }
}

impl CommandBuilderStrategy for MacOsStrategy {
    fn platform(&self) -> HostPlatform {
        HostPlatform::MacOs
    }

    fn install_command(&self, conan: &ConanInvocation, build_dir: &Path) -> Result<ProcessBuilder> {
        Ok(conan.command(build_dir)?.args(macos_settings(&self.variant)))
    }

    fn configure_command(
        &self,
        cmake: &CMakeInvocation,
        build_dir: &Path,
        output_dir: &Path,
        reporter: &dyn Reporter,
    ) -> Result<ProcessBuilder> {
        Ok(cmake
            .configure_command(build_dir, output_dir, reporter)?
            .args(macos_configure_args(&self.variant)))
    }
}

/// Facade over the selected strategy and the shared tool invocations.
#[derive(Debug)]
pub struct CommandBuilder {
    strategy: Box<dyn CommandBuilderStrategy>,
    conan: ConanInvocation,
    cmake: CMakeInvocation,
}

impl CommandBuilder {
    /// Select the strategy for `host`.
    pub fn for_host(
        host: HostPlatform,
        variant: PlatformVariant,
        conan: ConanInvocation,
        cmake: CMakeInvocation,
    ) -> Self {
        let strategy: Box<dyn CommandBuilderStrategy> = match host {
            HostPlatform::Default => Box::new(DefaultStrategy),
            HostPlatform::MacOs => Box::new(MacOsStrategy::new(variant)),
        };
        CommandBuilder {
            strategy,
            conan,
            cmake,
        }
    }

    /// Configure and build with the given presets.
    pub fn with_presets(mut self, names: &PresetNames) -> Self {
        self.cmake = self
            .cmake
            .config_preset(Some(names.configure.clone()))
            .build_preset(Some(names.build.clone()));
        self
    }

    /// Platform of the selected strategy.
    pub fn platform(&self) -> HostPlatform {
        self.strategy.platform()
    }

    pub fn install_command(&self, build_dir: &Path) -> Result<ProcessBuilder> {
        self.strategy.install_command(&self.conan, build_dir)
    }

    pub fn configure_command(
        &self,
        build_dir: &Path,
        output_dir: &Path,
        reporter: &dyn Reporter,
    ) -> Result<ProcessBuilder> {
        self.strategy
            .configure_command(&self.cmake, build_dir, output_dir, reporter)
    }

    pub fn build_command(&self, build_dir: &Path, reporter: &dyn Reporter) -> Result<ProcessBuilder> {
        self.strategy.build_command(&self.cmake, build_dir, reporter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{interpreter, RecordingReporter};
    use crate::util::process::ToolSource;
    use crate::util::report::TracingReporter;

    fn builder(host: HostPlatform, arches: &[&str]) -> CommandBuilder {
        let variant = PlatformVariant {
            architectures: arches.iter().map(|a| a.to_string()).collect(),
            min_os_version: Some("11.0".to_string()),
        };
        CommandBuilder::for_host(
            host,
            variant,
            ConanInvocation::new(ToolSource::Fixed("conan".into())),
            CMakeInvocation::new(ToolSource::Fixed("cmake".into()), interpreter()),
        )
        .with_presets(&PresetNames {
            configure: "cfg".to_string(),
            build: "bld".to_string(),
            test: "tst".to_string(),
        })
    }

    #[test]
    fn test_default_install_is_base_only() {
        let cmd = builder(HostPlatform::Default, &["arm64"])
            .install_command(Path::new("out"))
            .unwrap();

        assert_eq!(cmd.display_command(), "conan install . --build=missing -of out");
    }

    #[test]
    fn test_macos_install_appends_settings() {
        let cmd = builder(HostPlatform::MacOs, &["x86_64", "arm64"])
            .install_command(Path::new("out"))
            .unwrap();

        assert_eq!(
            cmd.display_command(),
            "conan install . --build=missing -of out -s=os.version=11.0 -s=arch=armv8|x86_64"
        );
    }

    #[test]
    fn test_macos_configure_appends_deployment_target() {
        let cmd = builder(HostPlatform::MacOs, &["arm64"])
            .configure_command(Path::new("b"), Path::new("/out"), &TracingReporter)
            .unwrap();
        let args = cmd.get_args();

        assert_eq!(
            &args[args.len() - 2..],
            &[
                "-DCMAKE_OSX_DEPLOYMENT_TARGET=11.0".to_string(),
                "-DCMAKE_OSX_ARCHITECTURES=arm64".to_string()
            ]
        );
    }

    #[test]
    fn test_default_configure_has_no_osx_settings() {
        let cmd = builder(HostPlatform::Default, &["arm64"])
            .configure_command(Path::new("b"), Path::new("/out"), &TracingReporter)
            .unwrap();

        assert!(!cmd.get_args().iter().any(|a| a.contains("CMAKE_OSX")));
    }

    #[test]
    fn test_build_command_same_on_every_host() {
        let default = builder(HostPlatform::Default, &[])
            .build_command(Path::new("b"), &TracingReporter)
            .unwrap();
        let macos = builder(HostPlatform::MacOs, &[])
            .build_command(Path::new("b"), &TracingReporter)
            .unwrap();

        assert_eq!(default, macos);
    }

    #[test]
    fn test_presets_replace_build_dir() {
        let plain = CommandBuilder::for_host(
            HostPlatform::Default,
            PlatformVariant::default(),
            ConanInvocation::new(ToolSource::Fixed("conan".into())),
            CMakeInvocation::new(ToolSource::Fixed("cmake".into()), interpreter()),
        );
        let reporter = RecordingReporter::default();

        let cmd = plain.build_command(Path::new("b"), &reporter).unwrap();
        assert_eq!(cmd.display_command(), "cmake --build b --target install");
        assert_eq!(reporter.warnings().len(), 1);

        let cmd = builder(HostPlatform::Default, &[])
            .build_command(Path::new("b"), &reporter)
            .unwrap();
        assert_eq!(cmd.display_command(), "cmake --build --preset=bld --target install");
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[test]
    fn test_strategy_selected_once() {
        assert_eq!(builder(HostPlatform::MacOs, &[]).platform(), HostPlatform::MacOs);
        assert_eq!(builder(HostPlatform::Default, &[]).platform(), HostPlatform::Default);
    }
}
