//! Implementation of `extforge build` and `extforge develop`.
//!
//! One extension build runs these steps, each blocking on the previous:
//!
//! 1. `conan install` into `<build-temp>/<extension>_build`
//! 2. rename the generated CMake presets for this interpreter
//! 3. `cmake --preset=...` configure
//! 4. check CMake resolved the same interpreter
//! 5. `cmake --build --preset=... --target install`
//! 6. merge conan's build info into the link descriptor

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::builder::build_info::{BuildInfoLocator, BuildMetadataMerger};
use crate::builder::presets::{PresetNames, PresetReconciler, ReconcileOutcome, USER_PRESETS_FILE};
use crate::builder::{
    CMakeInvocation, CommandBuilder, ConanInvocation, ConsistencyGate, PlatformVariantResolver,
};
use crate::core::interpreter::locate_python;
use crate::core::{
    CompilerKind, Extension, HostPlatform, InterpreterInfo, LinkDescriptor, Manifest,
    PlatformVariant,
};
use crate::util::context::{EnvSnapshot, GlobalContext};
use crate::util::fs::{absolute, ensure_dir, resolve_against, write_string};
use crate::util::process::{CommandRunner, ProcessBuilder, SystemRunner, ToolLocator};
use crate::util::report::{Reporter, Status, TracingReporter};

/// File the merged link descriptor is written to, inside the build path.
pub const DESCRIPTOR_FILE: &str = "link-descriptor.json";

/// Contents of [`DESCRIPTOR_FILE`]: the merged descriptor plus the sources
/// and language level needed to compile the extension without CMake.
#[derive(Debug, Serialize)]
pub struct DescriptorFile<'a> {
    pub extension: &'a str,
    pub sources: Vec<PathBuf>,
    pub cxx_std: Option<u32>,
    #[serde(flatten)]
    pub descriptor: &'a LinkDescriptor,
}

/// Where the built extension ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Into the build-lib directory, for packaging
    #[default]
    Distributable,
    /// Into the project's package directory
    InPlace,
}

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Where the extension is installed
    pub mode: BuildMode,

    /// Specific extensions to build (empty = all)
    pub extensions: Vec<String>,

    /// Build-lib override from the command line
    pub build_lib: Option<PathBuf>,
}

/// Paths for one build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    /// Parent of every per-extension build path
    pub build_temp: PathBuf,
    /// CMake install prefix
    pub output_dir: PathBuf,
}

impl BuildPaths {
    /// Resolve paths from environment, config and command line.
    ///
    /// Build temp: `EXTFORGE_BUILD_TEMP_DIR` > config > `<root>/build/temp`.
    /// Output: in-place builds use the package directory; otherwise
    /// command line > config > `<root>/build/lib`.
    pub fn resolve(manifest: &Manifest, ctx: &GlobalContext, opts: &BuildOptions) -> Self {
        let root = &manifest.root;
        let config = ctx.load_config(root);

        let build_temp = ctx
            .env()
            .build_temp_dir
            .clone()
            .or(config.build.build_temp)
            .map(|p| resolve_against(root, &p))
            .unwrap_or_else(|| root.join("build").join("temp"));

        let output_dir = match opts.mode {
            BuildMode::InPlace => manifest.inplace_dir(),
            BuildMode::Distributable => opts
                .build_lib
                .clone()
                .or(config.build.build_lib)
                .map(|p| resolve_against(root, &p))
                .unwrap_or_else(|| root.join("build").join("lib")),
        };

        BuildPaths {
            build_temp,
            output_dir,
        }
    }
}

/// What a finished extension build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub extension: String,
    pub build_path: PathBuf,
    pub output_dir: PathBuf,
    pub variant: PlatformVariant,
    /// Preset names, when the generated presets could be renamed
    pub presets: Option<PresetNames>,
    /// Merged descriptor, when conan emitted build info
    pub descriptor: Option<LinkDescriptor>,
    /// Stable-ABI tag for packaging, e.g. `cp312`
    pub limited_api: Option<String>,
}

/// Stable-ABI tag for an extension built against `version`.
///
/// nanobind only supports the limited API from 3.12 on, so older
/// interpreters always build a version-specific extension.
pub fn limited_api_tag(version: (u32, u32), requested: bool) -> Option<String> {
    (requested && version >= (3, 12)).then(|| "cp312".to_string())
}

/// Drives the external tools for one project.
pub struct ExtensionBuilder<R, P> {
    project_root: PathBuf,
    interpreter: InterpreterInfo,
    env: EnvSnapshot,
    host: HostPlatform,
    tools: ToolLocator,
    compiler: CompilerKind,
    runner: R,
    reporter: P,
}

impl<R: CommandRunner, P: Reporter> ExtensionBuilder<R, P> {
    pub fn new(
        project_root: impl Into<PathBuf>,
        interpreter: InterpreterInfo,
        runner: R,
        reporter: P,
    ) -> Self {
        ExtensionBuilder {
            project_root: project_root.into(),
            interpreter,
            env: EnvSnapshot::default(),
            host: HostPlatform::current(),
            tools: ToolLocator::default(),
            compiler: CompilerKind::host_default(),
            runner,
            reporter,
        }
    }

    /// Use the given environment snapshot.
    pub fn env(mut self, env: EnvSnapshot) -> Self {
        self.env = env;
        self
    }

    /// Override the host platform.
    pub fn host(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    /// Use the given tool locations.
    pub fn tools(mut self, tools: ToolLocator) -> Self {
        self.tools = tools;
        self
    }

    /// Compiler family for link fixups.
    pub fn compiler(mut self, compiler: CompilerKind) -> Self {
        self.compiler = compiler;
        self
    }

    /// Resolve the platform variant for this host.
    pub fn platform_variant(&self) -> PlatformVariant {
        PlatformVariantResolver::new(&self.interpreter, &self.env).resolve(self.host, &self.reporter)
    }

    /// Build one extension.
    pub fn build(&self, ext: &Extension, paths: &BuildPaths) -> Result<BuildReport> {
        let build_path = absolute(&paths.build_temp.join(ext.build_dir_name()))?;
        ensure_dir(&build_path)?;
        self.reporter
            .status(Status::Info, &format!("Using build path {}", build_path.display()));

        let variant = self.platform_variant();
        let mut commands = self.command_builder(ext, variant.clone());

        self.reporter
            .status(Status::Resolving, "dependencies with conan");
        self.spawn(commands.install_command(&build_path)?)?;

        let presets = self.reconcile_presets(&build_path)?;
        if let Some(names) = &presets {
            commands = commands.with_presets(names);
        }

        self.reporter
            .status(Status::Configuring, &format!("{} with CMake", ext.name));
        self.spawn(commands.configure_command(&build_path, &paths.output_dir, &self.reporter)?)?;
        ConsistencyGate::new(&self.interpreter.executable).check(&build_path)?;

        self.reporter
            .status(Status::Building, &format!("{} with CMake", ext.name));
        self.spawn(commands.build_command(&build_path, &self.reporter)?)?;

        let descriptor = self.merge_descriptor(ext, &build_path)?;
        let limited_api = limited_api_tag(self.interpreter.version, ext.py_limited_api);

        self.reporter.status(
            Status::Finished,
            &format!("{} -> {}", ext.name, paths.output_dir.display()),
        );

        Ok(BuildReport {
            extension: ext.name.clone(),
            build_path,
            output_dir: paths.output_dir.clone(),
            variant,
            presets,
            descriptor,
            limited_api,
        })
    }

    fn command_builder(&self, ext: &Extension, variant: PlatformVariant) -> CommandBuilder {
        let conanfile = ext
            .conanfile
            .as_ref()
            .map(|c| resolve_against(&self.project_root, c));

        let conan = ConanInvocation::new(self.tools.conan.clone()).conanfile(conanfile);
        let cmake = CMakeInvocation::new(self.tools.cmake.clone(), self.interpreter.clone())
            .args(ext.cmake_args.iter().cloned());

        CommandBuilder::for_host(self.host, variant, conan, cmake)
    }

    /// Rename the generated presets for this interpreter.
    ///
    /// Returns `None` when conan wrote no user presets; CMake then runs
    /// without presets.
    fn reconcile_presets(&self, build_path: &Path) -> Result<Option<PresetNames>> {
        let top_level = self.project_root.join(USER_PRESETS_FILE);
        if !top_level.exists() {
            self.reporter.warn(&format!(
                "Unable to update cmake preset name because {} was not found.",
                USER_PRESETS_FILE
            ));
            return Ok(None);
        }

        let presets = PresetNames::for_python(self.interpreter.version);
        let outcome = PresetReconciler::new(top_level)
            .build_dir(build_path)
            .reconcile(&presets)?;
        match &outcome {
            ReconcileOutcome::Updated(path) => self.reporter.status(
                Status::Updated,
                &format!("preset names in {}", path.display()),
            ),
            ReconcileOutcome::Unchanged(path) => self
                .reporter
                .debug(&format!("Preset names in {} already match", path.display())),
        }
        Ok(Some(presets))
    }

    fn merge_descriptor(&self, ext: &Extension, build_path: &Path) -> Result<Option<LinkDescriptor>> {
        let probe = BuildInfoLocator::new(build_path).probe();
        let Some(info_path) = probe.found else {
            self.reporter.warn(&format!(
                "No conan build info found (searched {}); skipping link descriptor",
                probe
                    .searched
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            return Ok(None);
        };

        let mut desc = ext.descriptor(&self.project_root);
        BuildMetadataMerger::new(self.compiler).merge_file(&mut desc, &info_path, None)?;

        let file = DescriptorFile {
            extension: &ext.name,
            sources: ext
                .sources
                .iter()
                .map(|src| resolve_against(&self.project_root, src))
                .collect(),
            cxx_std: ext.cxx_std,
            descriptor: &desc,
        };
        let out = build_path.join(DESCRIPTOR_FILE);
        write_string(&out, &serde_json::to_string_pretty(&file)?)?;
        self.reporter
            .debug(&format!("Wrote link descriptor {}", out.display()));
        Ok(Some(desc))
    }

    fn spawn(&self, cmd: ProcessBuilder) -> Result<()> {
        let cmd = cmd.cwd(&self.project_root);
        self.reporter.debug(&cmd.display_command());
        self.runner.run(&cmd)
    }
}

/// Probe the configured interpreter and set up a builder that runs real
/// processes.
pub fn system_builder(
    manifest: &Manifest,
    ctx: &GlobalContext,
    python: Option<&Path>,
) -> Result<ExtensionBuilder<SystemRunner, TracingReporter>> {
    let config = ctx.load_config(&manifest.root);
    let python = python
        .map(Path::to_path_buf)
        .or(config.build.python.clone());
    let python = locate_python(python.as_deref())?;
    let interpreter = InterpreterInfo::probe(&python)?;

    Ok(ExtensionBuilder::new(
        manifest.root.clone(),
        interpreter,
        SystemRunner,
        TracingReporter,
    )
    .env(ctx.env().clone())
    .tools(config.tools())
    .compiler(config.compiler()?))
}

/// Build the selected extensions of a project.
pub fn build(
    manifest: &Manifest,
    ctx: &GlobalContext,
    python: Option<&Path>,
    opts: &BuildOptions,
) -> Result<Vec<BuildReport>> {
    let builder = system_builder(manifest, ctx, python)?;
    let paths = BuildPaths::resolve(manifest, ctx, opts);

    manifest
        .select(&opts.extensions)?
        .into_iter()
        .map(|ext| {
            builder
                .build(ext, &paths)
                .with_context(|| format!("failed to build extension `{}`", ext.name))
        })
        .collect()
}
