//! Implementation of `extforge descriptor`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::builder::BuildMetadataMerger;
use crate::core::{LinkDescriptor, Manifest};
use crate::ops::extforge_build::{BuildOptions, BuildPaths};
use crate::util::context::GlobalContext;

/// Options for the descriptor command.
#[derive(Debug, Clone, Default)]
pub struct DescriptorOptions {
    /// Extension whose descriptor to print
    pub extension: String,

    /// Restrict to one dependency (default: aggregate scope)
    pub dependency: Option<String>,

    /// Build path to read from (default: the one `build` would use)
    pub build_path: Option<PathBuf>,
}

/// Merge an extension's manifest settings with the build info conan
/// generated for it.
///
/// Unlike during a build, missing build info is an error here.
pub fn link_descriptor(
    manifest: &Manifest,
    ctx: &GlobalContext,
    opts: &DescriptorOptions,
) -> Result<LinkDescriptor> {
    let ext = manifest
        .extension(&opts.extension)
        .with_context(|| format!("no extension named `{}`", opts.extension))?;

    let build_path = match &opts.build_path {
        Some(path) => path.clone(),
        None => BuildPaths::resolve(manifest, ctx, &BuildOptions::default())
            .build_temp
            .join(ext.build_dir_name()),
    };

    let compiler = ctx.load_config(&manifest.root).compiler()?;
    let mut desc = ext.descriptor(&manifest.root);
    BuildMetadataMerger::new(compiler).merge_from(
        &mut desc,
        &build_path,
        opts.dependency.as_deref(),
    )?;
    Ok(desc)
}
