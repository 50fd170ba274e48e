//! Command implementations

pub mod build;
pub mod check;
pub mod descriptor;
pub mod develop;
pub mod presets;

use anyhow::Result;
use extforge::{GlobalContext, Manifest};

/// Set up the context and load the manifest found from the working directory.
pub fn load_project(verbose: bool) -> Result<(GlobalContext, Manifest)> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);

    let manifest_path = ctx.find_manifest()?;
    let manifest = Manifest::load(&manifest_path)?;
    Ok((ctx, manifest))
}
