//! `extforge develop` command

use anyhow::Result;

use super::build::print_summary;
use super::load_project;
use crate::cli::DevelopArgs;
use crate::GlobalArgs;
use extforge::ops::extforge_build::{build, BuildMode, BuildOptions};

pub fn execute(args: DevelopArgs, global: &GlobalArgs) -> Result<()> {
    let (ctx, manifest) = load_project(global.verbose)?;

    let opts = BuildOptions {
        mode: BuildMode::InPlace,
        extensions: args.extensions,
        build_lib: None,
    };

    let reports = build(&manifest, &ctx, global.python.as_deref(), &opts)?;
    print_summary(&reports);
    Ok(())
}
