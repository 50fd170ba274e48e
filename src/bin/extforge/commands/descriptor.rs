//! `extforge descriptor` command

use anyhow::Result;

use super::load_project;
use crate::cli::DescriptorArgs;
use crate::GlobalArgs;
use extforge::ops::descriptor::{link_descriptor, DescriptorOptions};

pub fn execute(args: DescriptorArgs, global: &GlobalArgs) -> Result<()> {
    let (ctx, manifest) = load_project(global.verbose)?;

    let opts = DescriptorOptions {
        extension: args.extension,
        dependency: args.dependency,
        build_path: args.build_path.map(|p| ctx.cwd().join(p)),
    };

    let desc = link_descriptor(&manifest, &ctx, &opts)?;
    println!("{}", serde_json::to_string_pretty(&desc)?);
    Ok(())
}
