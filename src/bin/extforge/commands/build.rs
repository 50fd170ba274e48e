//! `extforge build` command

use anyhow::Result;

use super::load_project;
use crate::cli::BuildArgs;
use crate::GlobalArgs;
use extforge::ops::extforge_build::{build, BuildMode, BuildOptions, BuildReport};

pub fn execute(args: BuildArgs, global: &GlobalArgs) -> Result<()> {
    let (ctx, manifest) = load_project(global.verbose)?;

    let opts = BuildOptions {
        mode: BuildMode::Distributable,
        extensions: args.extensions,
        build_lib: args.build_lib,
    };

    let reports = build(&manifest, &ctx, global.python.as_deref(), &opts)?;
    print_summary(&reports);
    Ok(())
}

/// One line per extension, plus its stable-ABI tag when it has one.
pub fn print_summary(reports: &[BuildReport]) {
    for report in reports {
        match &report.limited_api {
            Some(tag) => eprintln!(
                "    Finished `{}` ({}) -> {}",
                report.extension,
                tag,
                report.output_dir.display()
            ),
            None => eprintln!(
                "    Finished `{}` -> {}",
                report.extension,
                report.output_dir.display()
            ),
        }
    }
}
