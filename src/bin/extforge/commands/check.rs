//! `extforge check` command

use anyhow::{bail, Result};

use crate::GlobalArgs;
use extforge::ops::check::{check, format_report};
use extforge::GlobalContext;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(global.verbose);

    // Project config applies when run inside a project
    let root = match ctx.find_manifest() {
        Ok(manifest) => manifest
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ctx.cwd().to_path_buf()),
        Err(_) => ctx.cwd().to_path_buf(),
    };

    let report = check(&root, &ctx, global.python.as_deref());
    print!("{}", format_report(&report, ctx.is_verbose()));

    if !report.all_passed() {
        bail!("{} check(s) failed", report.failed_count());
    }
    Ok(())
}
