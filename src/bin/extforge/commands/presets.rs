//! `extforge presets` command

use anyhow::Result;

use crate::cli::PresetsArgs;
use crate::GlobalArgs;
use extforge::builder::presets::{PresetNames, PresetReconciler, ReconcileOutcome};
use extforge::GlobalContext;

pub fn execute(args: PresetsArgs, global: &GlobalArgs) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(global.verbose);

    let names = PresetNames {
        configure: args.config,
        build: args.build,
        test: args.test,
    };

    let mut reconciler = PresetReconciler::new(ctx.cwd().join(&args.file));
    if let Some(dir) = args.build_dir {
        reconciler = reconciler.build_dir(ctx.cwd().join(dir));
    }

    match reconciler.reconcile(&names)? {
        ReconcileOutcome::Updated(path) => {
            eprintln!("     Updated {}", path.display());
        }
        ReconcileOutcome::Unchanged(path) => {
            eprintln!("   Unchanged {}", path.display());
        }
    }
    Ok(())
}
