use anyhow::Result;
use std::path::Path;

use crate::Context;
use crate::engine::{Plan, display_diff};
use crate::manifest::Manifest;
use crate::ui;

use super::{connect, load_state};

pub fn run(ctx: &Context, manifest_path: &Path) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let registry = connect(ctx)?;
    let state = load_state(ctx)?;

    let plan = Plan::build(&manifest, &state, &registry)?;
    display_diff(&plan.diffs());

    if plan.summary().has_changes() && !ctx.quiet {
        println!();
        ui::dim("Planned against recorded state; run `kasmctl refresh` first to pick up changes made elsewhere.");
    }
    Ok(())
}
