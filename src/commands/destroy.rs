use anyhow::{Result, bail};

use crate::Context;
use crate::engine::{ExecuteOptions, Plan, execute};
use crate::ui;

use super::{connect, load_state};

pub fn run(ctx: &Context, addresses: &[String], yes: bool, jobs: usize) -> Result<()> {
    let mut state = load_state(ctx)?;
    if state.is_empty() {
        ui::info("Nothing recorded in state");
        return Ok(());
    }

    let plan = Plan::destroy(&state, addresses)?;
    let registry = connect(ctx)?;
    let opts = ExecuteOptions {
        jobs,
        yes,
        quiet: ctx.quiet,
    };

    let summary = execute(&plan, &registry, &mut state, &ctx.cancel_token(), &opts)?;
    if !summary.is_success() {
        bail!("{} resources failed to delete", summary.failed);
    }
    Ok(())
}
