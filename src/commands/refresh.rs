use anyhow::{Result, bail};

use crate::Context;
use crate::engine::{ExecuteOptions, refresh};

use super::{connect, load_state};

pub fn run(ctx: &Context, jobs: usize) -> Result<()> {
    let registry = connect(ctx)?;
    let mut state = load_state(ctx)?;

    let opts = ExecuteOptions {
        jobs,
        yes: true,
        quiet: ctx.quiet,
    };

    let summary = refresh(&registry, &mut state, &ctx.cancel_token(), &opts)?;
    if !summary.is_success() {
        bail!("{} resources could not be refreshed", summary.failed);
    }
    Ok(())
}
