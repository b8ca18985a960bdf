use anyhow::{Result, bail};
use std::path::Path;

use crate::Context;
use crate::engine::{ExecuteOptions, Plan, execute};
use crate::manifest::Manifest;

use super::{connect, load_state};

pub fn run(ctx: &Context, manifest_path: &Path, yes: bool, jobs: usize) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let registry = connect(ctx)?;
    let mut state = load_state(ctx)?;

    let plan = Plan::build(&manifest, &state, &registry)?;
    let opts = ExecuteOptions {
        jobs,
        yes,
        quiet: ctx.quiet,
    };

    let summary = execute(&plan, &registry, &mut state, &ctx.cancel_token(), &opts)?;
    if !summary.is_success() {
        bail!("{} resources failed to apply", summary.failed);
    }
    Ok(())
}
