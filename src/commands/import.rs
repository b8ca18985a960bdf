use anyhow::{Context as AnyhowContext, Result, bail};

use crate::Context;
use crate::ui;

use super::{connect, load_state};

pub fn run(ctx: &Context, address: &str, kind: &str, id: &str) -> Result<()> {
    let mut state = load_state(ctx)?;
    if let Some(record) = state.get(address) {
        bail!(
            "{address:?} is already managed ({} {}); destroy or rename it first",
            record.kind,
            record.id
        );
    }

    let registry = connect(ctx)?;
    let resource = registry.resource(kind)?;
    let applied = resource
        .import(id, &ctx.cancel_token())
        .with_context(|| format!("Could not import {kind} {id}"))?;

    for discrepancy in &applied.discrepancies {
        ui::warn(&format!("{address}: {discrepancy}"));
    }

    state.put(address, kind, applied.id, applied.state);
    state.save()?;

    ui::success(&format!("Imported {kind} {id} as {address}"));
    Ok(())
}
