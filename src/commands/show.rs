use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;

use crate::Context;
use crate::ui;

use super::load_state;

pub fn run(ctx: &Context, address: Option<&str>) -> Result<()> {
    let state = load_state(ctx)?;

    if let Some(address) = address {
        let record = state
            .get(address)
            .with_context(|| format!("{address:?} is not in {}", state.path().display()))?;
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    if state.is_empty() {
        ui::info("Nothing recorded in state");
        return Ok(());
    }

    ui::header("Managed objects");
    for (address, record) in &state.resources {
        println!(
            "  {} {:<14} {}",
            format!("{address:<30}").bold(),
            record.kind,
            record.id.dimmed()
        );
    }
    println!();
    ui::kv("State file", &state.path().display().to_string());
    ui::kv(
        "Last updated",
        &state.last_updated.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    Ok(())
}
