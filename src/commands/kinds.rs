use anyhow::Result;
use colored::Colorize;

use crate::resources::CATALOG;
use crate::ui;

pub fn run() -> Result<()> {
    ui::header("Resource kinds");
    for kind in CATALOG.iter().filter(|k| !k.data_source) {
        println!("  {} {}", format!("{:<18}", kind.name).bold(), kind.description.dimmed());
    }

    ui::header("Data sources");
    for kind in CATALOG.iter().filter(|k| k.data_source) {
        println!("  {} {}", format!("{:<18}", kind.name).bold(), kind.description.dimmed());
    }

    Ok(())
}
