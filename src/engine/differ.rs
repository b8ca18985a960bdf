//! Plan display

use colored::Colorize;
use declarative::{Action, DiffSummary, ResourceDiff, group_by_kind};

use crate::ui;

fn kind_title(kind: &str) -> &str {
    match kind {
        "image" => "Images",
        "cast_config" => "Casting configurations",
        "registry" => "Registries",
        other => other,
    }
}

/// Display the changes in `diffs`; no-change entries are counted only.
pub fn display_diff(diffs: &[ResourceDiff]) {
    let changes: Vec<ResourceDiff> = diffs.iter().filter(|d| d.is_change()).cloned().collect();
    if changes.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Planned Changes".bold()
    );
    println!("│");

    for (kind, kind_diffs) in group_by_kind(&changes) {
        println!("│ {}", kind_title(kind).bold());

        for diff in kind_diffs {
            let (symbol, note) = match diff.action {
                Action::Create => ("+".green(), "(create)"),
                Action::Update => ("~".yellow(), "(update in place)"),
                Action::Delete => ("-".red(), "(delete)"),
                Action::NoChange => continue,
            };
            println!("│   {} {:<30} {}", symbol, diff.address, note.dimmed());

            for change in &diff.changes {
                let from = change
                    .from
                    .as_ref()
                    .map_or_else(|| "(unset)".to_string(), ui::value);
                let line = match diff.action {
                    Action::Create => format!("{} = {}", change.field, ui::value(&change.to)),
                    _ => format!("{}: {} → {}", change.field, from, ui::value(&change.to)),
                };
                println!("│       {}", line.dimmed());
            }
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    let unchanged = diffs.len() - summary.total();

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Plan: {} to create, {} to update, {} to delete, {} unchanged",
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red(),
        unchanged
    );
    println!("└─────────────────────────────────────────────────────┘");
}
