//! Plan execution
//!
//! Resources are independent of each other, so every change in a plan runs
//! on a bounded rayon pool. State is only touched after all remote calls
//! have returned, one record per finished operation.

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use declarative::{
    Action, Applied, CancelToken, DeleteOutcome, Discrepancy, ReadOutcome, Registry,
};
use rayon::prelude::*;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::progress;
use crate::state::StateFile;
use crate::ui;

use super::differ::display_diff;
use super::planner::{Plan, PlannedChange};

#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Number of parallel jobs
    pub jobs: usize,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Hide progress output
    pub quiet: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            yes: false,
            quiet: false,
        }
    }
}

/// What happened to one resource
#[derive(Debug)]
pub enum Outcome {
    Created(Applied<Value>),
    Updated(Applied<Value>),
    Deleted(DeleteOutcome),
    Refreshed(ReadOutcome<Value>),
    Failed(String),
}

#[derive(Debug)]
pub struct TaskResult {
    pub address: String,
    pub kind: String,
    pub outcome: Outcome,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Deletes that left the object in place
    pub retained: usize,
    pub refreshed: usize,
    /// Objects found missing on refresh
    pub gone: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Show `plan`, confirm, run it, and persist the results.
pub fn execute(
    plan: &Plan,
    registry: &Registry,
    state: &mut StateFile,
    cancel: &CancelToken,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    display_diff(&plan.diffs());

    let changes = plan.changes();
    if changes.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    if !opts.yes && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(ExecuteSummary {
            skipped: changes.len(),
            ..Default::default()
        });
    }

    println!();
    println!(
        "  {} Applying {} changes...",
        "→".cyan(),
        changes.len()
    );

    let results = run_parallel(&changes, opts, "Applying", |change| TaskResult {
        address: change.address().to_string(),
        kind: change.kind().to_string(),
        outcome: converge(registry, change, cancel)
            .unwrap_or_else(|e| Outcome::Failed(format!("{e:#}"))),
    })?;

    let summary = record(state, results);
    state.save()?;
    print_summary(&summary);
    Ok(summary)
}

/// Re-read every recorded object and persist what the server reports.
pub fn refresh(
    registry: &Registry,
    state: &mut StateFile,
    cancel: &CancelToken,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    let records: Vec<(String, String, String, Value)> = state
        .resources
        .iter()
        .map(|(address, r)| (address.clone(), r.kind.clone(), r.id.clone(), r.state.clone()))
        .collect();

    if records.is_empty() {
        ui::info("Nothing recorded in state");
        return Ok(ExecuteSummary::default());
    }

    let results = run_parallel(&records, opts, "Refreshing", |(address, kind, id, prior)| {
        let outcome = registry
            .resource(kind)
            .and_then(|resource| resource.read(id, Some(prior), cancel))
            .map_or_else(|e| Outcome::Failed(e.to_string()), Outcome::Refreshed);
        TaskResult {
            address: address.clone(),
            kind: kind.clone(),
            outcome,
        }
    })?;

    let summary = record(state, results);
    state.save()?;
    print_summary(&summary);
    Ok(summary)
}

fn converge(
    registry: &Registry,
    change: &PlannedChange,
    cancel: &CancelToken,
) -> Result<Outcome> {
    let resource = registry.resource(change.kind())?;
    let outcome = match (change.action(), change.id.as_deref(), &change.desired) {
        (Action::Create, _, Some(desired)) => Outcome::Created(resource.create(desired, cancel)?),
        (Action::Update, Some(id), Some(desired)) => {
            Outcome::Updated(resource.update(id, desired, cancel)?)
        }
        (Action::Delete, Some(id), _) => Outcome::Deleted(resource.delete(id, cancel)?),
        (action, ..) => bail!("Nothing to run for {action:?} on {}", change.address()),
    };
    Ok(outcome)
}

/// Run `task` over `items` on a pool of `opts.jobs` threads.
///
/// Results are sorted by address.
pub fn run_parallel<T, F>(
    items: &[T],
    opts: &ExecuteOptions,
    prefix: &str,
    task: F,
) -> Result<Vec<TaskResult>>
where
    T: Sync,
    F: Fn(&T) -> TaskResult + Sync,
{
    let pb = progress::bar(items.len() as u64, prefix, opts.quiet);
    let results: Arc<Mutex<Vec<TaskResult>>> = Arc::new(Mutex::new(Vec::new()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.max(1))
        .build()
        .context("Failed to create worker thread pool")?;

    pool.install(|| {
        items.par_iter().for_each(|item| {
            let result = task(item);

            let symbol = match &result.outcome {
                Outcome::Failed(_) => "✗",
                Outcome::Deleted(DeleteOutcome::Retained(_)) => "⊘",
                _ => "✓",
            };
            pb.set_message(format!("{} {}", symbol, result.address));
            pb.inc(1);

            push_task_result(&results, result);
        });
    });

    pb.finish_and_clear();

    let mut collected = into_task_results(results)?;
    collected.sort_by(|a, b| a.address.cmp(&b.address));
    Ok(collected)
}

fn push_task_result(results: &Arc<Mutex<Vec<TaskResult>>>, result: TaskResult) {
    match results.lock() {
        Ok(mut locked) => locked.push(result),
        Err(poisoned) => poisoned.into_inner().push(result),
    }
}

fn into_task_results(results: Arc<Mutex<Vec<TaskResult>>>) -> Result<Vec<TaskResult>> {
    let mutex = Arc::try_unwrap(results)
        .map_err(|_| anyhow::anyhow!("Failed to collect results: shared result state"))?;

    match mutex.into_inner() {
        Ok(collected) => Ok(collected),
        Err(poisoned) => Ok(poisoned.into_inner()),
    }
}

/// Fold finished operations into state and report them.
pub fn record(state: &mut StateFile, results: Vec<TaskResult>) -> ExecuteSummary {
    let mut summary = ExecuteSummary::default();

    for TaskResult {
        address,
        kind,
        outcome,
    } in results
    {
        match outcome {
            Outcome::Created(applied) => {
                report_discrepancies(&address, &applied.discrepancies);
                state.put(&address, &kind, applied.id, applied.state);
                summary.created += 1;
            }
            Outcome::Updated(applied) => {
                report_discrepancies(&address, &applied.discrepancies);
                state.put(&address, &kind, applied.id, applied.state);
                summary.updated += 1;
            }
            Outcome::Refreshed(ReadOutcome::Present(applied)) => {
                report_discrepancies(&address, &applied.discrepancies);
                state.put(&address, &kind, applied.id, applied.state);
                summary.refreshed += 1;
            }
            Outcome::Refreshed(ReadOutcome::Gone) => {
                ui::warn(&format!(
                    "{address}: no longer exists remotely, removed from state"
                ));
                state.remove(&address);
                summary.gone += 1;
            }
            Outcome::Deleted(deleted) => {
                if let Some(warning) = deleted.warning() {
                    ui::warn(&format!("{address}: {warning}"));
                }
                if deleted.drops_state() {
                    state.remove(&address);
                    summary.deleted += 1;
                } else {
                    summary.retained += 1;
                }
            }
            Outcome::Failed(message) => {
                ui::error(&format!("{address}: {message}"));
                summary.failed += 1;
            }
        }
    }

    summary
}

fn report_discrepancies(address: &str, discrepancies: &[Discrepancy]) {
    for d in discrepancies {
        ui::warn(&format!("{address}: {d}"));
    }
}

/// Confirm with user
pub fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(false)
        .interact()
        .context("Confirmation needs a terminal; pass --yes to skip it")?;

    Ok(confirmed)
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Done", "✓".green().bold());
    } else {
        println!("  {} Finished with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} resources updated", summary.updated);
    }
    if summary.deleted > 0 {
        println!("    • {} resources deleted", summary.deleted);
    }
    if summary.retained > 0 {
        println!("    • {} resources kept in state", summary.retained);
    }
    if summary.refreshed > 0 {
        println!("    • {} resources refreshed", summary.refreshed);
    }
    if summary.gone > 0 {
        println!("    • {} resources gone", summary.gone);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}
