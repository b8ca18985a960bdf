//! Execution engine for kasmctl
//!
//! The engine orchestrates:
//! 1. Planning - compare the manifest with persisted state
//! 2. Diffing - show what would change
//! 3. Executing - run the changes in parallel and record the results

pub mod differ;
pub mod executor;
pub mod planner;

pub use differ::display_diff;
pub use executor::{ExecuteOptions, ExecuteSummary, execute, refresh};
pub use planner::Plan;
