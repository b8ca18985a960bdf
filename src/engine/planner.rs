//! Plan construction
//!
//! A plan compares the manifest with the persisted state only; it never
//! calls the server. Run `refresh` first to pick up out-of-band changes.

use anyhow::{Context, Result, bail};
use declarative::{Action, DiffSummary, Registry, ResourceDiff};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::manifest::Manifest;
use crate::state::StateFile;

/// One addressed resource and what applying the plan does to it
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub diff: ResourceDiff,
    /// Canonical desired state, absent for deletions
    pub desired: Option<Value>,
    /// Server ObjectID from state, absent for creations
    pub id: Option<String>,
}

impl PlannedChange {
    pub fn address(&self) -> &str {
        &self.diff.address
    }

    pub fn kind(&self) -> &str {
        &self.diff.kind
    }

    pub fn action(&self) -> Action {
        self.diff.action
    }
}

#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub items: Vec<PlannedChange>,
}

impl Plan {
    /// Converge state towards `manifest`; undeclared records are deleted.
    pub fn build(manifest: &Manifest, state: &StateFile, registry: &Registry) -> Result<Self> {
        let mut items = Vec::new();

        for (address, declared) in &manifest.resources {
            let resource = registry
                .resource(&declared.kind)
                .with_context(|| format!("Resource {address:?}"))?;
            let desired = resource
                .validate(&declared.desired())
                .with_context(|| format!("Resource {address:?} is not a valid {}", declared.kind))?;

            let record = state.get(address);
            if let Some(record) = record
                && record.kind != declared.kind
            {
                bail!(
                    "Resource {address:?} is recorded as {} but declared as {}; destroy it before changing its kind",
                    record.kind,
                    declared.kind
                );
            }

            let diff = ResourceDiff::compute(
                address,
                &declared.kind,
                &desired,
                record.map(|r| &r.state),
            );
            items.push(PlannedChange {
                diff,
                desired: Some(desired),
                id: record.map(|r| r.id.clone()),
            });
        }

        for (address, record) in &state.resources {
            if !manifest.resources.contains_key(address) {
                items.push(removal(address, &record.kind, &record.id));
            }
        }

        log::debug!("Planned {} resources", items.len());
        Ok(Self { items })
    }

    /// Delete the given addresses, or every recorded resource if none given.
    pub fn destroy(state: &StateFile, addresses: &[String]) -> Result<Self> {
        let selected: BTreeSet<&str> = if addresses.is_empty() {
            state.resources.keys().map(String::as_str).collect()
        } else {
            let unknown: Vec<&str> = addresses
                .iter()
                .map(String::as_str)
                .filter(|a| state.get(a).is_none())
                .collect();
            if !unknown.is_empty() {
                bail!("Not in state: {}", unknown.join(", "));
            }
            addresses.iter().map(String::as_str).collect()
        };

        let items = selected
            .into_iter()
            .filter_map(|address| {
                state
                    .get(address)
                    .map(|record| removal(address, &record.kind, &record.id))
            })
            .collect();
        Ok(Self { items })
    }

    /// Entries that change something remotely
    pub fn changes(&self) -> Vec<&PlannedChange> {
        self.items.iter().filter(|c| c.diff.is_change()).collect()
    }

    pub fn diffs(&self) -> Vec<ResourceDiff> {
        self.items.iter().map(|c| c.diff.clone()).collect()
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_diffs(&self.diffs())
    }
}

fn removal(address: &str, kind: &str, id: &str) -> PlannedChange {
    PlannedChange {
        diff: ResourceDiff::removal(address, kind),
        desired: None,
        id: Some(id.to_string()),
    }
}
