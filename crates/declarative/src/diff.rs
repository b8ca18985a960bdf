//! Field-level diffs between desired and persisted state
//!
//! Only fields the caller declared are compared. An unset desired field
//! means "whatever the server chose", so it never produces a change.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A declared field whose persisted value differs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    /// Persisted value, `None` if the field is absent from state
    pub from: Option<Value>,
    pub to: Value,
}

/// What applying a desired state would do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    NoChange,
}

/// Planned change for one addressed resource
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDiff {
    pub address: String,
    pub kind: String,
    pub action: Action,
    pub changes: Vec<FieldChange>,
}

impl ResourceDiff {
    /// Compare a desired state with the persisted state, if any.
    pub fn compute(address: &str, kind: &str, desired: &Value, state: Option<&Value>) -> Self {
        let (action, changes) = match state {
            None => (Action::Create, diff_fields(desired, &Value::Null)),
            Some(state) => {
                let changes = diff_fields(desired, state);
                let action = if changes.is_empty() {
                    Action::NoChange
                } else {
                    Action::Update
                };
                (action, changes)
            }
        };

        Self {
            address: address.to_string(),
            kind: kind.to_string(),
            action,
            changes,
        }
    }

    /// A resource present in state but no longer declared
    pub fn removal(address: &str, kind: &str) -> Self {
        Self {
            address: address.to_string(),
            kind: kind.to_string(),
            action: Action::Delete,
            changes: Vec::new(),
        }
    }

    pub fn is_change(&self) -> bool {
        self.action != Action::NoChange
    }
}

/// Declared top-level fields of `desired` whose value differs in `state`.
pub fn diff_fields(desired: &Value, state: &Value) -> Vec<FieldChange> {
    let Value::Object(desired) = desired else {
        return Vec::new();
    };

    desired
        .iter()
        .filter(|(_, to)| !to.is_null())
        .filter_map(|(field, to)| {
            let from = state.get(field).filter(|v| !v.is_null());
            (from != Some(to)).then(|| FieldChange {
                field: field.clone(),
                from: from.cloned(),
                to: to.clone(),
            })
        })
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    pub additions: usize,
    pub removals: usize,
    pub modifications: usize,
}

impl DiffSummary {
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.action {
                Action::Create => summary.additions += 1,
                Action::Delete => summary.removals += 1,
                Action::Update => summary.modifications += 1,
                Action::NoChange => {}
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by kind
pub fn group_by_kind(diffs: &[ResourceDiff]) -> BTreeMap<&str, Vec<&ResourceDiff>> {
    let mut groups: BTreeMap<&str, Vec<&ResourceDiff>> = BTreeMap::new();
    for diff in diffs {
        groups.entry(diff.kind.as_str()).or_default().push(diff);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_fields_are_ignored() {
        let desired = json!({"name": "w"});
        let state = json!({"name": "w", "limit_sessions": false, "cast_config_id": "c1"});
        assert!(diff_fields(&desired, &state).is_empty());
    }

    #[test]
    fn test_changed_field_reported() {
        let desired = json!({"name": "w", "limit_sessions": true});
        let state = json!({"name": "w"});
        let changes = diff_fields(&desired, &state);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "limit_sessions");
        assert_eq!(changes[0].from, None);
        assert_eq!(changes[0].to, json!(true));
    }

    #[test]
    fn test_compute_actions() {
        let desired = json!({"name": "w"});
        assert_eq!(
            ResourceDiff::compute("a", "image", &desired, None).action,
            Action::Create
        );
        assert_eq!(
            ResourceDiff::compute("a", "image", &desired, Some(&desired)).action,
            Action::NoChange
        );
        assert_eq!(
            ResourceDiff::compute("a", "image", &json!({"name": "x"}), Some(&desired)).action,
            Action::Update
        );
    }

    #[test]
    fn test_summary() {
        let diffs = vec![
            ResourceDiff::compute("a", "image", &json!({"name": "a"}), None),
            ResourceDiff::removal("b", "registry"),
            ResourceDiff::compute("c", "image", &json!({"name": "c"}), Some(&json!({}))),
        ];
        let summary = DiffSummary::from_diffs(&diffs);
        assert_eq!(summary.additions, 1);
        assert_eq!(summary.removals, 1);
        assert_eq!(summary.modifications, 1);
        assert!(summary.has_changes());
        assert_eq!(group_by_kind(&diffs)["image"].len(), 2);
    }
}
