//! Workspace registries
//!
//! `create_registry` only acknowledges the request; the registry is listed
//! once the server has fetched its metadata. The controller finds it by
//! URL. The server also shortens the release channel (`1.16.0` becomes
//! `1.16`), so a declared channel is kept as written.

use declarative::{Fetch, Field, Normalized, ObjectKind};
use kasmkit::{Registry, RegistryPayload};
use serde::{Deserialize, Serialize};

/// Desired and persisted state of a registry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySpec {
    pub registry_url: String,
    /// Immutable after create
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub channel: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub do_auto_update: Field<bool>,

    // Computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

pub struct RegistryKind;

fn same_url(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

impl ObjectKind for RegistryKind {
    const NAME: &'static str = "registry";
    const FETCH: Fetch = Fetch::ListScan;
    const COMPUTED: &'static [&'static str] =
        &["registry_id", "name", "schema_version", "is_verified"];

    type Spec = RegistrySpec;
    type Remote = Registry;
    type Payload = RegistryPayload;

    fn create_payload(spec: &RegistrySpec) -> RegistryPayload {
        RegistryPayload {
            registry_id: None,
            registry_url: spec.registry_url.clone(),
            channel: spec.channel.to_payload(),
            do_auto_update: spec.do_auto_update.to_payload(),
        }
    }

    fn update_payload(spec: &RegistrySpec) -> RegistryPayload {
        RegistryPayload {
            do_auto_update: Some(spec.do_auto_update.value_or(false)),
            ..Self::create_payload(spec)
        }
    }

    fn from_remote(remote: &Registry, prior: Option<&RegistrySpec>) -> Normalized<RegistrySpec> {
        let mut discrepancies = Vec::new();

        let registry_url = match prior {
            Some(p) if same_url(&p.registry_url, &remote.registry_url) => p.registry_url.clone(),
            _ => remote.registry_url.clone(),
        };

        let state = RegistrySpec {
            registry_url,
            channel: Field::retain_declared(
                "channel",
                &remote.channel,
                &String::new(),
                prior.map(|p| &p.channel),
                &mut discrepancies,
            ),
            do_auto_update: Field::from_remote(
                &remote.do_auto_update,
                &false,
                prior.map(|p| &p.do_auto_update),
            ),
            registry_id: Some(remote.registry_id.clone()),
            name: Some(remote.name.clone()),
            schema_version: Some(remote.schema_version.clone()),
            is_verified: Some(remote.is_verified),
        };

        Normalized {
            state,
            discrepancies,
        }
    }

    fn remote_id(remote: &Registry) -> String {
        remote.registry_id.clone()
    }

    fn natural_key(spec: &RegistrySpec) -> String {
        spec.registry_url.clone()
    }

    fn matches_natural_key(spec: &RegistrySpec, remote: &Registry) -> bool {
        same_url(&spec.registry_url, &remote.registry_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::api::KasmApi;
    use crate::resources::fake::{FakeKasm, RecordedPauses};
    use declarative::{CancelToken, Controller, Error, ManagedResource, ReadOutcome};
    use kasmkit::Client;
    use std::sync::Arc;
    use std::time::Duration;

    const URL: &str = "https://registry.kasmweb.com/";

    fn controller(fake: &Arc<FakeKasm>, pauses: &RecordedPauses) -> Controller<RegistryKind, KasmApi> {
        Controller::new(KasmApi::new(Client::with_backend(fake.clone())))
            .with_sleeper(pauses.clone())
    }

    fn desired(channel: Field<String>) -> RegistrySpec {
        RegistrySpec {
            registry_url: URL.to_string(),
            channel,
            ..Default::default()
        }
    }

    #[test]
    fn test_update_payload_is_full() {
        let spec = desired(Field::Explicit("1.16".to_string()));

        let create = serde_json::to_value(RegistryKind::create_payload(&spec)).unwrap();
        assert!(create.get("do_auto_update").is_none());

        let update = serde_json::to_value(RegistryKind::update_payload(&spec)).unwrap();
        assert_eq!(update["registry_url"], URL);
        assert_eq!(update["channel"], "1.16");
        assert_eq!(update["do_auto_update"], false);
    }

    #[test]
    fn test_channel_is_retained_with_discrepancy() {
        let fake = Arc::new(FakeKasm::new());
        let pauses = RecordedPauses::default();
        let controller = controller(&fake, &pauses);
        let cancel = CancelToken::new();

        let created = controller
            .create(&desired(Field::Explicit("1.16.0".to_string())), &cancel)
            .unwrap();

        assert_eq!(created.state.channel, Field::Explicit("1.16.0".to_string()));
        assert_eq!(created.discrepancies.len(), 1);
        assert_eq!(created.discrepancies[0].field, "channel");
        assert_eq!(created.discrepancies[0].declared, "1.16.0");
        assert_eq!(created.discrepancies[0].remote, "1.16");

        // A later refresh keeps the declared channel too.
        let ReadOutcome::Present(read) = controller
            .read(&created.id, Some(&created.state), &cancel)
            .unwrap()
        else {
            panic!("registry should exist");
        };
        assert_eq!(read.state.channel, Field::Explicit("1.16.0".to_string()));
    }

    #[test]
    fn test_unset_channel_takes_server_value() {
        let fake = Arc::new(FakeKasm::new());
        let pauses = RecordedPauses::default();

        let created = controller(&fake, &pauses)
            .create(&desired(Field::Unset), &CancelToken::new())
            .unwrap();

        assert_eq!(created.state.channel, Field::Explicit("1.17".to_string()));
        assert!(created.discrepancies.is_empty());
        assert_eq!(created.state.name.as_deref(), Some("Kasm Technologies"));
    }

    #[test]
    fn test_async_create_found_on_second_attempt() {
        let fake = Arc::new(FakeKasm::new().with_registry_delay(1));
        let pauses = RecordedPauses::default();

        let created = controller(&fake, &pauses)
            .create(&desired(Field::Unset), &CancelToken::new())
            .unwrap();

        assert_eq!(fake.call_count("create_registry"), 1);
        assert_eq!(fake.call_count("get_registries"), 2);
        assert_eq!(*pauses.0.lock().unwrap(), vec![Duration::from_secs(5)]);
        assert_eq!(created.state.registry_id.as_deref(), Some(created.id.as_str()));
    }

    #[test]
    fn test_async_create_gives_up_after_two_attempts() {
        let fake = Arc::new(FakeKasm::new().with_registry_delay(5));
        let pauses = RecordedPauses::default();

        let err = controller(&fake, &pauses)
            .create(&desired(Field::Unset), &CancelToken::new())
            .unwrap_err();

        assert!(matches!(err, Error::LookupExhausted { attempts: 2, .. }));
        assert_eq!(fake.call_count("get_registries"), 2);
        assert_eq!(pauses.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_declared_server_metadata_is_rejected() {
        let fake = Arc::new(FakeKasm::new());
        let pauses = RecordedPauses::default();
        let controller = controller(&fake, &pauses);
        let resource: &dyn ManagedResource = &controller;

        let err = resource
            .validate(&serde_json::json!({"registry_url": URL, "is_verified": true}))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::ComputedField {
                field: "is_verified",
                ..
            }
        ));
    }

    #[test]
    fn test_lookup_ignores_trailing_slash() {
        let remote = Registry {
            registry_id: "r1".to_string(),
            registry_url: "https://registry.kasmweb.com".to_string(),
            ..Default::default()
        };
        let spec = desired(Field::Unset);
        assert!(RegistryKind::matches_natural_key(&spec, &remote));

        let state = RegistryKind::from_remote(&remote, Some(&spec)).state;
        assert_eq!(state.registry_url, URL);
    }

    #[test]
    fn test_cancel_before_create_makes_no_calls() {
        let fake = Arc::new(FakeKasm::new());
        let pauses = RecordedPauses::default();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = controller(&fake, &pauses)
            .create(&desired(Field::Unset), &cancel)
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(fake.calls.lock().unwrap().is_empty());
    }
}
