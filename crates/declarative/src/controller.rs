//! Convergence Controller
//!
//! Drives Create, Read, Update, Delete, and Import for one object kind
//! against an injected [`RemoteApi`]. A controller holds no mutable state;
//! every call works on its own values and returns the state to persist.
//! Nothing is returned (and so nothing is persisted) until the whole
//! operation, including any lookup retries, has finished.

use std::marker::PhantomData;

use crate::cancel::{CancelToken, Sleeper, ThreadSleeper};
use crate::error::{ClassifiedError, Error, ErrorKind, Result};
use crate::lookup::{self, LookupPolicy};
use crate::resource::{CreateResponse, DeleteSupport, Fetch, ObjectKind, RemoteApi};
use crate::types::{
    Applied, DeleteOutcome, LifecycleState, Normalized, Operation, ReadOutcome, Warning,
};

/// Controller for one object kind.
pub struct Controller<K: ObjectKind, C> {
    client: C,
    lookup: LookupPolicy,
    sleeper: Box<dyn Sleeper>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ObjectKind, C: RemoteApi<K>> Controller<K, C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            lookup: LookupPolicy::default(),
            sleeper: Box::new(ThreadSleeper),
            _kind: PhantomData,
        }
    }

    /// Override attempts and pause of the asynchronous-create lookup
    pub fn with_lookup_policy(mut self, policy: LookupPolicy) -> Self {
        self.lookup = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Create the object and return its normalized state.
    ///
    /// When the API only acknowledges the request, the collection is
    /// searched by natural key under the lookup policy.
    pub fn create(&self, desired: &K::Spec, cancel: &CancelToken) -> Result<Applied<K::Spec>> {
        let key = K::natural_key(desired);
        checkpoint::<K>(Operation::Create, &key, cancel)?;
        transition::<K>(&key, LifecycleState::Absent, LifecycleState::Creating);

        let payload = K::create_payload(desired);
        log::trace!("{} create payload: {:?}", K::NAME, payload);

        let remote = match self
            .client
            .create(&payload)
            .map_err(|e| Error::remote(Operation::Create, K::NAME, key.clone(), e))?
        {
            CreateResponse::Object(remote) => remote,
            CreateResponse::Accepted => {
                log::debug!(
                    "{} {:?} accepted without a body, looking it up by natural key",
                    K::NAME,
                    key
                );
                lookup::find_by_natural_key::<K, C>(
                    &self.client,
                    desired,
                    &self.lookup,
                    self.sleeper.as_ref(),
                    cancel,
                )?
            }
        };

        let id = K::remote_id(&remote);
        let applied = normalize::<K>(id, &remote, Some(desired));
        transition::<K>(&applied.id, LifecycleState::Creating, LifecycleState::Present);
        Ok(applied)
    }

    /// Refresh the object. A missing object is not an error: the outcome
    /// tells the caller to drop local state.
    pub fn read(
        &self,
        id: &str,
        prior: Option<&K::Spec>,
        cancel: &CancelToken,
    ) -> Result<ReadOutcome<K::Spec>> {
        checkpoint::<K>(Operation::Read, id, cancel)?;

        match self.fetch(id) {
            Ok(remote) => Ok(ReadOutcome::Present(normalize::<K>(
                id.to_string(),
                &remote,
                prior,
            ))),
            Err(e) if e.kind == ErrorKind::NotFound => {
                log::info!("{} {:?} no longer exists, dropping it from state", K::NAME, id);
                transition::<K>(id, LifecycleState::Present, LifecycleState::Absent);
                Ok(ReadOutcome::Gone)
            }
            Err(e) => Err(Error::remote(Operation::Read, K::NAME, id, e)),
        }
    }

    /// Replace the object with the full desired state.
    pub fn update(
        &self,
        id: &str,
        desired: &K::Spec,
        cancel: &CancelToken,
    ) -> Result<Applied<K::Spec>> {
        checkpoint::<K>(Operation::Update, id, cancel)?;
        transition::<K>(id, LifecycleState::Present, LifecycleState::Updating);

        let payload = K::update_payload(desired);
        log::trace!("{} update payload: {:?}", K::NAME, payload);

        let remote = self
            .client
            .update(id, &payload)
            .map_err(|e| Error::remote(Operation::Update, K::NAME, id, e))?;

        let applied = normalize::<K>(id.to_string(), &remote, Some(desired));
        transition::<K>(id, LifecycleState::Updating, LifecycleState::Present);
        Ok(applied)
    }

    /// Delete the object.
    ///
    /// An object that is already gone is reported with a warning, not an
    /// error. Kinds without API deletion keep their state and warn.
    pub fn delete(&self, id: &str, cancel: &CancelToken) -> Result<DeleteOutcome> {
        checkpoint::<K>(Operation::Delete, id, cancel)?;

        if let DeleteSupport::OutOfBand { guidance } = K::DELETE {
            let warning = Warning {
                summary: format!("{} {id} was not deleted", K::NAME),
                detail: guidance.to_string(),
            };
            log::warn!("{warning}");
            return Ok(DeleteOutcome::Retained(warning));
        }

        transition::<K>(id, LifecycleState::Present, LifecycleState::Deleting);
        match self.client.delete(id) {
            Ok(()) => {
                transition::<K>(id, LifecycleState::Deleting, LifecycleState::Absent);
                Ok(DeleteOutcome::Removed)
            }
            Err(e) if e.kind == ErrorKind::NotFound => {
                let warning = Warning {
                    summary: format!("{} {id} was already deleted", K::NAME),
                    detail: e.message,
                };
                log::warn!("{warning}");
                Ok(DeleteOutcome::AlreadyAbsent(warning))
            }
            Err(e) => Err(Error::remote(Operation::Delete, K::NAME, id, e)),
        }
    }

    /// Adopt an existing object by id. Unlike Read, a missing object is
    /// an error here.
    pub fn import(&self, id: &str, cancel: &CancelToken) -> Result<Applied<K::Spec>> {
        checkpoint::<K>(Operation::Import, id, cancel)?;

        let remote = self
            .fetch(id)
            .map_err(|e| Error::remote(Operation::Import, K::NAME, id, e))?;
        let applied = normalize::<K>(id.to_string(), &remote, None);
        transition::<K>(id, LifecycleState::Absent, LifecycleState::Present);
        Ok(applied)
    }

    fn fetch(&self, id: &str) -> std::result::Result<K::Remote, ClassifiedError> {
        match K::FETCH {
            Fetch::ById => self.client.get(id),
            Fetch::ListScan => self
                .client
                .list()?
                .into_iter()
                .find(|remote| K::remote_id(remote) == id)
                .ok_or_else(|| ClassifiedError::not_found(format!("no {} with id {id}", K::NAME))),
        }
    }
}

fn checkpoint<K: ObjectKind>(operation: Operation, identifier: &str, cancel: &CancelToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled {
            operation,
            object_kind: K::NAME,
            identifier: identifier.to_string(),
        });
    }
    Ok(())
}

fn transition<K: ObjectKind>(identifier: &str, from: LifecycleState, to: LifecycleState) {
    log::debug!("{} {:?}: {} -> {}", K::NAME, identifier, from, to);
}

fn normalize<K: ObjectKind>(
    id: String,
    remote: &K::Remote,
    prior: Option<&K::Spec>,
) -> Applied<K::Spec> {
    let Normalized {
        state,
        discrepancies,
    } = K::from_remote(remote, prior);

    for discrepancy in &discrepancies {
        log::warn!("{} {}: {}", K::NAME, id, discrepancy);
    }

    Applied {
        id,
        state,
        discrepancies,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::field::Field;
    use crate::types::Discrepancy;
    use serde::{Deserialize, Serialize};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    pub struct WidgetSpec {
        pub name: String,
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        pub size: Field<i64>,
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        pub tags: Field<Vec<String>>,
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        pub channel: Field<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub widget_id: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Widget {
        pub id: String,
        pub name: String,
        pub size: i64,
        pub tags: Vec<String>,
        pub channel: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct WidgetPayload {
        pub name: String,
        pub size: Option<i64>,
        pub tags: Option<Vec<String>>,
        pub channel: Option<String>,
    }

    pub struct WidgetKind;

    impl ObjectKind for WidgetKind {
        const NAME: &'static str = "widget";
        const COMPUTED: &'static [&'static str] = &["widget_id"];
        type Spec = WidgetSpec;
        type Remote = Widget;
        type Payload = WidgetPayload;

        fn create_payload(spec: &WidgetSpec) -> WidgetPayload {
            WidgetPayload {
                name: spec.name.clone(),
                size: spec.size.to_payload(),
                tags: spec.tags.to_payload(),
                channel: spec.channel.to_payload(),
            }
        }

        fn from_remote(remote: &Widget, prior: Option<&WidgetSpec>) -> Normalized<WidgetSpec> {
            let mut discrepancies = Vec::new();
            let state = WidgetSpec {
                name: remote.name.clone(),
                size: Field::from_remote(&remote.size, &0, prior.map(|p| &p.size)),
                tags: Field::list_from_remote(&remote.tags, prior.map(|p| &p.tags)),
                channel: Field::retain_declared(
                    "channel",
                    &remote.channel,
                    &String::new(),
                    prior.map(|p| &p.channel),
                    &mut discrepancies,
                ),
                widget_id: Some(remote.id.clone()),
            };
            Normalized {
                state,
                discrepancies,
            }
        }

        fn remote_id(remote: &Widget) -> String {
            remote.id.clone()
        }

        fn natural_key(spec: &WidgetSpec) -> String {
            spec.name.clone()
        }

        fn matches_natural_key(spec: &WidgetSpec, remote: &Widget) -> bool {
            spec.name == remote.name
        }
    }

    /// Echoes payloads back as stored objects, with switchable failures.
    #[derive(Default)]
    pub struct FakeWidgets {
        pub objects: Mutex<Vec<Widget>>,
        pub accept_only: bool,
        /// Number of list calls that still miss a freshly created object
        pub hidden_for_lists: u32,
        pub normalize_channel: bool,
        pub get_error: Option<ClassifiedError>,
        pub delete_error: Option<ClassifiedError>,
        /// Failures returned by the next list calls, in order
        pub list_errors: Mutex<VecDeque<ClassifiedError>>,
        pub list_calls: AtomicU32,
        pub delete_calls: AtomicU32,
        pub next_id: AtomicU32,
    }

    impl FakeWidgets {
        fn realize(&self, id: String, payload: &WidgetPayload) -> Widget {
            let mut channel = payload.channel.clone().unwrap_or_default();
            if self.normalize_channel {
                channel = channel.rsplitn(2, '.').last().unwrap_or_default().to_string();
            }
            Widget {
                id,
                name: payload.name.clone(),
                size: payload.size.unwrap_or_default(),
                tags: payload.tags.clone().unwrap_or_default(),
                channel,
            }
        }
    }

    impl RemoteApi<WidgetKind> for FakeWidgets {
        fn create(
            &self,
            payload: &WidgetPayload,
        ) -> std::result::Result<CreateResponse<Widget>, ClassifiedError> {
            let id = format!("w-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            let widget = self.realize(id, payload);
            self.objects.lock().unwrap().push(widget.clone());
            if self.accept_only {
                Ok(CreateResponse::Accepted)
            } else {
                Ok(CreateResponse::Object(widget))
            }
        }

        fn get(&self, id: &str) -> std::result::Result<Widget, ClassifiedError> {
            if let Some(e) = &self.get_error {
                return Err(e.clone());
            }
            self.objects
                .lock()
                .unwrap()
                .iter()
                .find(|w| w.id == id)
                .cloned()
                .ok_or_else(|| ClassifiedError::not_found(id))
        }

        fn list(&self) -> std::result::Result<Vec<Widget>, ClassifiedError> {
            let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(e) = self.list_errors.lock().unwrap().pop_front() {
                return Err(e);
            }
            if call <= self.hidden_for_lists {
                return Ok(Vec::new());
            }
            Ok(self.objects.lock().unwrap().clone())
        }

        fn update(
            &self,
            id: &str,
            payload: &WidgetPayload,
        ) -> std::result::Result<Widget, ClassifiedError> {
            let widget = self.realize(id.to_string(), payload);
            let mut objects = self.objects.lock().unwrap();
            let slot = objects
                .iter_mut()
                .find(|w| w.id == id)
                .ok_or_else(|| ClassifiedError::not_found(id))?;
            *slot = widget.clone();
            Ok(widget)
        }

        fn delete(&self, id: &str) -> std::result::Result<(), ClassifiedError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = &self.delete_error {
                return Err(e.clone());
            }
            self.objects.lock().unwrap().retain(|w| w.id != id);
            Ok(())
        }
    }

    /// Records requested pauses instead of sleeping.
    #[derive(Default)]
    pub struct RecordingSleeper {
        pub pauses: std::sync::Arc<Mutex<Vec<Duration>>>,
        pub cancel_on_sleep: bool,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration, cancel: &CancelToken) -> bool {
            self.pauses.lock().unwrap().push(duration);
            if self.cancel_on_sleep {
                cancel.cancel();
            }
            !cancel.is_cancelled()
        }
    }

    fn spec(name: &str) -> WidgetSpec {
        WidgetSpec {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_round_trip_explicit_fields() {
        let fake = FakeWidgets::default();
        let controller = Controller::<WidgetKind, _>::new(&fake);
        let desired = WidgetSpec {
            name: "w".to_string(),
            size: Field::Explicit(0),
            tags: Field::Explicit(vec!["a".to_string(), "b".to_string()]),
            channel: Field::Explicit("stable".to_string()),
            widget_id: None,
        };

        let applied = controller.create(&desired, &CancelToken::new()).unwrap();

        assert_eq!(applied.state.size, Field::Explicit(0));
        assert_eq!(applied.state.tags, desired.tags);
        assert_eq!(applied.state.channel, desired.channel);
        assert_eq!(applied.state.widget_id.as_deref(), Some(applied.id.as_str()));
        assert!(applied.discrepancies.is_empty());
    }

    #[test]
    fn test_unset_stays_unset_after_create_and_read() {
        let fake = FakeWidgets::default();
        let controller = Controller::<WidgetKind, _>::new(&fake);
        let cancel = CancelToken::new();

        let created = controller.create(&spec("w"), &cancel).unwrap();
        assert_eq!(created.state.size, Field::Unset);
        assert_eq!(created.state.tags, Field::Unset);

        let ReadOutcome::Present(read) = controller
            .read(&created.id, Some(&created.state), &cancel)
            .unwrap()
        else {
            panic!("object should exist");
        };
        assert_eq!(read.state, created.state);
    }

    #[test]
    fn test_update_twice_is_idempotent() {
        let fake = FakeWidgets::default();
        let controller = Controller::<WidgetKind, _>::new(&fake);
        let cancel = CancelToken::new();
        let created = controller.create(&spec("w"), &cancel).unwrap();

        let mut desired = created.state.clone();
        desired.size = Field::Explicit(3);
        let first = controller.update(&created.id, &desired, &cancel).unwrap();
        let second = controller.update(&created.id, &first.state, &cancel).unwrap();

        assert_eq!(first.state, second.state);
        assert_eq!(second.id, created.id);
    }

    #[test]
    fn test_read_not_found_drops_state() {
        let fake = FakeWidgets {
            get_error: Some(ClassifiedError::not_found("gone")),
            ..Default::default()
        };
        let controller = Controller::<WidgetKind, _>::new(&fake);

        let outcome = controller.read("w-9", None, &CancelToken::new()).unwrap();
        assert!(outcome.is_gone());
    }

    #[test]
    fn test_read_other_error_is_surfaced() {
        let fake = FakeWidgets {
            get_error: Some(ClassifiedError::unknown("boom")),
            ..Default::default()
        };
        let controller = Controller::<WidgetKind, _>::new(&fake);

        let err = controller.read("w-9", None, &CancelToken::new()).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unknown));
        assert!(err.to_string().contains("w-9"));
    }

    #[test]
    fn test_async_create_found_on_second_attempt() {
        let fake = FakeWidgets {
            accept_only: true,
            hidden_for_lists: 1,
            ..Default::default()
        };
        let sleeper = RecordingSleeper::default();
        let pauses = sleeper.pauses.clone();
        let controller = Controller::<WidgetKind, _>::new(&fake).with_sleeper(sleeper);

        let applied = controller.create(&spec("w"), &CancelToken::new()).unwrap();

        assert_eq!(applied.id, "w-0");
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(*pauses.lock().unwrap(), vec![Duration::from_secs(5)]);
    }

    #[test]
    fn test_async_create_exhausts_after_two_attempts() {
        let fake = FakeWidgets {
            accept_only: true,
            hidden_for_lists: u32::MAX,
            ..Default::default()
        };
        let controller =
            Controller::<WidgetKind, _>::new(&fake).with_sleeper(RecordingSleeper::default());

        let err = controller.create(&spec("w"), &CancelToken::new()).unwrap_err();

        assert!(matches!(err, Error::LookupExhausted { attempts: 2, .. }));
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_async_create_retries_transient_list_error() {
        let fake = FakeWidgets {
            accept_only: true,
            list_errors: Mutex::new(VecDeque::from([ClassifiedError::transient("HTTP 503")])),
            ..Default::default()
        };
        let sleeper = RecordingSleeper::default();
        let pauses = sleeper.pauses.clone();
        let controller = Controller::<WidgetKind, _>::new(&fake).with_sleeper(sleeper);

        let applied = controller.create(&spec("w"), &CancelToken::new()).unwrap();

        assert_eq!(applied.id, "w-0");
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(pauses.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_async_create_aborts_on_unauthorized_list() {
        let fake = FakeWidgets {
            accept_only: true,
            list_errors: Mutex::new(VecDeque::from([ClassifiedError::unauthorized("HTTP 403")])),
            ..Default::default()
        };
        let sleeper = RecordingSleeper::default();
        let pauses = sleeper.pauses.clone();
        let controller = Controller::<WidgetKind, _>::new(&fake).with_sleeper(sleeper);

        let err = controller.create(&spec("w"), &CancelToken::new()).unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 1);
        assert!(pauses.lock().unwrap().is_empty());
    }

    #[test]
    fn test_async_create_aborts_on_unknown_list_error() {
        let fake = FakeWidgets {
            accept_only: true,
            list_errors: Mutex::new(VecDeque::from([ClassifiedError::unknown("bad JSON")])),
            ..Default::default()
        };
        let sleeper = RecordingSleeper::default();
        let pauses = sleeper.pauses.clone();
        let controller = Controller::<WidgetKind, _>::new(&fake).with_sleeper(sleeper);

        let err = controller.create(&spec("w"), &CancelToken::new()).unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::Unknown));
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 1);
        assert!(pauses.lock().unwrap().is_empty());
    }

    #[test]
    fn test_async_create_cancelled_during_pause() {
        let fake = FakeWidgets {
            accept_only: true,
            hidden_for_lists: u32::MAX,
            ..Default::default()
        };
        let sleeper = RecordingSleeper {
            cancel_on_sleep: true,
            ..Default::default()
        };
        let controller = Controller::<WidgetKind, _>::new(&fake).with_sleeper(sleeper);

        let err = controller.create(&spec("w"), &CancelToken::new()).unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancelled_before_start_makes_no_calls() {
        let fake = FakeWidgets::default();
        let controller = Controller::<WidgetKind, _>::new(&fake);
        let cancel = CancelToken::new();
        cancel.cancel();

        assert!(controller.create(&spec("w"), &cancel).unwrap_err().is_cancelled());
        assert!(controller.delete("w-0", &cancel).unwrap_err().is_cancelled());
        assert!(fake.objects.lock().unwrap().is_empty());
        assert_eq!(fake.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_delete_not_found_is_warning() {
        let fake = FakeWidgets {
            delete_error: Some(ClassifiedError::not_found("no such widget")),
            ..Default::default()
        };
        let controller = Controller::<WidgetKind, _>::new(&fake);

        let outcome = controller.delete("w-1", &CancelToken::new()).unwrap();

        assert!(matches!(outcome, DeleteOutcome::AlreadyAbsent(_)));
        assert!(outcome.drops_state());
        assert!(outcome.warning().is_some());
    }

    #[test]
    fn test_delete_unauthorized_is_fatal() {
        let fake = FakeWidgets {
            delete_error: Some(ClassifiedError::unauthorized("HTTP 401")),
            ..Default::default()
        };
        let controller = Controller::<WidgetKind, _>::new(&fake);

        let err = controller.delete("w-1", &CancelToken::new()).unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_delete_removes_object() {
        let fake = FakeWidgets::default();
        let controller = Controller::<WidgetKind, _>::new(&fake);
        let cancel = CancelToken::new();
        let created = controller.create(&spec("w"), &cancel).unwrap();

        let outcome = controller.delete(&created.id, &cancel).unwrap();

        assert_eq!(outcome, DeleteOutcome::Removed);
        assert!(fake.objects.lock().unwrap().is_empty());
    }

    #[test]
    fn test_import_missing_is_error() {
        let fake = FakeWidgets::default();
        let controller = Controller::<WidgetKind, _>::new(&fake);

        let err = controller.import("w-404", &CancelToken::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_immutable_field_keeps_declared_value() {
        let fake = FakeWidgets {
            normalize_channel: true,
            ..Default::default()
        };
        let controller = Controller::<WidgetKind, _>::new(&fake);
        let desired = WidgetSpec {
            channel: Field::Explicit("1.16.0".to_string()),
            ..spec("w")
        };

        let applied = controller.create(&desired, &CancelToken::new()).unwrap();

        assert_eq!(applied.state.channel, Field::Explicit("1.16.0".to_string()));
        assert_eq!(
            applied.discrepancies,
            vec![Discrepancy {
                field: "channel",
                declared: "1.16.0".to_string(),
                remote: "1.16".to_string(),
            }]
        );
    }
}
