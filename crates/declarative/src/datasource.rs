//! Read-only lookups
//!
//! A data source resolves a query to a remote object without managing its
//! lifecycle. There is no local state to drop, so a missing object is an
//! error.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cancel::CancelToken;
use crate::error::{ClassifiedError, Error, Result};
use crate::types::Operation;

/// One type of read-only lookup.
pub trait LookupKind: Send + Sync + 'static {
    const NAME: &'static str;

    type Query: DeserializeOwned + fmt::Debug + Send + Sync;

    type Remote: fmt::Debug + Send + Sync;

    type State: Serialize;

    /// Identifier used in messages
    fn describe(query: &Self::Query) -> String;

    fn from_remote(remote: &Self::Remote) -> Self::State;
}

pub trait LookupApi<K: LookupKind>: Send + Sync {
    fn lookup(&self, query: &K::Query) -> std::result::Result<K::Remote, ClassifiedError>;
}

/// Object-safe view of a data source, with JSON query and result.
pub trait DataSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn lookup(&self, query: &serde_json::Value, cancel: &CancelToken)
    -> Result<serde_json::Value>;
}

/// Data source backed by a [`LookupApi`].
pub struct Lookup<K: LookupKind, C> {
    client: C,
    _kind: PhantomData<fn() -> K>,
}

impl<K: LookupKind, C: LookupApi<K>> Lookup<K, C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    /// Resolve a typed query.
    pub fn fetch(&self, query: &K::Query, cancel: &CancelToken) -> Result<K::State> {
        let identifier = K::describe(query);
        if cancel.is_cancelled() {
            return Err(Error::Cancelled {
                operation: Operation::Lookup,
                object_kind: K::NAME,
                identifier,
            });
        }

        log::debug!("Looking up {} {:?}", K::NAME, identifier);
        let remote = self
            .client
            .lookup(query)
            .map_err(|e| Error::remote(Operation::Lookup, K::NAME, identifier, e))?;
        Ok(K::from_remote(&remote))
    }
}

impl<K: LookupKind, C: LookupApi<K>> DataSource for Lookup<K, C> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn lookup(
        &self,
        query: &serde_json::Value,
        cancel: &CancelToken,
    ) -> Result<serde_json::Value> {
        let invalid = |source| Error::InvalidState {
            object_kind: K::NAME,
            identifier: query.to_string(),
            source,
        };
        let query: K::Query = serde_json::from_value(query.clone()).map_err(invalid)?;
        let state = self.fetch(&query, cancel)?;
        serde_json::to_value(state).map_err(invalid)
    }
}
