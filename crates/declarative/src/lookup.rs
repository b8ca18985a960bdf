//! Bounded natural-key lookup for asynchronous creates.
//!
//! Some APIs acknowledge a create without returning the object, and the
//! object is not guaranteed to be queryable right away. The controller then
//! lists the collection and searches for the object by its natural key, a
//! fixed number of times with a fixed pause in between.
//!
//! The first matching object wins. Natural keys are assumed unique among
//! list results; duplicates are not detected.

use std::time::Duration;

use crate::cancel::{CancelToken, Sleeper};
use crate::error::{Error, Result};
use crate::resource::{ObjectKind, RemoteApi};
use crate::types::Operation;

/// Attempts and pause for the natural-key lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupPolicy {
    /// Number of list calls before giving up
    pub attempts: u32,
    /// Pause between list calls
    pub delay: Duration,
}

impl Default for LookupPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            delay: Duration::from_secs(5),
        }
    }
}

impl LookupPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// Search the collection for the object matching `spec`'s natural key.
///
/// Transient list failures count as a missed attempt; any other failure
/// aborts the search. Cancellation is checked before every attempt and
/// before every pause.
pub fn find_by_natural_key<K, C>(
    client: &C,
    spec: &K::Spec,
    policy: &LookupPolicy,
    sleeper: &dyn Sleeper,
    cancel: &CancelToken,
) -> Result<K::Remote>
where
    K: ObjectKind,
    C: RemoteApi<K> + ?Sized,
{
    let natural_key = K::natural_key(spec);
    let cancelled = || Error::Cancelled {
        operation: Operation::Create,
        object_kind: K::NAME,
        identifier: natural_key.clone(),
    };

    for attempt in 1..=policy.attempts {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        match client.list() {
            Ok(objects) => {
                if let Some(found) = objects
                    .into_iter()
                    .find(|remote| K::matches_natural_key(spec, remote))
                {
                    log::debug!(
                        "Found {} {:?} on lookup attempt {}/{}",
                        K::NAME,
                        natural_key,
                        attempt,
                        policy.attempts
                    );
                    return Ok(found);
                }
                log::debug!(
                    "{} {:?} not listed yet (attempt {}/{})",
                    K::NAME,
                    natural_key,
                    attempt,
                    policy.attempts
                );
            }
            Err(e) if e.kind.is_retryable() => {
                log::warn!(
                    "Listing {} failed on attempt {}/{}: {}",
                    K::NAME,
                    attempt,
                    policy.attempts,
                    e
                );
            }
            Err(e) => {
                return Err(Error::remote(
                    Operation::Create,
                    K::NAME,
                    natural_key.clone(),
                    e,
                ));
            }
        }

        if attempt < policy.attempts
            && (cancel.is_cancelled() || !sleeper.sleep(policy.delay, cancel))
        {
            return Err(cancelled());
        }
    }

    Err(Error::LookupExhausted {
        object_kind: K::NAME,
        natural_key,
        attempts: policy.attempts,
    })
}
