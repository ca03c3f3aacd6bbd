//! In-flight request deduplication.
//!
//! # Responsibilities
//! - Collapse concurrent requests with equal signatures into one fetch
//! - Hand every waiter the same outcome, success or error
//! - Forget the fetch as soon as it settles
//!
//! # Design Decisions
//! - The fetch runs in its own task, so it settles even if every waiter
//!   is cancelled
//! - Registration is removed by a drop guard owned by that task, covering
//!   success, failure and panic alike
//! - Check-and-register happens under one map entry lock with no await inside

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;

use crate::observability::metrics;
use crate::upstream::{FetchError, FetchResult, Payload};

type SharedFetch = Shared<BoxFuture<'static, FetchResult<Payload>>>;

/// Map of signature → in-flight fetch, owned by one client.
#[derive(Clone, Default)]
pub struct Deduplicator {
    pending: Arc<DashMap<String, SharedFetch>>,
}

impl fmt::Debug for Deduplicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deduplicator")
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Removes the registration when the owning fetch task ends.
struct PendingGuard {
    pending: Arc<DashMap<String, SharedFetch>>,
    signature: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.remove(&self.signature);
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches currently in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Run `producer` unless a fetch with the same `signature` is already in
    /// flight, in which case wait for that one instead.
    ///
    /// `producer` must not touch this deduplicator synchronously: it is called
    /// while the signature's map entry is locked.
    pub async fn dedupe<F, Fut>(&self, signature: &str, producer: F) -> FetchResult<Payload>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<Payload>> + Send + 'static,
    {
        let shared = match self.pending.entry(signature.to_string()) {
            Entry::Occupied(entry) => {
                metrics::record_dedup_join();
                tracing::debug!(signature = %signature, "Joining in-flight request");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let guard = PendingGuard {
                    pending: Arc::clone(&self.pending),
                    signature: signature.to_string(),
                };
                let fetch = producer();
                let task = tokio::spawn(async move {
                    let _guard = guard;
                    fetch.await
                });

                let shared = task
                    .map(|joined| {
                        joined.unwrap_or_else(|e| Err(FetchError::Interrupted(e.to_string())))
                    })
                    .boxed()
                    .shared();
                entry.insert(shared.clone());
                shared
            }
        };

        shared.await
    }
}
