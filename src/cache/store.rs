//! TTL cache with stale-while-revalidate.
//!
//! # Lookup Rules
//! ```text
//! ttl == 0                     → call producer, never read or store (BYPASS)
//! elapsed <= ttl               → cached value (HIT)
//! ttl < elapsed <= ttl + swr   → cached value now, refresh in background (STALE)
//! no entry / elapsed > ttl+swr → evict, await producer, store (MISS)
//! ```
//!
//! # Design Decisions
//! - Eviction is lazy: only the lookup that finds an expired entry removes it
//! - A failed background refresh keeps the stale entry and is only logged
//! - Each entry remembers the policy it was stored with

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::upstream::{FetchResult, Payload};

/// Freshness window for one route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub stale_while_revalidate: Duration,
}

impl CachePolicy {
    /// Never served from cache.
    pub const NO_STORE: CachePolicy = CachePolicy {
        ttl: Duration::ZERO,
        stale_while_revalidate: Duration::ZERO,
    };

    pub fn new(ttl: Duration, stale_while_revalidate: Duration) -> Self {
        Self {
            ttl,
            stale_while_revalidate,
        }
    }

    pub fn from_secs(ttl: u64, stale_while_revalidate: u64) -> Self {
        Self::new(
            Duration::from_secs(ttl),
            Duration::from_secs(stale_while_revalidate),
        )
    }

    pub fn is_no_store(&self) -> bool {
        self.ttl.is_zero()
    }
}

/// How a value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    /// Fresh cached value.
    Hit,
    /// Stale cached value; a background refresh was started.
    Stale,
    /// Fetched synchronously and stored.
    Miss,
    /// Caching disabled for this policy; fetched and not stored.
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Stale => "STALE",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

/// A value together with where it came from.
#[derive(Debug, Clone)]
pub struct Cached {
    pub value: Payload,
    pub status: CacheStatus,
}

impl Cached {
    pub fn is_stale(&self) -> bool {
        self.status == CacheStatus::Stale
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Payload,
    stored_at: Instant,
    ttl: Duration,
    stale_while_revalidate: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    Fresh,
    Stale,
    Expired,
}

impl CacheEntry {
    fn freshness(&self, now: Instant) -> Freshness {
        let elapsed = now.saturating_duration_since(self.stored_at);
        if elapsed <= self.ttl {
            Freshness::Fresh
        } else if elapsed <= self.ttl + self.stale_while_revalidate {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

/// In-memory response cache owned by one client.
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value for `key`, calling `producer` when the cache cannot serve it.
    ///
    /// `producer` runs at most once per call, either inline (miss, bypass) or in a
    /// spawned task (stale). Errors are returned only when no usable entry exists.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        policy: CachePolicy,
        producer: F,
    ) -> FetchResult<Cached>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<Payload>> + Send + 'static,
    {
        if policy.is_no_store() {
            metrics::record_cache_lookup("bypass");
            let value = producer().await?;
            return Ok(Cached {
                value,
                status: CacheStatus::Bypass,
            });
        }

        let now = Instant::now();
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.freshness(now)));

        match lookup {
            Some((value, Freshness::Fresh)) => {
                metrics::record_cache_lookup("hit");
                return Ok(Cached {
                    value,
                    status: CacheStatus::Hit,
                });
            }
            Some((value, Freshness::Stale)) => {
                metrics::record_cache_lookup("stale");
                self.spawn_revalidation(key.to_string(), policy, producer);
                return Ok(Cached {
                    value,
                    status: CacheStatus::Stale,
                });
            }
            Some((_, Freshness::Expired)) => self.evict_expired(key, now),
            None => {}
        }

        metrics::record_cache_lookup("miss");
        let value = producer().await?;
        self.store(key, value.clone(), policy);
        Ok(Cached {
            value,
            status: CacheStatus::Miss,
        })
    }

    fn spawn_revalidation<F, Fut>(&self, key: String, policy: CachePolicy, producer: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<Payload>> + Send + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move {
            match producer().await {
                Ok(value) => {
                    cache.store(&key, value, policy);
                    metrics::record_revalidation("ok");
                    tracing::debug!(key = %key, "Revalidated stale cache entry");
                }
                Err(e) => {
                    metrics::record_revalidation("error");
                    tracing::warn!(key = %key, error = %e, "Background revalidation failed, keeping stale entry");
                }
            }
        });
    }

    fn evict_expired(&self, key: &str, now: Instant) {
        // A concurrent refresh may have replaced it since the lookup.
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.freshness(now) == Freshness::Expired);
        if removed.is_some() {
            metrics::record_cache_size(self.entries.len());
            tracing::debug!(key = %key, "Evicted expired cache entry");
        }
    }

    fn store(&self, key: &str, value: Payload, policy: CachePolicy) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl: policy.ttl,
                stale_while_revalidate: policy.stale_while_revalidate,
            },
        );
        metrics::record_cache_size(self.entries.len());
    }

    /// Current value for `key` regardless of freshness, without side effects.
    pub fn peek(&self, key: &str) -> Option<Payload> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
        metrics::record_cache_size(0);
    }
}
