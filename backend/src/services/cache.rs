//! Freshness cache for upstream weather data
//!
//! Entries are kept past their TTL so that an expired value can still be
//! served, marked stale, when the provider is down. Size is bounded by moka
//! with LRU eviction, so a new key is always admitted; freshness is tracked
//! here.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Stable key for an endpoint and its parameters.
///
/// Parameters are sorted by name before hashing, so their order does not
/// matter.
pub fn cache_key<K, V, I>(endpoint: &str, params: I) -> String
where
    K: AsRef<str>,
    V: Display,
    I: IntoIterator<Item = (K, V)>,
{
    let canonical: BTreeMap<String, String> = params
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.to_string()))
        .collect();
    let query = canonical
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let digest = Sha256::digest(format!("{}?{}", endpoint, query).as_bytes());
    format!("{}:{}", endpoint, URL_SAFE_NO_PAD.encode(digest))
}

/// A value read from the cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cached<V> {
    pub value: V,
    /// Past its freshness window; served because a refresh failed
    pub stale: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
    fetched_at: DateTime<Utc>,
}

impl<V> Entry<V> {
    fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

/// A caller's claim on the per-key fetch lock.
///
/// Dropping it, on completion or cancellation, removes the map entry once no
/// other caller holds the lock.
struct InFlight<'a> {
    map: &'a DashMap<String, Arc<Mutex<()>>>,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> InFlight<'a> {
    fn claim(map: &'a DashMap<String, Arc<Mutex<()>>>, key: &'a str) -> Self {
        let lock = map.entry(key.to_string()).or_default().clone();
        Self { map, key, lock }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        // Two owners left means only the map and this claim hold the lock
        self.map
            .remove_if(self.key, |_, held| Arc::strong_count(held) <= 2);
    }
}

/// TTL-aware cache with stale fallback and per-key single-flight
#[derive(Clone)]
pub struct FreshnessCache<V> {
    entries: Cache<String, Entry<V>>,
    in_flight: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl<V> FreshnessCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache holding at most `max_entries` keys
    pub fn new(max_entries: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Fresh value for a key, if any
    pub async fn get(&self, key: &str) -> Option<Cached<V>> {
        self.entries
            .get(key)
            .await
            .filter(Entry::is_fresh)
            .map(|entry| Cached {
                value: entry.value,
                stale: false,
                fetched_at: entry.fetched_at,
            })
    }

    pub async fn set(&self, key: &str, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            stored_at: Instant::now(),
            ttl,
            fetched_at: Utc::now(),
        };
        self.entries.insert(key.to_string(), entry).await;
    }

    /// Return the fresh value for `key`, or fetch and store a new one.
    ///
    /// Concurrent misses on the same key share one fetch. When the fetch
    /// fails the last stored value is returned with `stale` set; with no
    /// stored value the fetch error is returned.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<Cached<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        if let Some(hit) = self.get(key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let slot = InFlight::claim(&self.in_flight, key);
        let _guard = slot.lock.lock().await;

        // Filled by whoever held the lock before us
        if let Some(hit) = self.get(key).await {
            tracing::debug!("Cache filled while waiting for {}", key);
            return Ok(hit);
        }
        self.refresh(key, ttl, fetch).await
    }

    /// Number of keys with a fetch in progress or waiters queued
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    async fn refresh<F, Fut, E>(&self, key: &str, ttl: Duration, fetch: F) -> Result<Cached<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        match fetch().await {
            Ok(value) => {
                self.set(key, value.clone(), ttl).await;
                Ok(Cached {
                    value,
                    stale: false,
                    fetched_at: Utc::now(),
                })
            }
            Err(err) => match self.entries.get(key).await {
                Some(entry) => {
                    tracing::warn!("Serving stale data for {}: {}", key, err);
                    Ok(Cached {
                        value: entry.value,
                        stale: true,
                        fetched_at: entry.fetched_at,
                    })
                }
                None => Err(err),
            },
        }
    }

    /// Number of stored keys, fresh or expired
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}
