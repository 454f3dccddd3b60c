//! Freshness cache tests
//!
//! Fresh hits, stale fallback, error propagation, single-flight and key
//! canonicalization.

use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use weather_safety::services::cache::{cache_key, FreshnessCache};

const MINUTE: Duration = Duration::from_secs(60);

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_value_skips_fetch() {
        let cache = FreshnessCache::new(100);
        let calls = counter();

        for _ in 0..3 {
            let calls = calls.clone();
            let hit = cache
                .get_or_fetch("current:site", MINUTE, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(21.5)
                })
                .await
                .unwrap();
            assert_eq!(hit.value, 21.5);
            assert!(!hit.stale);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_value_is_refetched() {
        let cache = FreshnessCache::new(100);
        let calls = counter();

        for expected in 1..=2 {
            let calls = calls.clone();
            let result = cache
                .get_or_fetch("current:site", Duration::ZERO, || async move {
                    Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst) + 1)
                })
                .await
                .unwrap();
            assert_eq!(result.value, expected);
            assert!(!result.stale);
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_value() {
        let cache = FreshnessCache::new(100);
        cache.set("daily:site", "sunny".to_string(), Duration::ZERO).await;

        let result = cache
            .get_or_fetch("daily:site", MINUTE, || async {
                Err::<String, _>("provider timed out")
            })
            .await
            .unwrap();

        assert_eq!(result.value, "sunny");
        assert!(result.stale);
    }

    #[tokio::test]
    async fn test_failure_without_previous_value_propagates() {
        let cache: FreshnessCache<String> = FreshnessCache::new(100);

        let result = cache
            .get_or_fetch("daily:site", MINUTE, || async { Err("provider timed out") })
            .await;

        assert_eq!(assert_err!(result), "provider timed out");
    }

    #[tokio::test]
    async fn test_successful_refresh_clears_stale() {
        let cache = FreshnessCache::new(100);
        cache.set("k", 1, Duration::ZERO).await;

        let stale = assert_ok!(
            cache
                .get_or_fetch("k", MINUTE, || async { Err::<i32, _>("down") })
                .await
        );
        assert!(stale.stale);

        let fresh = cache
            .get_or_fetch("k", MINUTE, || async { Ok::<_, &str>(2) })
            .await
            .unwrap();
        assert_eq!(fresh.value, 2);
        assert!(!fresh.stale);
        assert_eq!(cache.get("k").await.unwrap().value, 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let cache: FreshnessCache<u32> = FreshnessCache::new(100);
        let calls = counter();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_fetch("hourly:site", MINUTE, || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok::<_, String>(7)
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            let result = task.await.unwrap().unwrap();
            assert_eq!(result.value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_size_is_bounded() {
        let cache = FreshnessCache::new(4);
        for i in 0..50 {
            cache.set(&format!("key-{}", i), i, MINUTE).await;
        }
        assert!(cache.entry_count().await <= 4);
    }

    #[tokio::test]
    async fn test_new_key_admitted_when_full_of_hot_keys() {
        let cache = FreshnessCache::new(4);
        for i in 0..4 {
            cache.set(&format!("hot-{}", i), i, MINUTE).await;
        }
        for _ in 0..20 {
            for i in 0..4 {
                assert!(cache.get(&format!("hot-{}", i)).await.is_some());
            }
        }
        assert_eq!(cache.entry_count().await, 4);

        cache.set("new", 99, MINUTE).await;
        let hit = cache.get("new").await.expect("freshly set key must be readable");
        assert_eq!(hit.value, 99);
        assert!(!hit.stale);
        assert!(cache.entry_count().await <= 4);
    }

    #[tokio::test]
    async fn test_cancelled_fetches_leave_no_lock_behind() {
        let cache: FreshnessCache<i32> = FreshnessCache::new(10);

        let holder = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("daily:site", MINUTE, || {
                        std::future::pending::<Result<i32, String>>()
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("daily:site", MINUTE, || async { Ok::<_, String>(1) })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.in_flight_count(), 1);

        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());
        holder.abort();
        assert!(holder.await.unwrap_err().is_cancelled());

        assert_eq!(cache.in_flight_count(), 0);
    }

    #[test]
    fn test_cache_key_is_url_safe() {
        let key = cache_key("current", [("lat", "18.7883"), ("lon", "98.9853")]);
        let (endpoint, digest) = key.split_once(':').unwrap();
        assert_eq!(endpoint, "current");
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Parameter order never changes the key
        #[test]
        fn prop_key_ignores_param_order(
            params in prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9.]{0,8}", 0..6)
        ) {
            prop_assert_eq!(
                cache_key("hourly", params.iter()),
                cache_key("hourly", params.iter().rev())
            );
        }

        /// Different endpoints never share a key
        #[test]
        fn prop_key_separates_endpoints(lat in -90.0..90.0f64, lon in -180.0..180.0f64) {
            let params = [("lat", lat), ("lon", lon)];
            prop_assert_ne!(cache_key("current", params), cache_key("daily", params));
        }
    }
}
