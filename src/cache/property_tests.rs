//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache's map semantics against a model.

use proptest::prelude::*;
use std::collections::HashSet;

use crate::cache::OrderCache;
use crate::models::Order;

// == Strategies ==
/// Generates valid order ids (non-empty, within the 100-byte bound)
fn order_uid_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,32}".prop_map(|s| s)
}

fn order_strategy() -> impl Strategy<Value = (String, i32)> {
    (order_uid_strategy(), 0..100_000i32)
}

fn order(uid: &str, amount: i32) -> Order {
    let mut order = Order {
        order_uid: uid.to_string(),
        track_number: "TRK".to_string(),
        ..Default::default()
    };
    order.payment.currency = "USD".to_string();
    order.payment.amount = amount;
    order
}

/// Runs an async block on a fresh single-threaded runtime.
fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { uid: String, amount: i32 },
    Get { uid: String },
    Delete { uid: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        order_strategy().prop_map(|(uid, amount)| CacheOp::Set { uid, amount }),
        order_uid_strategy().prop_map(|uid| CacheOp::Get { uid }),
        order_uid_strategy().prop_map(|uid| CacheOp::Delete { uid }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing an order then reading it back returns exactly that order.
    #[test]
    fn prop_roundtrip((uid, amount) in order_strategy()) {
        let cache = OrderCache::new();
        let got = block_on(async {
            cache.set(uid.clone(), order(&uid, amount)).await;
            cache.get(&uid).await
        });
        prop_assert_eq!(got, Some(order(&uid, amount)));
    }

    // After a delete, a lookup is a miss.
    #[test]
    fn prop_delete_then_miss((uid, amount) in order_strategy()) {
        let cache = OrderCache::new();
        let got = block_on(async {
            cache.set(uid.clone(), order(&uid, amount)).await;
            cache.delete(&uid).await;
            cache.get(&uid).await
        });
        prop_assert!(got.is_none());
    }

    // Len equals the number of distinct keys set minus those deleted, and hits
    // and misses account for every lookup.
    #[test]
    fn prop_len_tracks_live_keys(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache = OrderCache::new();
        let mut live: HashSet<String> = HashSet::new();
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        block_on(async {
            for op in ops {
                match op {
                    CacheOp::Set { uid, amount } => {
                        cache.set(uid.clone(), order(&uid, amount)).await;
                        live.insert(uid);
                    }
                    CacheOp::Get { uid } => {
                        if cache.get(&uid).await.is_some() {
                            expected_hits += 1;
                        } else {
                            expected_misses += 1;
                        }
                    }
                    CacheOp::Delete { uid } => {
                        cache.delete(&uid).await;
                        live.remove(&uid);
                    }
                }
            }
        });

        let stats = block_on(cache.stats());
        prop_assert_eq!(stats.total_entries, live.len());
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
    }

    // Concurrent sets of N distinct keys are all visible afterwards.
    #[test]
    fn prop_concurrent_distinct_sets(uids in prop::collection::hash_set(order_uid_strategy(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .build()
            .unwrap();
        let cache = std::sync::Arc::new(OrderCache::new());

        let missing = runtime.block_on(async {
            let handles: Vec<_> = uids
                .iter()
                .cloned()
                .map(|uid| {
                    let cache = std::sync::Arc::clone(&cache);
                    tokio::spawn(async move { cache.set(uid.clone(), order(&uid, 1)).await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap();
            }

            let mut missing = 0;
            for uid in &uids {
                if cache.get(uid).await.is_none() {
                    missing += 1;
                }
            }
            missing
        });

        prop_assert_eq!(missing, 0);
        prop_assert_eq!(runtime.block_on(cache.len()), uids.len());
    }
}
