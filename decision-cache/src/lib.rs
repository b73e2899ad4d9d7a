//! Memoization of aggregated access decisions.
//!
//! Two layers wrap the aggregator:
//!
//! - [`RequestCache`] is scoped to one logical request. It guarantees at most
//!   one computation per `(principal, kind, id)` even when threads of the
//!   same request race on the first access.
//! - [`SharedCache`] lives across requests. Entries are stamped with the
//!   generation counter of every principal the result depends on (the
//!   queried principal, its sibling roles, its ancestors); invalidating a
//!   role is a single counter bump that implicitly stales every dependent
//!   user's entries, with no invalidation fan-out.
//!
//! Readers never block past a single entry update; invalidation is a
//! last-writer-wins counter store.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use options::ResolvedMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

type ObjectKey = (String, String, String);

/// Per-request memoization with at-most-once computation per key.
#[derive(Debug, Default)]
pub struct RequestCache {
    cells: Mutex<HashMap<ObjectKey, Arc<OnceCell<ResolvedMap>>>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result, or run `compute` exactly once for this key
    /// within the request lifecycle.
    pub fn get_or_compute<F>(
        &self,
        principal_key: &str,
        kind: &str,
        object_id: &str,
        compute: F,
    ) -> ResolvedMap
    where
        F: FnOnce() -> ResolvedMap,
    {
        let cell = {
            let mut cells = self.cells.lock();
            cells
                .entry((
                    principal_key.to_string(),
                    kind.to_string(),
                    object_id.to_string(),
                ))
                .or_default()
                .clone()
        };
        cell.get_or_init(compute).clone()
    }

    pub fn len(&self) -> usize {
        self.cells.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.lock().is_empty()
    }
}

/// Generation stamp an entry was computed under: the global epoch plus one
/// counter per principal the result depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Stamp {
    epoch: u64,
    generations: Vec<u64>,
}

#[derive(Debug, Clone)]
struct SharedEntry {
    map: ResolvedMap,
    stamp: Stamp,
    cached_at: DateTime<Utc>,
}

/// Counters for cache effectiveness, exposed to the operator tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Cross-request decision cache.
#[derive(Debug, Default)]
pub struct SharedCache {
    entries: RwLock<HashMap<ObjectKey, SharedEntry>>,
    generations: RwLock<HashMap<String, u64>>,
    epoch: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A valid cached result, if one was stored under the current
    /// generations of every dependency.
    pub fn get(&self, dependencies: &[String], kind: &str, object_id: &str) -> Option<ResolvedMap> {
        let principal_key = dependencies.first()?;
        let stamp = self.stamp(dependencies);
        let key = (
            principal_key.clone(),
            kind.to_string(),
            object_id.to_string(),
        );

        let entries = self.entries.read();
        match entries.get(&key) {
            Some(entry) if entry.stamp == stamp => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Decision cache hit: {} {}:{} (cached {})",
                    principal_key, kind, object_id, entry.cached_at
                );
                Some(entry.map.clone())
            }
            Some(_) => {
                // Stale stamp: some dependency was invalidated since.
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a result stamped with the current dependency generations.
    /// Atomic entry replacement; the last writer wins.
    pub fn insert(
        &self,
        dependencies: &[String],
        kind: &str,
        object_id: &str,
        map: ResolvedMap,
    ) {
        let Some(principal_key) = dependencies.first() else {
            return;
        };
        let stamp = self.stamp(dependencies);
        let entry = SharedEntry {
            map,
            stamp,
            cached_at: Utc::now(),
        };
        self.entries.write().insert(
            (
                principal_key.clone(),
                kind.to_string(),
                object_id.to_string(),
            ),
            entry,
        );
    }

    /// Mark every cached result depending on this principal as stale. One
    /// counter bump covers all descendants.
    pub fn invalidate(&self, principal_key: &str) {
        let mut generations = self.generations.write();
        let counter = generations.entry(principal_key.to_string()).or_insert(0);
        *counter += 1;
        debug!(
            "Invalidated decisions depending on {} (generation {})",
            principal_key, counter
        );
    }

    /// Drop the validity of every cached result at once.
    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn stamp(&self, dependencies: &[String]) -> Stamp {
        let generations = self.generations.read();
        Stamp {
            epoch: self.epoch.load(Ordering::SeqCst),
            generations: dependencies
                .iter()
                .map(|key| generations.get(key).copied().unwrap_or(0))
                .collect(),
        }
    }
}

/// The cache pair one resolution pipeline works with: a fresh request layer
/// over the process-wide shared layer.
pub struct DecisionCache {
    request: RequestCache,
    shared: Arc<SharedCache>,
}

impl DecisionCache {
    pub fn new(shared: Arc<SharedCache>) -> Self {
        Self {
            request: RequestCache::new(),
            shared,
        }
    }

    /// Resolve through both layers. `dependencies` lists every principal
    /// key the result depends on, the queried principal first.
    pub fn get_or_compute<F>(
        &self,
        dependencies: &[String],
        kind: &str,
        object_id: &str,
        compute: F,
    ) -> ResolvedMap
    where
        F: FnOnce() -> ResolvedMap,
    {
        let principal_key = match dependencies.first() {
            Some(key) => key.as_str(),
            None => return compute(),
        };

        self.request
            .get_or_compute(principal_key, kind, object_id, || {
                if let Some(map) = self.shared.get(dependencies, kind, object_id) {
                    return map;
                }
                let map = compute();
                self.shared
                    .insert(dependencies, kind, object_id, map.clone());
                map
            })
    }

    pub fn invalidate(&self, principal_key: &str) {
        self.shared.invalidate(principal_key);
    }

    pub fn invalidate_all(&self) {
        self.shared.invalidate_all();
    }

    pub fn shared(&self) -> &Arc<SharedCache> {
        &self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use options::{OptionValue, ResolvedEntry};

    fn map_with(key: &str, value: bool) -> ResolvedMap {
        let mut map = ResolvedMap::new();
        map.insert(key, ResolvedEntry::explicit(OptionValue::Bool(value)));
        map
    }

    #[test]
    fn test_request_cache_computes_once() {
        let cache = RequestCache::new();
        let mut calls = 0;

        let first = cache.get_or_compute("user:1", "post", "42", || {
            calls += 1;
            map_with("hidden", true)
        });
        let second = cache.get_or_compute("user:1", "post", "42", || {
            calls += 1;
            map_with("hidden", false)
        });

        assert_eq!(calls, 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_request_cache_is_per_key() {
        let cache = RequestCache::new();
        cache.get_or_compute("user:1", "post", "42", || map_with("hidden", true));
        cache.get_or_compute("user:2", "post", "42", || map_with("hidden", false));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_shared_cache_hit_and_stats() {
        let cache = SharedCache::new();
        let deps = vec!["user:1".to_string(), "role:editor".to_string()];

        assert!(cache.get(&deps, "post", "42").is_none());
        cache.insert(&deps, "post", "42", map_with("hidden", true));
        assert!(cache.get(&deps, "post", "42").is_some());

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_invalidating_ancestor_stales_descendants() {
        let cache = SharedCache::new();
        let deps = vec!["user:1".to_string(), "role:editor".to_string()];
        cache.insert(&deps, "post", "42", map_with("hidden", true));

        // Bumping the role generation stales the user's entry without
        // touching it directly.
        cache.invalidate("role:editor");
        assert!(cache.get(&deps, "post", "42").is_none());

        // A result stored after the bump is valid again.
        cache.insert(&deps, "post", "42", map_with("hidden", false));
        assert!(cache.get(&deps, "post", "42").is_some());
    }

    #[test]
    fn test_invalidate_all() {
        let cache = SharedCache::new();
        let deps = vec!["visitor".to_string()];
        cache.insert(&deps, "post", "1", map_with("hidden", true));
        cache.invalidate_all();
        assert!(cache.get(&deps, "post", "1").is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_unrelated_invalidation_keeps_entry() {
        let cache = SharedCache::new();
        let deps = vec!["user:1".to_string(), "role:editor".to_string()];
        cache.insert(&deps, "post", "42", map_with("hidden", true));

        cache.invalidate("role:subscriber");
        assert!(cache.get(&deps, "post", "42").is_some());
    }

    #[test]
    fn test_decision_cache_layers_compose() {
        let shared = Arc::new(SharedCache::new());
        let deps = vec!["user:1".to_string()];

        let request_one = DecisionCache::new(shared.clone());
        let mut calls = 0;
        request_one.get_or_compute(&deps, "post", "42", || {
            calls += 1;
            map_with("hidden", true)
        });

        // A later request finds the shared entry without recomputing.
        let request_two = DecisionCache::new(shared.clone());
        let map = request_two.get_or_compute(&deps, "post", "42", || {
            calls += 1;
            map_with("hidden", false)
        });

        assert_eq!(calls, 1);
        assert_eq!(
            map.value("hidden"),
            Some(&OptionValue::Bool(true))
        );

        // Invalidation forces the next request to recompute.
        request_two.invalidate("user:1");
        let request_three = DecisionCache::new(shared);
        request_three.get_or_compute(&deps, "post", "42", || {
            calls += 1;
            map_with("hidden", false)
        });
        assert_eq!(calls, 2);
    }
}
