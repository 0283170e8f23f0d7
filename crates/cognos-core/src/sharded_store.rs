//! Partitioned in-memory map keyed by a shard function (C2).
//!
//! Grounded on the teacher's tree-per-slot `sled::Db` partitioning
//! (`knowledge/store.rs`'s fixed 9-slot `TREE_NAMES` table): this generalizes
//! that idea from 9 fixed slots to an arbitrary caller-supplied `shardKeyFn`,
//! and swaps `sled` for `dashmap` since spec §2 calls for an in-memory map, not
//! an on-disk tree (disk persistence is the `PersistenceStore` collaborator's
//! job, out of scope for the core per spec §1).

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Opaque snapshot of a `ShardedStore`: shard keys in insertion order, each
/// with its entries in insertion order. Callers should treat this as opaque
/// and round-trip it through `export`/`import` rather than inspect it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardedSnapshot<K, V> {
    shards: Vec<(String, Vec<(K, V)>)>,
}

/// Partitioned map: each shard is an independent `DashMap`, so mutations
/// against different shard keys never contend on the same lock.
pub struct ShardedStore<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    shard_key_fn: Box<dyn Fn(&V) -> String + Send + Sync>,
    shards: DashMap<String, DashMap<K, V>>,
    /// Insertion order of shard-key strings, used by the shard-less `get` scan.
    shard_order: DashMap<String, Vec<K>>,
}

impl<K, V> ShardedStore<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(shard_key_fn: impl Fn(&V) -> String + Send + Sync + 'static) -> Self {
        Self {
            shard_key_fn: Box::new(shard_key_fn),
            shards: DashMap::new(),
            shard_order: DashMap::new(),
        }
    }

    fn shard_key_for(&self, value: &V) -> String {
        (self.shard_key_fn)(value)
    }

    pub fn put(&self, id: K, value: V) {
        let shard_key = self.shard_key_for(&value);
        let shard = self.shards.entry(shard_key.clone()).or_default();
        let is_new = !shard.contains_key(&id);
        shard.insert(id.clone(), value);
        drop(shard);
        if is_new {
            self.shard_order.entry(shard_key).or_default().push(id);
        }
    }

    /// Fetches by id. If `shard_key` is known, looks only in that shard;
    /// otherwise scans all shards in insertion order.
    pub fn get(&self, id: &K, shard_key: Option<&str>) -> Option<V> {
        if let Some(key) = shard_key {
            return self.shards.get(key).and_then(|s| s.get(id).map(|v| v.clone()));
        }
        for shard_entry in self.shard_order.iter() {
            if let Some(shard) = self.shards.get(shard_entry.key()) {
                if let Some(value) = shard.get(id) {
                    return Some(value.clone());
                }
            }
        }
        None
    }

    pub fn delete(&self, id: &K, shard_key: Option<&str>) -> Option<V> {
        if let Some(key) = shard_key {
            let removed = self.shards.get(key).and_then(|s| s.remove(id).map(|(_, v)| v));
            if removed.is_some() {
                if let Some(mut order) = self.shard_order.get_mut(key) {
                    order.retain(|k| k != id);
                }
            }
            return removed;
        }
        let keys: Vec<String> = self.shard_order.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Some(removed) = self.delete(id, Some(&key)) {
                return Some(removed);
            }
        }
        None
    }

    /// Scans one shard, applying `filter`, capped at `limit` (0 = unbounded).
    pub fn query_shard(&self, shard_key: &str, filter: impl Fn(&V) -> bool, limit: usize) -> Vec<V> {
        let Some(order) = self.shard_order.get(shard_key) else {
            return Vec::new();
        };
        let Some(shard) = self.shards.get(shard_key) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for id in order.iter() {
            if let Some(value) = shard.get(id) {
                if filter(&value) {
                    out.push(value.clone());
                    if limit != 0 && out.len() >= limit {
                        break;
                    }
                }
            }
        }
        out
    }

    pub fn list_shards(&self) -> Vec<String> {
        self.shard_order.iter().map(|e| e.key().clone()).collect()
    }

    pub fn total_size(&self) -> usize {
        self.shards.iter().map(|s| s.len()).sum()
    }

    /// Opaque export: shard order plus per-shard insertion order, each entry
    /// paired with its value. Used for the spec's periodic snapshot as well
    /// as ad-hoc store copies.
    pub fn export(&self) -> ShardedSnapshot<K, V> {
        let shards = self
            .shard_order
            .iter()
            .map(|entry| {
                let shard_key = entry.key().clone();
                let shard = self.shards.get(&shard_key);
                let items = entry
                    .value()
                    .iter()
                    .filter_map(|id| {
                        shard
                            .as_ref()
                            .and_then(|s| s.get(id).map(|v| (id.clone(), v.clone())))
                    })
                    .collect();
                (shard_key, items)
            })
            .collect();
        ShardedSnapshot { shards }
    }

    /// Restores a snapshot produced by `export`. Entries land back in the
    /// shard they were exported from rather than being re-keyed through
    /// `shard_key_fn`, so restoration is deterministic even if the shard-key
    /// function is non-pure for a given `V`.
    pub fn import(&self, snapshot: ShardedSnapshot<K, V>) {
        for (shard_key, items) in snapshot.shards {
            for (id, value) in items {
                let mut shard = self.shards.entry(shard_key.clone()).or_default();
                let is_new = !shard.contains_key(&id);
                shard.insert(id.clone(), value);
                drop(shard);
                if is_new {
                    self.shard_order.entry(shard_key.clone()).or_default().push(id);
                }
            }
        }
    }
}
