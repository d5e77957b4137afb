//! Memoization of array reconciliation results.
//!
//! [`MatchCache`] maps a `(left pointer, right pointer)` pair to the
//! [`ArrayChange`] and score computed for it. Every insertion removes the
//! entries lying strictly below the key on both sides: a parent pairing
//! supersedes child results cached before it, including ones cached after an
//! earlier write of the same key.
//!
//! Entries are held in a two-level `BTreeMap` keyed by [`Pointer`]. Because
//! the strict descendants of a pointer form one contiguous range in pointer
//! order, invalidation walks only the descendant ranges.

use std::collections::BTreeMap;
use std::ops::Bound;

use tracing::debug;

use arbor_types::Pointer;

use crate::change::ArrayChange;

/// A cached reconciliation result.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedArray {
    pub change: ArrayChange,
    pub score: usize,
}

/// Counters describing cache activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    /// Entries removed by descendant invalidation.
    pub invalidated: u64,
}

/// Cache of array results keyed by pointer pairs.
#[derive(Clone, Debug, Default)]
pub struct MatchCache {
    entries: BTreeMap<Pointer, BTreeMap<Pointer, CachedArray>>,
    len: usize,
    stats: CacheStats,
}

impl MatchCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Activity counters since creation or the last [`clear`](Self::clear).
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Look up a result, recording a hit or miss.
    pub fn get(&mut self, left: &Pointer, right: &Pointer) -> Option<&CachedArray> {
        let found = self.entries.get(left).and_then(|inner| inner.get(right));
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    /// Look up a result without touching the counters.
    pub fn peek(&self, left: &Pointer, right: &Pointer) -> Option<&CachedArray> {
        self.entries.get(left).and_then(|inner| inner.get(right))
    }

    /// Returns `true` if the exact key is cached.
    pub fn contains(&self, left: &Pointer, right: &Pointer) -> bool {
        self.peek(left, right).is_some()
    }

    /// Store a result.
    ///
    /// First purges entries whose left pointer is a strict descendant of
    /// `left` and whose right pointer is a strict descendant of `right`.
    pub fn insert(&mut self, left: Pointer, right: Pointer, value: CachedArray) {
        self.stats.inserts += 1;
        self.invalidate_descendants(&left, &right);
        if self.entries.entry(left).or_default().insert(right, value).is_none() {
            self.len += 1;
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.len = 0;
        self.stats = CacheStats::default();
    }

    fn invalidate_descendants(&mut self, left: &Pointer, right: &Pointer) {
        let lefts: Vec<Pointer> = descendant_keys(&self.entries, left);
        let mut removed = 0usize;

        for l in lefts {
            let Some(inner) = self.entries.get_mut(&l) else {
                continue;
            };
            for r in descendant_keys(inner, right) {
                inner.remove(&r);
                removed += 1;
            }
            if inner.is_empty() {
                self.entries.remove(&l);
            }
        }

        if removed > 0 {
            self.len -= removed;
            self.stats.invalidated += removed as u64;
            debug!(left = %left, right = %right, removed, "invalidated descendant cache entries");
        }
    }
}

/// Keys of `map` that are strict descendants of `ancestor`.
fn descendant_keys<V>(map: &BTreeMap<Pointer, V>, ancestor: &Pointer) -> Vec<Pointer> {
    map.range::<Pointer, _>((Bound::Excluded(ancestor), Bound::Unbounded))
        .take_while(|(key, _)| key.starts_with(ancestor))
        .map(|(key, _)| key.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::MatchMethod;

    fn p(s: &str) -> Pointer {
        Pointer::parse(s)
    }

    fn entry(score: usize) -> CachedArray {
        CachedArray {
            change: ArrayChange::new(Pointer::root(), Pointer::root(), MatchMethod::Literal, None),
            score,
        }
    }

    #[test]
    fn get_after_insert() {
        let mut cache = MatchCache::new();
        cache.insert(p("/a"), p("/b"), entry(3));
        assert_eq!(cache.get(&p("/a"), &p("/b")).map(|e| e.score), Some(3));
        assert!(cache.get(&p("/a"), &p("/c")).is_none());
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn reset_parent_purges_descendants() {
        let mut cache = MatchCache::new();
        cache.insert(p("/items"), p("/items"), entry(1));
        cache.insert(p("/items/0"), p("/items/0"), entry(2));
        cache.insert(p("/items"), p("/items"), entry(3));
        assert!(cache.get(&p("/items/0"), &p("/items/0")).is_none());
        assert_eq!(cache.get(&p("/items"), &p("/items")).map(|e| e.score), Some(3));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().invalidated, 1);
    }

    #[test]
    fn overwrite_keeps_len() {
        let mut cache = MatchCache::new();
        cache.insert(p("/a"), p("/a"), entry(1));
        cache.insert(p("/a"), p("/a"), entry(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().inserts, 2);
    }

    #[test]
    fn descendant_set_then_parent_reset_sequence() {
        // set(p, q), set(p/0, q/0), then a new parent key above both.
        let mut cache = MatchCache::new();
        cache.insert(p("/doc/list"), p("/doc/list"), entry(1));
        cache.insert(p("/doc/list/0"), p("/doc/list/0"), entry(2));
        cache.insert(p("/doc"), p("/doc"), entry(3));
        assert!(cache.get(&p("/doc/list/0"), &p("/doc/list/0")).is_none());
        assert!(cache.get(&p("/doc/list"), &p("/doc/list")).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn requires_descent_on_both_sides() {
        let mut cache = MatchCache::new();
        cache.insert(p("/a/0"), p("/x/0"), entry(1));
        cache.insert(p("/a/1"), p("/b/1"), entry(1));
        cache.insert(p("/a"), p("/b"), entry(2));
        assert!(cache.contains(&p("/a/0"), &p("/x/0")));
        assert!(!cache.contains(&p("/a/1"), &p("/b/1")));
    }

    #[test]
    fn siblings_with_shared_prefix_survive() {
        let mut cache = MatchCache::new();
        cache.insert(p("/ab/0"), p("/ab/0"), entry(1));
        cache.insert(p("/a"), p("/a"), entry(2));
        assert!(cache.contains(&p("/ab/0"), &p("/ab/0")));
    }

    #[test]
    fn root_key_purges_everything_below() {
        let mut cache = MatchCache::new();
        cache.insert(p("/a"), p("/a"), entry(1));
        cache.insert(p("/b/0"), p("/c"), entry(1));
        cache.insert(Pointer::root(), Pointer::root(), entry(0));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&Pointer::root(), &Pointer::root()));
    }

    #[test]
    fn clear_resets_state() {
        let mut cache = MatchCache::new();
        cache.insert(p("/a"), p("/a"), entry(1));
        cache.get(&p("/a"), &p("/a"));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
