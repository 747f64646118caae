//! Human-readable dumps for development and debugging.
//!
//! Nothing here is a stable format; these helpers exist to answer "what is
//! in this store right now" in tests and log output.

use std::fmt::Debug;
use std::fmt::Write;
use std::hash::Hash;

use crate::basic::BasicStore;
use crate::cache::PointsToCache;
use crate::set::{KeySet, PointsToSet};

/// One-line cache occupancy and memo effectiveness summary.
pub fn cache_summary<S: PointsToSet>(cache: &PointsToCache<S>) -> String {
    format!(
        "cache: {} interned sets, memo {} hits / {} misses",
        cache.len(),
        cache.memo_hits(),
        cache.memo_misses()
    )
}

/// Multi-line listing of a basic store's contents.
///
/// At most `limit` entries are listed (sorted textually for determinism);
/// the header always carries the exact totals.
pub fn dump_basic<K, D, S, KS>(store: &BasicStore<'_, K, D, S, KS>, limit: usize) -> String
where
    K: Copy + Eq + Hash + Debug,
    D: Copy + Eq + Hash + Debug,
    S: PointsToSet<Item = D>,
    KS: KeySet<K>,
{
    let (_, total) = store.top_n(0);
    let mut out = format!(
        "basic store: {} keys, {} non-empty, {} distinct sets\n",
        store.len(),
        total,
        store.in_use_points_to_sets()
    );

    let mut lines: Vec<String> = store
        .keys()
        .map(|key| {
            let members: Vec<String> = store
                .get_pts(key)
                .iter()
                .map(|data| format!("{data:?}"))
                .collect();
            format!("  {:?} ({}) -> {{{}}}\n", key, store.pts_id(key), members.join(", "))
        })
        .collect();
    lines.sort_unstable();

    for line in lines.iter().take(limit) {
        out.push_str(line);
    }
    if lines.len() > limit {
        let _ = writeln!(out, "  ... {} more", lines.len() - limit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::BitSet;

    #[test]
    fn test_dump_lists_contents() {
        let cache = PointsToCache::default();
        let mut store: BasicStore<u32, u32, BitSet> = BasicStore::new(&cache, false);
        store.add_pts(1, 10);
        store.add_pts(1, 11);
        store.add_pts(2, 10);

        let dump = dump_basic(&store, 16);
        assert!(dump.contains("2 keys"));
        assert!(dump.contains("{10, 11}"));
        assert!(dump.contains("2 distinct sets"));
    }

    #[test]
    fn test_dump_shows_cleared_keys() {
        let cache = PointsToCache::default();
        let mut store: BasicStore<u32, u32, BitSet> = BasicStore::new(&cache, false);
        store.add_pts(1, 10);
        store.add_pts(2, 11);
        store.add_pts(3, 12);
        store.clear_full_pts(2);

        let dump = dump_basic(&store, 16);
        // The cleared key still shows up, valued as the empty set.
        assert!(dump.contains("3 keys"));
        assert!(dump.contains("2 non-empty"));
        assert!(dump.contains("2 (#0) -> {}"));
    }

    #[test]
    fn test_dump_respects_limit() {
        let cache = PointsToCache::default();
        let mut store: BasicStore<u32, u32, BitSet> = BasicStore::new(&cache, false);
        for key in 0..10 {
            store.add_pts(key, key);
        }

        let dump = dump_basic(&store, 3);
        assert!(dump.contains("... 7 more"));
    }

    #[test]
    fn test_cache_summary() {
        let cache = PointsToCache::<BitSet>::default();
        let summary = cache_summary(&cache);
        assert!(summary.contains("1 interned sets"));
    }
}
