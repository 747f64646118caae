//! Key-to-set storage with ids in place of materialised sets.

use std::cell::Ref;
use std::hash::Hash;

use hashbrown::{HashMap, HashSet};

use crate::cache::PointsToCache;
use crate::set::{KeySet, PointsToSet};
use crate::stat;
use crate::types::{PointsToId, StoreKind};

/// The basic persistent points-to store: each key maps to the id of its
/// interned points-to set, and every mutation routes through the shared
/// [`PointsToCache`].
///
/// With reverse tracking enabled the store also maintains, per object, the
/// set of keys whose points-to set contains it. Reads of untouched keys
/// cost nothing: they materialise the empty set without creating a map
/// entry.
///
/// Mutating operations return `true` iff the destination id changed, i.e.
/// iff the destination set actually grew (or shrank, for the clearing
/// operations). Solvers use this as their fixpoint signal, so the flag is
/// exact in both directions.
pub struct BasicStore<'a, K, D, S, KS = HashSet<K>> {
    cache: &'a PointsToCache<S>,
    pts: HashMap<K, PointsToId>,
    rev: Option<HashMap<D, KS>>,
    empty_keys: KS,
}

impl<'a, K, D, S, KS> BasicStore<'a, K, D, S, KS>
where
    K: Copy + Eq + Hash,
    D: Copy + Eq + Hash,
    S: PointsToSet<Item = D>,
    KS: KeySet<K>,
{
    /// Creates a store bound to `cache`. `track_rev` enables the reverse
    /// index; [`get_rev_pts`][Self::get_rev_pts] is only legal when it is on.
    pub fn new(cache: &'a PointsToCache<S>, track_rev: bool) -> Self {
        Self {
            cache,
            pts: HashMap::new(),
            rev: track_rev.then(HashMap::new),
            empty_keys: KS::default(),
        }
    }

    pub fn kind(&self) -> StoreKind {
        StoreKind::Basic
    }

    /// Whether the reverse index is maintained.
    pub fn tracks_rev(&self) -> bool {
        self.rev.is_some()
    }

    pub(crate) fn cache(&self) -> &'a PointsToCache<S> {
        self.cache
    }

    /// Current id of `var`'s points-to set (`EMPTY` when untouched).
    pub fn pts_id(&self, var: K) -> PointsToId {
        self.pts.get(&var).copied().unwrap_or(PointsToId::EMPTY)
    }

    pub(crate) fn pts_ids(&self) -> impl Iterator<Item = PointsToId> + '_ {
        self.pts.values().copied()
    }

    /// Number of keys with a recorded (possibly cleared-to-empty) set.
    pub fn len(&self) -> usize {
        self.pts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pts.is_empty()
    }

    /// Keys with a recorded entry, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.pts.keys().copied()
    }

    /// Materialises `var`'s points-to set.
    ///
    /// The guard borrows the cache; drop it before the next mutation.
    pub fn get_pts(&self, var: K) -> Ref<'a, S> {
        self.cache.pts(self.pts_id(var))
    }

    /// All keys whose points-to set contains `data`.
    ///
    /// # Panics
    ///
    /// Panics if the store was built without reverse tracking.
    pub fn get_rev_pts(&self, data: D) -> &KS {
        let rev = self
            .rev
            .as_ref()
            .expect("get_rev_pts: store was built without reverse tracking");
        rev.get(&data).unwrap_or(&self.empty_keys)
    }

    /// Adds a single object: `pts[dst] ∪= {element}`.
    pub fn add_pts(&mut self, dst: K, element: D) -> bool {
        let src_id = self.cache.intern(&S::singleton(element));
        self.union_pts_from_id(dst, src_id)
    }

    /// `pts[dst] ∪= pts[src]`.
    pub fn union_pts(&mut self, dst: K, src: K) -> bool {
        let src_id = self.pts_id(src);
        self.union_pts_from_id(dst, src_id)
    }

    /// `pts[dst] ∪= src`.
    pub fn union_pts_set(&mut self, dst: K, src: &S) -> bool {
        let src_id = self.cache.intern(src);
        self.union_pts_from_id(dst, src_id)
    }

    /// Removes a single object from `var`'s points-to set.
    ///
    /// A no-op (and no reverse-index touch) when the object is absent.
    pub fn clear_pts(&mut self, var: K, element: D) {
        let to_remove = self.cache.intern(&S::singleton(element));
        let var_id = self.pts_id(var);
        let remaining = self.cache.complement(var_id, to_remove);
        if remaining != var_id {
            self.pts.insert(var, remaining);
            if let Some(rev) = self.rev.as_mut() {
                if let Some(keys) = rev.get_mut(&element) {
                    keys.remove(var);
                }
            }
        }
    }

    /// Resets `var`'s points-to set to empty, unhooking the reverse index.
    pub fn clear_full_pts(&mut self, var: K) {
        let cache = self.cache;
        let var_id = self.pts_id(var);
        if !var_id.is_empty_set() {
            if let Some(rev) = self.rev.as_mut() {
                for data in cache.pts(var_id).iter() {
                    if let Some(keys) = rev.get_mut(&data) {
                        keys.remove(var);
                    }
                }
            }
        }
        self.pts.insert(var, PointsToId::EMPTY);
    }

    /// Drops every entry. The cache is untouched; ids held elsewhere stay
    /// valid.
    pub fn clear(&mut self) {
        self.pts.clear();
        if let Some(rev) = self.rev.as_mut() {
            rev.clear();
        }
    }

    /// See [`stat::top_n`].
    pub fn top_n(&self, n: usize) -> (u64, u64) {
        stat::top_n(self.pts_ids(), n)
    }

    /// See [`stat::in_use`].
    pub fn in_use_points_to_sets(&self) -> u64 {
        stat::in_use(self.pts_ids())
    }

    /// Union through an id, the seam the sibling stores drive.
    ///
    /// When the destination grows and the reverse index is on, only the
    /// *source* set is walked: elements already in the destination carry
    /// valid reverse entries from whichever union introduced them, so the
    /// per-call reverse cost is bounded by the delta's source, not the
    /// accumulated destination.
    pub(crate) fn union_pts_from_id(&mut self, dst: K, src_id: PointsToId) -> bool {
        let dst_id = self.pts_id(dst);
        let new_dst_id = self.cache.union(dst_id, src_id);
        if new_dst_id == dst_id {
            return false;
        }

        self.pts.insert(dst, new_dst_id);
        let cache = self.cache;
        if let Some(rev) = self.rev.as_mut() {
            for data in cache.pts(src_id).iter() {
                rev.entry(data).or_default().insert(dst);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::bitset::BitSet;

    type Store<'a> = BasicStore<'a, u32, u32, BitSet>;

    fn set(items: &[u32]) -> BitSet {
        items.iter().copied().collect()
    }

    #[test]
    fn test_union_chain() {
        let cache = PointsToCache::default();
        let mut store: Store = BasicStore::new(&cache, true);
        let (a, b, c) = (1, 2, 3);

        assert!(store.add_pts(a, 1));
        assert!(store.add_pts(a, 2));
        assert!(store.add_pts(b, 2));
        assert!(store.union_pts(c, a));
        assert!(!store.union_pts(c, b)); // {2} ⊆ {1,2}

        assert_eq!(*store.get_pts(c), set(&[1, 2]));
        let rev2: Vec<_> = {
            let mut keys: Vec<_> = KeySet::iter(store.get_rev_pts(2)).collect();
            keys.sort_unstable();
            keys
        };
        assert_eq!(rev2, vec![a, b, c]);
        let rev1: Vec<_> = {
            let mut keys: Vec<_> = KeySet::iter(store.get_rev_pts(1)).collect();
            keys.sort_unstable();
            keys
        };
        assert_eq!(rev1, vec![a, c]);

        // Only {1,2} and {2} are in use.
        assert_eq!(store.in_use_points_to_sets(), 2);
    }

    #[test]
    fn test_untouched_key_is_empty() {
        let cache = PointsToCache::default();
        let store: Store = BasicStore::new(&cache, false);
        assert!(store.get_pts(99).is_empty());
        assert_eq!(store.pts_id(99), PointsToId::EMPTY);
        // Reading must not have created an entry.
        assert_eq!(store.in_use_points_to_sets(), 0);
    }

    #[test]
    fn test_change_flag_is_exact() {
        let cache = PointsToCache::default();
        let mut store: Store = BasicStore::new(&cache, false);

        assert!(store.add_pts(1, 10));
        assert!(!store.add_pts(1, 10));
        assert!(store.union_pts_set(1, &set(&[10, 11])));
        assert!(!store.union_pts_set(1, &set(&[10])));
        assert!(!store.union_pts(1, 1));
        // Union with an untouched (empty) source.
        assert!(!store.union_pts(1, 2));
    }

    #[test]
    fn test_interning_across_keys() {
        let cache = PointsToCache::default();
        let mut store: Store = BasicStore::new(&cache, false);

        store.add_pts(1, 7);
        store.add_pts(1, 8);
        store.add_pts(2, 8);
        store.add_pts(2, 7);
        assert_eq!(store.pts_id(1), store.pts_id(2));
    }

    #[test]
    fn test_monotonic_under_random_unions() {
        let cache = PointsToCache::default();
        let mut store: Store = BasicStore::new(&cache, true);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut previous: Vec<u32> = Vec::new();
        for _ in 0..200 {
            match rng.gen_range(0..3) {
                0 => {
                    store.add_pts(0, rng.gen_range(0..64));
                }
                1 => {
                    let other = rng.gen_range(1..8);
                    store.add_pts(other, rng.gen_range(0..64));
                    store.union_pts(0, other);
                }
                _ => {
                    let bulk: BitSet = (0..rng.gen_range(0..6))
                        .map(|_| rng.gen_range(0..64))
                        .collect();
                    store.union_pts_set(0, &bulk);
                }
            }
            let current: Vec<u32> = store.get_pts(0).iter().collect();
            assert!(previous.iter().all(|d| current.contains(d)));
            previous = current;
        }
    }

    #[test]
    fn test_rev_consistency_under_random_ops() {
        let cache = PointsToCache::default();
        let mut store: Store = BasicStore::new(&cache, true);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..300 {
            let key = rng.gen_range(0..6);
            let data = rng.gen_range(0..16);
            match rng.gen_range(0..4) {
                0 | 1 => {
                    store.add_pts(key, data);
                }
                2 => {
                    store.union_pts(key, rng.gen_range(0..6));
                }
                _ => {
                    store.clear_pts(key, data);
                }
            }

            for k in 0..6u32 {
                let members: Vec<u32> = store.get_pts(k).iter().collect();
                for d in 0..16u32 {
                    assert_eq!(
                        members.contains(&d),
                        KeySet::contains(store.get_rev_pts(d), k),
                        "reverse index out of sync for key {k} and data {d}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_clear_pts_absent_is_noop() {
        let cache = PointsToCache::default();
        let mut store: Store = BasicStore::new(&cache, true);
        store.add_pts(1, 10);
        let before = store.pts_id(1);
        store.clear_pts(1, 99);
        assert_eq!(store.pts_id(1), before);
        assert!(KeySet::contains(store.get_rev_pts(10), 1));
    }

    #[test]
    fn test_clear_full_pts_is_idempotent() {
        let cache = PointsToCache::default();
        let mut store: Store = BasicStore::new(&cache, true);
        store.add_pts(1, 10);
        store.add_pts(1, 11);

        store.clear_full_pts(1);
        assert!(store.get_pts(1).is_empty());
        assert!(!KeySet::contains(store.get_rev_pts(10), 1));
        assert!(!KeySet::contains(store.get_rev_pts(11), 1));

        store.clear_full_pts(1);
        assert!(store.get_pts(1).is_empty());
        // The key keeps its entry, now valued as the empty set.
        assert_eq!(store.len(), 1);
        assert_eq!(store.pts_id(1), PointsToId::EMPTY);
        assert_eq!(store.in_use_points_to_sets(), 1);
    }

    #[test]
    fn test_clear_full_pts_keeps_the_entry() {
        let cache = PointsToCache::default();
        let mut store: Store = BasicStore::new(&cache, true);
        store.add_pts(1, 5);
        store.add_pts(2, 6);

        store.clear_full_pts(1);

        // Both keys stay recorded; the cleared one holds EMPTY, which
        // counts among the observed ids.
        assert_eq!(store.len(), 2);
        assert!(store.keys().any(|key| key == 1));
        assert_eq!(store.pts_id(1), PointsToId::EMPTY);
        assert_eq!(*store.get_pts(2), set(&[6]));
        assert_eq!(store.in_use_points_to_sets(), 2);
        // Only the live entry carries pointers.
        assert_eq!(store.top_n(1), (1, 1));
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = PointsToCache::default();
        let mut store: Store = BasicStore::new(&cache, true);
        store.add_pts(1, 10);
        store.add_pts(2, 11);
        store.clear();
        assert!(store.get_pts(1).is_empty());
        assert!(KeySet::is_empty(store.get_rev_pts(10)));
        assert_eq!(store.in_use_points_to_sets(), 0);
    }

    #[test]
    #[should_panic(expected = "without reverse tracking")]
    fn test_rev_query_without_tracking() {
        let cache = PointsToCache::default();
        let store: Store = BasicStore::new(&cache, false);
        let _ = store.get_rev_pts(1);
    }

    #[test]
    fn test_top_n() {
        let cache = PointsToCache::default();
        let mut store: Store = BasicStore::new(&cache, false);
        for key in 0..5 {
            store.add_pts(key, 1);
        }
        for key in 5..8 {
            store.union_pts_set(key, &set(&[1, 2]));
        }
        store.union_pts_set(8, &set(&[1, 2, 3]));

        assert_eq!(store.top_n(2), (8, 9));
        assert_eq!(store.in_use_points_to_sets(), 3);
    }
}
