//! Diff-tracking storage for worklist propagation.
//!
//! A worklist solver repeatedly pushes a variable's points-to set along
//! its outgoing flow edges. Pushing the whole set every time is quadratic;
//! the diff store remembers, per key, the id of everything already
//! propagated and hands the solver only the complement.

use std::cell::Ref;
use std::hash::Hash;

use hashbrown::{HashMap, HashSet};

use crate::basic::BasicStore;
use crate::cache::PointsToCache;
use crate::set::{KeySet, PointsToSet};
use crate::types::{PointsToId, StoreKind};

/// A [`BasicStore`] plus per-key diff/propagated id tracking.
///
/// The base store holds the authoritative points-to sets; `diff` and
/// `propa` are bookkeeping for the solver and never feed back into the
/// base maps.
pub struct DiffStore<'a, K, D, S, KS = HashSet<K>> {
    cache: &'a PointsToCache<S>,
    /// Backing for the basic operations; composition instead of a
    /// parallel implementation.
    base: BasicStore<'a, K, D, S, KS>,
    /// Points-to still awaiting propagation.
    diff: HashMap<K, PointsToId>,
    /// Points-to already propagated.
    propa: HashMap<K, PointsToId>,
}

impl<'a, K, D, S, KS> DiffStore<'a, K, D, S, KS>
where
    K: Copy + Eq + Hash,
    D: Copy + Eq + Hash,
    S: PointsToSet<Item = D>,
    KS: KeySet<K>,
{
    pub fn new(cache: &'a PointsToCache<S>, track_rev: bool) -> Self {
        Self {
            cache,
            base: BasicStore::new(cache, track_rev),
            diff: HashMap::new(),
            propa: HashMap::new(),
        }
    }

    pub fn kind(&self) -> StoreKind {
        StoreKind::Diff
    }

    pub fn tracks_rev(&self) -> bool {
        self.base.tracks_rev()
    }

    // Basic operations, delegated.

    pub fn pts_id(&self, var: K) -> PointsToId {
        self.base.pts_id(var)
    }

    pub fn get_pts(&self, var: K) -> Ref<'a, S> {
        self.base.get_pts(var)
    }

    /// # Panics
    ///
    /// Panics if the store was built without reverse tracking.
    pub fn get_rev_pts(&self, data: D) -> &KS {
        self.base.get_rev_pts(data)
    }

    pub fn add_pts(&mut self, dst: K, element: D) -> bool {
        self.base.add_pts(dst, element)
    }

    pub fn union_pts(&mut self, dst: K, src: K) -> bool {
        self.base.union_pts(dst, src)
    }

    pub fn union_pts_set(&mut self, dst: K, src: &S) -> bool {
        self.base.union_pts_set(dst, src)
    }

    pub fn clear_pts(&mut self, var: K, element: D) {
        self.base.clear_pts(var, element)
    }

    pub fn clear_full_pts(&mut self, var: K) {
        self.base.clear_full_pts(var)
    }

    pub fn top_n(&self, n: usize) -> (u64, u64) {
        self.base.top_n(n)
    }

    pub fn in_use_points_to_sets(&self) -> u64 {
        self.base.in_use_points_to_sets()
    }

    pub fn clear(&mut self) {
        self.base.clear();
        self.diff.clear();
        self.propa.clear();
    }

    // Diff tracking.

    fn diff_id(&self, var: K) -> PointsToId {
        self.diff.get(&var).copied().unwrap_or(PointsToId::EMPTY)
    }

    fn propa_id(&self, var: K) -> PointsToId {
        self.propa.get(&var).copied().unwrap_or(PointsToId::EMPTY)
    }

    /// Materialises the portion of `var`'s set still awaiting propagation.
    pub fn get_diff_pts(&self, var: K) -> Ref<'a, S> {
        self.cache.pts(self.diff_id(var))
    }

    /// Recomputes `var`'s diff against `all`, the caller's current view of
    /// its full points-to set, then marks all of it propagated.
    ///
    /// Returns whether anything is left to propagate.
    pub fn compute_diff_pts(&mut self, var: K, all: &S) -> bool {
        let propa_id = self.propa_id(var);
        let all_id = self.cache.intern(all);
        // Diff is the entire points-to set minus what has been propagated.
        let diff_id = self.cache.complement(all_id, propa_id);
        self.diff.insert(var, diff_id);
        self.propa.insert(var, all_id);
        !diff_id.is_empty_set()
    }

    /// Narrows `dst`'s propagated set to what `src` has also propagated.
    pub fn update_propa_pts_map(&mut self, src: K, dst: K) {
        let joint = self.cache.intersect(self.propa_id(dst), self.propa_id(src));
        self.propa.insert(dst, joint);
    }

    /// Forgets `var`'s propagation history; the next diff is its full set.
    pub fn clear_propa_pts(&mut self, var: K) {
        self.propa.remove(&var);
    }
}
