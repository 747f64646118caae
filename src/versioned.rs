//! Parallel storage for two disjoint key spaces sharing one cache.
//!
//! Versioned (SSA-style) pointer analyses keep top-level variables and
//! versioned address-taken variables in separate namespaces, but their
//! points-to sets draw from the same object universe. Backing both spaces
//! with one [`PointsToCache`] puts their ids in one namespace, so a set
//! flows between spaces as a bare id, with no copying.

use std::cell::Ref;
use std::hash::Hash;

use hashbrown::HashSet;

use crate::basic::BasicStore;
use crate::cache::PointsToCache;
use crate::set::{KeySet, PointsToSet};
use crate::stat;
use crate::types::{PointsToId, StoreKind};

/// Two [`BasicStore`]s over disjoint key spaces, one shared cache.
///
/// `K` keys top-level variables, `VK` versioned address-taken variables.
/// Every operation exists for each space, plus the cross-space unions that
/// make the shared id namespace pay off.
pub struct VersionedStore<'a, K, D, S, KS = HashSet<K>, VK = K, VKS = HashSet<VK>> {
    /// Top-level variables.
    tl: BasicStore<'a, K, D, S, KS>,
    /// Versioned address-taken variables.
    at: BasicStore<'a, VK, D, S, VKS>,
}

impl<'a, K, D, S, KS, VK, VKS> VersionedStore<'a, K, D, S, KS, VK, VKS>
where
    K: Copy + Eq + Hash,
    D: Copy + Eq + Hash,
    S: PointsToSet<Item = D>,
    KS: KeySet<K>,
    VK: Copy + Eq + Hash,
    VKS: KeySet<VK>,
{
    pub fn new(cache: &'a PointsToCache<S>, track_rev: bool) -> Self {
        Self {
            tl: BasicStore::new(cache, track_rev),
            at: BasicStore::new(cache, track_rev),
        }
    }

    pub fn kind(&self) -> StoreKind {
        StoreKind::Versioned
    }

    pub fn tracks_rev(&self) -> bool {
        self.tl.tracks_rev()
    }

    // Top-level space.

    pub fn get_pts(&self, var: K) -> Ref<'a, S> {
        self.tl.get_pts(var)
    }

    /// # Panics
    ///
    /// Panics if the store was built without reverse tracking.
    pub fn get_rev_pts(&self, data: D) -> &KS {
        self.tl.get_rev_pts(data)
    }

    pub fn add_pts(&mut self, dst: K, element: D) -> bool {
        self.tl.add_pts(dst, element)
    }

    pub fn union_pts(&mut self, dst: K, src: K) -> bool {
        self.tl.union_pts(dst, src)
    }

    pub fn union_pts_set(&mut self, dst: K, src: &S) -> bool {
        self.tl.union_pts_set(dst, src)
    }

    pub fn clear_pts(&mut self, var: K, element: D) {
        self.tl.clear_pts(var, element)
    }

    pub fn clear_full_pts(&mut self, var: K) {
        self.tl.clear_full_pts(var)
    }

    // Versioned space.

    pub fn get_versioned_pts(&self, var: VK) -> Ref<'a, S> {
        self.at.get_pts(var)
    }

    /// # Panics
    ///
    /// Panics if the store was built without reverse tracking.
    pub fn get_versioned_rev_pts(&self, data: D) -> &VKS {
        self.at.get_rev_pts(data)
    }

    pub fn add_versioned_pts(&mut self, dst: VK, element: D) -> bool {
        self.at.add_pts(dst, element)
    }

    pub fn union_versioned_pts(&mut self, dst: VK, src: VK) -> bool {
        self.at.union_pts(dst, src)
    }

    pub fn union_versioned_pts_set(&mut self, dst: VK, src: &S) -> bool {
        self.at.union_pts_set(dst, src)
    }

    pub fn clear_versioned_pts(&mut self, var: VK, element: D) {
        self.at.clear_pts(var, element)
    }

    pub fn clear_full_versioned_pts(&mut self, var: VK) {
        self.at.clear_full_pts(var)
    }

    // Cross-space unions. Both stores draw ids from the same cache, so a
    // source id from one space is directly meaningful in the other.

    /// `versioned[dst] ∪= top-level[src]`.
    pub fn union_versioned_from_key(&mut self, dst: VK, src: K) -> bool {
        let src_id = self.tl.pts_id(src);
        self.at.union_pts_from_id(dst, src_id)
    }

    /// `top-level[dst] ∪= versioned[src]`.
    pub fn union_key_from_versioned(&mut self, dst: K, src: VK) -> bool {
        let src_id = self.at.pts_id(src);
        self.tl.union_pts_from_id(dst, src_id)
    }

    /// Drops both spaces' entries.
    pub fn clear(&mut self) {
        self.tl.clear();
        self.at.clear();
    }

    // Statistics aggregate over both spaces.

    fn all_ids(&self) -> impl Iterator<Item = PointsToId> + '_ {
        self.tl.pts_ids().chain(self.at.pts_ids())
    }

    pub fn top_n(&self, n: usize) -> (u64, u64) {
        stat::top_n(self.all_ids(), n)
    }

    pub fn in_use_points_to_sets(&self) -> u64 {
        stat::in_use(self.all_ids())
    }
}
