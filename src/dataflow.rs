//! Per-location IN/OUT points-to storage for flow-sensitive analysis.
//!
//! Top-level variables keep a single points-to set in the embedded
//! [`BasicStore`]; address-taken variables get one set per program
//! location and direction. Transfer operations read a source id, union it
//! into a destination slot, and report whether the destination moved.

use std::cell::Ref;
use std::hash::Hash;

use hashbrown::{HashMap, HashSet};

use crate::basic::BasicStore;
use crate::cache::PointsToCache;
use crate::set::{KeySet, PointsToSet};
use crate::stat;
use crate::types::{PointsToId, StoreKind};

/// Key-to-id map for one location and direction.
type SlotMap<K> = HashMap<K, PointsToId>;

/// A [`BasicStore`] plus IN/OUT key-to-id maps per program location.
///
/// Locations (`L`) and keys are opaque ids. Slots are created lazily and
/// only by mutations that actually change an id; reads of absent slots
/// materialise the empty set without touching the maps.
///
/// The reverse index is not maintained for the IN/OUT maps, so
/// [`get_rev_pts`][Self::get_rev_pts] always panics on this store.
pub struct DFStore<'a, K, D, S, KS = HashSet<K>, L = u32> {
    kind: StoreKind,
    base: BasicStore<'a, K, D, S, KS>,
    /// Address-taken points-to entering each location.
    df_in: HashMap<L, SlotMap<K>>,
    /// Address-taken points-to leaving each location.
    df_out: HashMap<L, SlotMap<K>>,
}

impl<'a, K, D, S, KS, L> DFStore<'a, K, D, S, KS, L>
where
    K: Copy + Eq + Hash,
    D: Copy + Eq + Hash,
    S: PointsToSet<Item = D>,
    KS: KeySet<K>,
    L: Copy + Eq + Hash,
{
    pub fn new(cache: &'a PointsToCache<S>, track_rev: bool) -> Self {
        Self::with_kind(cache, track_rev, StoreKind::DataFlow)
    }

    pub(crate) fn with_kind(
        cache: &'a PointsToCache<S>,
        track_rev: bool,
        kind: StoreKind,
    ) -> Self {
        Self {
            kind,
            base: BasicStore::new(cache, track_rev),
            df_in: HashMap::new(),
            df_out: HashMap::new(),
        }
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub(crate) fn cache(&self) -> &'a PointsToCache<S> {
        self.base.cache()
    }

    // Top-level points-to, delegated to the embedded basic store.

    pub fn pts_id(&self, var: K) -> PointsToId {
        self.base.pts_id(var)
    }

    pub fn get_pts(&self, var: K) -> Ref<'a, S> {
        self.base.get_pts(var)
    }

    /// Reverse points-to is not maintained alongside IN/OUT maps.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn get_rev_pts(&self, _data: D) -> &KS {
        panic!("get_rev_pts: reverse points-to is not supported by data-flow stores");
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

    /// Drops every owned map: top-level, IN and OUT alike.
    pub fn clear(&mut self) {
        self.base.clear();
        self.df_in.clear();
        self.df_out.clear();
    }

    // Location queries.

    pub fn has_df_in_set(&self, loc: L) -> bool {
        self.df_in.contains_key(&loc)
    }

    pub fn has_df_out_set(&self, loc: L) -> bool {
        self.df_out.contains_key(&loc)
    }

    pub fn has_df_in_var(&self, loc: L, var: K) -> bool {
        self.df_in
            .get(&loc)
            .is_some_and(|slots| slots.contains_key(&var))
    }

    pub fn has_df_out_var(&self, loc: L, var: K) -> bool {
        self.df_out
            .get(&loc)
            .is_some_and(|slots| slots.contains_key(&var))
    }

    pub(crate) fn in_id(&self, loc: L, var: K) -> PointsToId {
        Self::slot_id(&self.df_in, loc, var)
    }

    pub(crate) fn out_id(&self, loc: L, var: K) -> PointsToId {
        Self::slot_id(&self.df_out, loc, var)
    }

    pub fn get_df_in_pts(&self, loc: L, var: K) -> Ref<'a, S> {
        self.cache().pts(self.in_id(loc, var))
    }

    pub fn get_df_out_pts(&self, loc: L, var: K) -> Ref<'a, S> {
        self.cache().pts(self.out_id(loc, var))
    }

    // Transfer operations. Each unions one source slot into one
    // destination slot and reports whether the destination id moved.

    /// `IN[dst_loc][dst_var] ∪= IN[src_loc][src_var]`.
    pub fn update_df_in_from_in(&mut self, src_loc: L, src_var: K, dst_loc: L, dst_var: K) -> bool {
        let src_id = self.in_id(src_loc, src_var);
        self.union_into_in(dst_loc, dst_var, src_id)
    }

    /// `IN[dst_loc][dst_var] ∪= OUT[src_loc][src_var]`.
    pub fn update_df_in_from_out(
        &mut self,
        src_loc: L,
        src_var: K,
        dst_loc: L,
        dst_var: K,
    ) -> bool {
        let src_id = self.out_id(src_loc, src_var);
        self.union_into_in(dst_loc, dst_var, src_id)
    }

    /// `OUT[dst_loc][dst_var] ∪= IN[src_loc][src_var]`.
    pub fn update_df_out_from_in(
        &mut self,
        src_loc: L,
        src_var: K,
        dst_loc: L,
        dst_var: K,
    ) -> bool {
        let src_id = self.in_id(src_loc, src_var);
        self.union_into_out(dst_loc, dst_var, src_id)
    }

    /// Same as [`update_df_in_from_in`][Self::update_df_in_from_in]; the
    /// distinction only matters in the incremental store.
    pub fn update_all_df_in_from_in(
        &mut self,
        src_loc: L,
        src_var: K,
        dst_loc: L,
        dst_var: K,
    ) -> bool {
        self.update_df_in_from_in(src_loc, src_var, dst_loc, dst_var)
    }

    /// Same as [`update_df_in_from_out`][Self::update_df_in_from_out]; the
    /// distinction only matters in the incremental store.
    pub fn update_all_df_in_from_out(
        &mut self,
        src_loc: L,
        src_var: K,
        dst_loc: L,
        dst_var: K,
    ) -> bool {
        self.update_df_in_from_out(src_loc, src_var, dst_loc, dst_var)
    }

    /// Projects `loc`'s IN slots onto its OUT slots, variable by variable.
    ///
    /// With `strong_update`, `singleton` is skipped: a must-alias write
    /// overwrites that variable, so its incoming value must not be joined
    /// into OUT; the store's caller writes the new value directly.
    pub fn update_all_df_out_from_in(&mut self, loc: L, singleton: K, strong_update: bool) -> bool {
        let mut changed = false;
        if let Some(slots) = self.df_in.get(&loc) {
            let vars: Vec<(K, PointsToId)> =
                slots.iter().map(|(&var, &id)| (var, id)).collect();
            for (var, src_id) in vars {
                if strong_update && var == singleton {
                    continue;
                }
                if self.union_into_out(loc, var, src_id) {
                    changed = true;
                }
            }
        }
        changed
    }

    /// Promotes `IN[src_loc][src_var]` into top-level `dst_var`.
    pub fn update_tlv_pts(&mut self, src_loc: L, src_var: K, dst_var: K) -> bool {
        let src_id = self.in_id(src_loc, src_var);
        self.base.union_pts_from_id(dst_var, src_id)
    }

    /// Flows top-level `src_var` into `OUT[dst_loc][dst_var]`.
    pub fn update_atv_pts(&mut self, src_var: K, dst_loc: L, dst_var: K) -> bool {
        let src_id = self.base.pts_id(src_var);
        self.union_into_out(dst_loc, dst_var, src_id)
    }

    /// Nothing to forget here; the incremental store overrides this.
    pub fn clear_all_df_out_updated_var(&mut self, _loc: L) {}

    // Statistics aggregate over every key-to-id map the store owns.

    fn all_ids(&self) -> impl Iterator<Item = PointsToId> + '_ {
        self.base
            .pts_ids()
            .chain(self.df_in.values().flat_map(|slots| slots.values().copied()))
            .chain(self.df_out.values().flat_map(|slots| slots.values().copied()))
    }

    pub fn top_n(&self, n: usize) -> (u64, u64) {
        stat::top_n(self.all_ids(), n)
    }

    pub fn in_use_points_to_sets(&self) -> u64 {
        stat::in_use(self.all_ids())
    }

    // Internal slot plumbing shared with the incremental store.

    fn slot_id(map: &HashMap<L, SlotMap<K>>, loc: L, var: K) -> PointsToId {
        map.get(&loc)
            .and_then(|slots| slots.get(&var))
            .copied()
            .unwrap_or(PointsToId::EMPTY)
    }

    pub(crate) fn union_into_in(&mut self, loc: L, var: K, src_id: PointsToId) -> bool {
        let old = self.in_id(loc, var);
        let new = self.cache().union(old, src_id);
        if new == old {
            return false;
        }
        self.df_in.entry(loc).or_default().insert(var, new);
        true
    }

    pub(crate) fn union_into_out(&mut self, loc: L, var: K, src_id: PointsToId) -> bool {
        let old = self.out_id(loc, var);
        let new = self.cache().union(old, src_id);
        if new == old {
            return false;
        }
        self.df_out.entry(loc).or_default().insert(var, new);
        true
    }
}
