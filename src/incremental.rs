//! Incremental data-flow storage: transfers fire only off dirty sources.
//!
//! Without this, any change anywhere forces the solver to re-project every
//! variable at every location it revisits. The dirty sets record exactly
//! which IN/OUT slots moved since their last downstream consumption, so a
//! repeat visit touches only those.

use std::cell::Ref;
use std::hash::Hash;

use hashbrown::{HashMap, HashSet};

use crate::cache::PointsToCache;
use crate::dataflow::DFStore;
use crate::set::{KeySet, PointsToSet};
use crate::types::{PointsToId, StoreKind};

/// A [`DFStore`] plus per-location dirty-variable sets.
///
/// The discipline, per transfer:
///
/// - IN-to-IN and OUT-to-IN edges fire only when the source slot is dirty,
///   and mark the destination IN slot dirty on change.
/// - Projecting IN to OUT at a location *consumes* the source's IN
///   dirtiness before the union: that projection is the flag's one
///   consumer at its own location.
/// - The `update_all_*` IN-transfers ignore source dirtiness (merge points
///   re-seed destinations from scratch) but still mark destinations.
pub struct IncDFStore<'a, K, D, S, KS = HashSet<K>, L = u32> {
    df: DFStore<'a, K, D, S, KS, L>,
    /// Variables whose IN slot moved, per location.
    in_dirty: HashMap<L, KS>,
    /// Variables whose OUT slot moved, per location.
    out_dirty: HashMap<L, KS>,
}

impl<'a, K, D, S, KS, L> IncDFStore<'a, K, D, S, KS, L>
where
    K: Copy + Eq + Hash,
    D: Copy + Eq + Hash,
    S: PointsToSet<Item = D>,
    KS: KeySet<K>,
    L: Copy + Eq + Hash,
{
    pub fn new(cache: &'a PointsToCache<S>, track_rev: bool) -> Self {
        Self {
            df: DFStore::with_kind(cache, track_rev, StoreKind::IncDataFlow),
            in_dirty: HashMap::new(),
            out_dirty: HashMap::new(),
        }
    }

    pub fn kind(&self) -> StoreKind {
        self.df.kind()
    }

    // Dirty-set discipline.

    pub fn set_in_dirty(&mut self, loc: L, var: K) {
        self.in_dirty.entry(loc).or_default().insert(var);
    }

    pub fn set_out_dirty(&mut self, loc: L, var: K) {
        self.out_dirty.entry(loc).or_default().insert(var);
    }

    pub fn clear_in_dirty(&mut self, loc: L, var: K) {
        if let Some(vars) = self.in_dirty.get_mut(&loc) {
            vars.remove(var);
        }
    }

    pub fn clear_out_dirty(&mut self, loc: L, var: K) {
        if let Some(vars) = self.out_dirty.get_mut(&loc) {
            vars.remove(var);
        }
    }

    pub fn is_in_dirty(&self, loc: L, var: K) -> bool {
        self.in_dirty
            .get(&loc)
            .is_some_and(|vars| vars.contains(var))
    }

    pub fn is_out_dirty(&self, loc: L, var: K) -> bool {
        self.out_dirty
            .get(&loc)
            .is_some_and(|vars| vars.contains(var))
    }

    // Refined transfers.

    /// Fires only when the source IN slot is dirty; marks the destination
    /// IN slot dirty on change.
    pub fn update_df_in_from_in(&mut self, src_loc: L, src_var: K, dst_loc: L, dst_var: K) -> bool {
        if !self.is_in_dirty(src_loc, src_var) {
            return false;
        }
        if self.df.update_df_in_from_in(src_loc, src_var, dst_loc, dst_var) {
            self.set_in_dirty(dst_loc, dst_var);
            return true;
        }
        false
    }

    /// Fires only when the source OUT slot is dirty; marks the destination
    /// IN slot dirty on change.
    pub fn update_df_in_from_out(
        &mut self,
        src_loc: L,
        src_var: K,
        dst_loc: L,
        dst_var: K,
    ) -> bool {
        if !self.is_out_dirty(src_loc, src_var) {
            return false;
        }
        if self.df.update_df_in_from_out(src_loc, src_var, dst_loc, dst_var) {
            self.set_in_dirty(dst_loc, dst_var);
            return true;
        }
        false
    }

    /// Consumes the source's IN dirtiness, then unions; marks the
    /// destination OUT slot dirty on change.
    ///
    /// The flag is consumed *before* the union: projecting IN to OUT is
    /// what the flag was waiting for, whether or not the destination
    /// happens to grow.
    pub fn update_df_out_from_in(
        &mut self,
        src_loc: L,
        src_var: K,
        dst_loc: L,
        dst_var: K,
    ) -> bool {
        if !self.is_in_dirty(src_loc, src_var) {
            return false;
        }
        self.clear_in_dirty(src_loc, src_var);
        if self.df.update_df_out_from_in(src_loc, src_var, dst_loc, dst_var) {
            self.set_out_dirty(dst_loc, dst_var);
            return true;
        }
        false
    }

    /// Unions regardless of source dirtiness; marks the destination IN
    /// slot dirty on change. For merge points that re-seed destinations.
    pub fn update_all_df_in_from_in(
        &mut self,
        src_loc: L,
        src_var: K,
        dst_loc: L,
        dst_var: K,
    ) -> bool {
        if self.df.update_df_in_from_in(src_loc, src_var, dst_loc, dst_var) {
            self.set_in_dirty(dst_loc, dst_var);
            return true;
        }
        false
    }

    /// Unions regardless of source dirtiness; marks the destination IN
    /// slot dirty on change.
    pub fn update_all_df_in_from_out(
        &mut self,
        src_loc: L,
        src_var: K,
        dst_loc: L,
        dst_var: K,
    ) -> bool {
        if self.df.update_df_in_from_out(src_loc, src_var, dst_loc, dst_var) {
            self.set_in_dirty(dst_loc, dst_var);
            return true;
        }
        false
    }

    /// Projects only the variables whose IN slot is dirty at `loc`,
    /// honouring strong updates. The dirty set is snapshotted first: each
    /// projection consumes its own flag.
    pub fn update_all_df_out_from_in(&mut self, loc: L, singleton: K, strong_update: bool) -> bool {
        let mut changed = false;
        if self.df.has_df_in_set(loc) {
            let Some(vars) = self.in_dirty.get(&loc).cloned() else {
                return false;
            };
            for var in vars.iter() {
                if strong_update && var == singleton {
                    continue;
                }
                if self.update_df_out_from_in(loc, var, loc, var) {
                    changed = true;
                }
            }
        }
        changed
    }

    /// Promotes a dirty IN slot into top-level `dst_var`, consuming the
    /// flag. Top-level variables carry no location, so nothing is marked.
    pub fn update_tlv_pts(&mut self, src_loc: L, src_var: K, dst_var: K) -> bool {
        if !self.is_in_dirty(src_loc, src_var) {
            return false;
        }
        self.clear_in_dirty(src_loc, src_var);
        self.df.update_tlv_pts(src_loc, src_var, dst_var)
    }

    /// Flows top-level `src_var` into an OUT slot; marks it dirty on
    /// change. Unconditional: top-level sources carry no dirty flag.
    pub fn update_atv_pts(&mut self, src_var: K, dst_loc: L, dst_var: K) -> bool {
        if self.df.update_atv_pts(src_var, dst_loc, dst_var) {
            self.set_out_dirty(dst_loc, dst_var);
            return true;
        }
        false
    }

    /// Forgets `loc`'s OUT dirtiness; called once a downstream consumer
    /// has read the location's OUT slots.
    pub fn clear_all_df_out_updated_var(&mut self, loc: L) {
        if let Some(vars) = self.out_dirty.get_mut(&loc) {
            vars.clear();
        }
    }

    // The rest of the data-flow surface, delegated.

    pub fn pts_id(&self, var: K) -> PointsToId {
        self.df.pts_id(var)
    }

    pub fn get_pts(&self, var: K) -> Ref<'a, S> {
        self.df.get_pts(var)
    }

    /// # Panics
    ///
    /// Always; see [`DFStore::get_rev_pts`].
    pub fn get_rev_pts(&self, data: D) -> &KS {
        self.df.get_rev_pts(data)
    }

    pub fn add_pts(&mut self, dst: K, element: D) -> bool {
        self.df.add_pts(dst, element)
    }

    pub fn union_pts(&mut self, dst: K, src: K) -> bool {
        self.df.union_pts(dst, src)
    }

    pub fn union_pts_set(&mut self, dst: K, src: &S) -> bool {
        self.df.union_pts_set(dst, src)
    }

    pub fn clear_pts(&mut self, var: K, element: D) {
        self.df.clear_pts(var, element)
    }

    pub fn clear_full_pts(&mut self, var: K) {
        self.df.clear_full_pts(var)
    }

    pub fn has_df_in_set(&self, loc: L) -> bool {
        self.df.has_df_in_set(loc)
    }

    pub fn has_df_out_set(&self, loc: L) -> bool {
        self.df.has_df_out_set(loc)
    }

    pub fn has_df_in_var(&self, loc: L, var: K) -> bool {
        self.df.has_df_in_var(loc, var)
    }

    pub fn has_df_out_var(&self, loc: L, var: K) -> bool {
        self.df.has_df_out_var(loc, var)
    }

    pub fn get_df_in_pts(&self, loc: L, var: K) -> Ref<'a, S> {
        self.df.get_df_in_pts(loc, var)
    }

    pub fn get_df_out_pts(&self, loc: L, var: K) -> Ref<'a, S> {
        self.df.get_df_out_pts(loc, var)
    }

    pub fn top_n(&self, n: usize) -> (u64, u64) {
        self.df.top_n(n)
    }

    pub fn in_use_points_to_sets(&self) -> u64 {
        self.df.in_use_points_to_sets()
    }

    /// Drops every owned map, dirty sets included.
    pub fn clear(&mut self) {
        self.df.clear();
        self.in_dirty.clear();
        self.out_dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::BitSet;

    type Inc<'a> = IncDFStore<'a, u32, u32, BitSet>;
    type Df<'a> = DFStore<'a, u32, u32, BitSet>;

    fn set(items: &[u32]) -> BitSet {
        items.iter().copied().collect()
    }

    fn seed_out(store: &mut Inc, loc: u32, var: u32, items: &[u32]) {
        let scratch = 1000 + var;
        store.union_pts_set(scratch, &set(items));
        assert!(store.update_atv_pts(scratch, loc, var));
    }

    #[test]
    fn test_clean_source_is_skipped() {
        let cache = PointsToCache::default();
        let mut store: Inc = IncDFStore::new(&cache, false);
        let (l1, l2, v) = (1, 2, 5);

        seed_out(&mut store, 0, v, &[1]);
        assert!(store.update_df_in_from_out(0, v, l1, v));
        assert!(store.is_in_dirty(l1, v));

        // Drop the flag: the slot still holds {1} but is no longer dirty.
        store.clear_in_dirty(l1, v);
        assert!(!store.update_df_in_from_in(l1, v, l2, v));
        assert!(store.get_df_in_pts(l2, v).is_empty());
        assert!(!store.has_df_in_var(l2, v));
    }

    #[test]
    fn test_dirty_source_propagates_and_marks() {
        let cache = PointsToCache::default();
        let mut store: Inc = IncDFStore::new(&cache, false);
        let (l1, l2, v) = (1, 2, 5);

        seed_out(&mut store, 0, v, &[1, 2]);
        assert!(store.is_out_dirty(0, v));
        assert!(store.update_df_in_from_out(0, v, l1, v));
        assert!(store.is_in_dirty(l1, v));

        assert!(store.update_df_in_from_in(l1, v, l2, v));
        assert!(store.is_in_dirty(l2, v));
        assert_eq!(*store.get_df_in_pts(l2, v), set(&[1, 2]));
    }

    #[test]
    fn test_out_projection_consumes_in_flag() {
        let cache = PointsToCache::default();
        let mut store: Inc = IncDFStore::new(&cache, false);
        let (l, v) = (1, 5);

        seed_out(&mut store, 0, v, &[1]);
        store.update_df_in_from_out(0, v, l, v);
        assert!(store.is_in_dirty(l, v));

        assert!(store.update_df_out_from_in(l, v, l, v));
        assert!(!store.is_in_dirty(l, v));
        assert!(store.is_out_dirty(l, v));

        // Consumed: a second projection does nothing.
        assert!(!store.update_df_out_from_in(l, v, l, v));
    }

    #[test]
    fn test_all_in_variants_ignore_dirtiness() {
        let cache = PointsToCache::default();
        let mut store: Inc = IncDFStore::new(&cache, false);
        let (l1, l2, v) = (1, 2, 5);

        seed_out(&mut store, 0, v, &[1]);
        store.update_df_in_from_out(0, v, l1, v);
        store.clear_in_dirty(l1, v);
        store.clear_out_dirty(0, v);

        // Plain transfers refuse; the "all" variants re-seed regardless.
        assert!(!store.update_df_in_from_in(l1, v, l2, v));
        assert!(store.update_all_df_in_from_in(l1, v, l2, v));
        assert!(store.is_in_dirty(l2, v));

        assert!(store.update_all_df_in_from_out(0, v, 3, v));
        assert!(store.is_in_dirty(3, v));
    }

    #[test]
    fn test_all_out_projection_visits_only_dirty() {
        let cache = PointsToCache::default();
        let mut store: Inc = IncDFStore::new(&cache, false);
        let (l, v, w) = (1, 5, 6);

        seed_out(&mut store, 0, v, &[1]);
        seed_out(&mut store, 0, w, &[2]);
        store.update_df_in_from_out(0, v, l, v);
        store.update_df_in_from_out(0, w, l, w);

        // Only w stays dirty.
        store.clear_in_dirty(l, v);
        assert!(store.update_all_df_out_from_in(l, 0, false));

        assert!(store.get_df_out_pts(l, v).is_empty());
        assert_eq!(*store.get_df_out_pts(l, w), set(&[2]));
        assert!(!store.is_in_dirty(l, w));
    }

    #[test]
    fn test_strong_update_keeps_singleton_flag() {
        let cache = PointsToCache::default();
        let mut store: Inc = IncDFStore::new(&cache, false);
        let (l, v, w) = (1, 5, 6);

        seed_out(&mut store, 0, v, &[1]);
        seed_out(&mut store, 0, w, &[2]);
        store.update_df_in_from_out(0, v, l, v);
        store.update_df_in_from_out(0, w, l, w);

        assert!(store.update_all_df_out_from_in(l, v, true));
        assert!(store.get_df_out_pts(l, v).is_empty());
        assert_eq!(*store.get_df_out_pts(l, w), set(&[2]));
        // The skipped singleton keeps its IN dirtiness for later passes.
        assert!(store.is_in_dirty(l, v));
        assert!(!store.is_in_dirty(l, w));
    }

    #[test]
    fn test_tlv_promotion_consumes_flag() {
        let cache = PointsToCache::default();
        let mut store: Inc = IncDFStore::new(&cache, false);
        let (l, v, top) = (1, 5, 7);

        seed_out(&mut store, 0, v, &[1, 2]);
        store.update_df_in_from_out(0, v, l, v);

        assert!(store.update_tlv_pts(l, v, top));
        assert_eq!(*store.get_pts(top), set(&[1, 2]));
        assert!(!store.is_in_dirty(l, v));
        assert!(!store.update_tlv_pts(l, v, top));
    }

    #[test]
    fn test_clear_out_updated_vars() {
        let cache = PointsToCache::default();
        let mut store: Inc = IncDFStore::new(&cache, false);

        seed_out(&mut store, 0, 5, &[1]);
        seed_out(&mut store, 0, 6, &[2]);
        assert!(store.is_out_dirty(0, 5));
        assert!(store.is_out_dirty(0, 6));

        store.clear_all_df_out_updated_var(0);
        assert!(!store.is_out_dirty(0, 5));
        assert!(!store.is_out_dirty(0, 6));
        // The slots themselves survive.
        assert!(store.has_df_out_var(0, 5));
    }

    #[test]
    fn test_clear_drops_dirty_sets() {
        let cache = PointsToCache::default();
        let mut store: Inc = IncDFStore::new(&cache, false);

        seed_out(&mut store, 0, 5, &[1]);
        store.update_df_in_from_out(0, 5, 1, 5);
        store.clear();

        assert!(!store.has_df_out_set(0));
        assert!(!store.is_out_dirty(0, 5));
        assert!(!store.is_in_dirty(1, 5));
        assert_eq!(store.kind(), StoreKind::IncDataFlow);
    }

    /// Drives the same two-phase worklist schedule over a plain and an
    /// incremental store sharing one cache; at fixpoint every slot must
    /// hold the identical id.
    #[test]
    fn test_fixpoint_matches_plain_dataflow() {
        let cache = PointsToCache::default();
        let mut plain: Df = DFStore::new(&cache, false);
        let mut inc: Inc = IncDFStore::new(&cache, false);

        // A diamond: 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3.
        let edges = [(0u32, 1u32), (0, 2), (1, 3), (2, 3)];
        let locs = [0u32, 1, 2, 3];
        let vars = [10u32, 11, 12];

        // Seed OUT[0] from top-level variables.
        for (i, &v) in vars.iter().enumerate() {
            let top = 100 + v;
            plain.union_pts_set(top, &set(&[i as u32 + 1, 40 + i as u32]));
            inc.union_pts_set(top, &set(&[i as u32 + 1, 40 + i as u32]));
            plain.update_atv_pts(top, 0, v);
            inc.update_atv_pts(top, 0, v);
        }

        loop {
            let mut changed = false;
            for &(src, dst) in &edges {
                for &v in &vars {
                    changed |= plain.update_df_in_from_out(src, v, dst, v);
                    changed |= inc.update_df_in_from_out(src, v, dst, v);
                }
            }
            // Locations 0..=2 project IN to OUT; location 3 is a load, so
            // its IN dirtiness has exactly one consumer: the promotion.
            for &l in &locs[..3] {
                changed |= plain.update_all_df_out_from_in(l, vars[0], false);
                changed |= inc.update_all_df_out_from_in(l, vars[0], false);
            }
            for &v in &vars {
                changed |= plain.update_tlv_pts(3, v, 200 + v);
                changed |= inc.update_tlv_pts(3, v, 200 + v);
            }
            if !changed {
                break;
            }
        }

        for &l in &locs {
            for &v in &vars {
                assert_eq!(
                    *plain.get_df_in_pts(l, v),
                    *inc.get_df_in_pts(l, v),
                    "IN mismatch at location {l}, variable {v}"
                );
                assert_eq!(
                    *plain.get_df_out_pts(l, v),
                    *inc.get_df_out_pts(l, v),
                    "OUT mismatch at location {l}, variable {v}"
                );
            }
        }
        for &v in &vars {
            assert_eq!(*plain.get_pts(200 + v), *inc.get_pts(200 + v));
        }
    }
}
