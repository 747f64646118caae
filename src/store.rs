//! Type-erased handle over the store family.
//!
//! A solver that picks its store at startup (from options, say) holds a
//! [`PtData`] and matches on [`StoreKind`] where behaviour diverges,
//! instead of downcasting through a class hierarchy. The shared basic
//! surface dispatches here; variant-specific operations are reached
//! through the `as_*` accessors.

use std::cell::Ref;
use std::hash::Hash;

use hashbrown::HashSet;

use crate::basic::BasicStore;
use crate::dataflow::DFStore;
use crate::diff::DiffStore;
use crate::incremental::IncDFStore;
use crate::set::{KeySet, PointsToSet};
use crate::types::StoreKind;
use crate::versioned::VersionedStore;

/// One of the five store variants, tagged by [`StoreKind`].
pub enum PtData<'a, K, D, S, KS = HashSet<K>, L = u32, VK = K, VKS = KS> {
    Basic(BasicStore<'a, K, D, S, KS>),
    Diff(DiffStore<'a, K, D, S, KS>),
    DataFlow(DFStore<'a, K, D, S, KS, L>),
    IncDataFlow(IncDFStore<'a, K, D, S, KS, L>),
    Versioned(VersionedStore<'a, K, D, S, KS, VK, VKS>),
}

impl<'a, K, D, S, KS, L, VK, VKS> PtData<'a, K, D, S, KS, L, VK, VKS>
where
    K: Copy + Eq + Hash,
    D: Copy + Eq + Hash,
    S: PointsToSet<Item = D>,
    KS: KeySet<K>,
    L: Copy + Eq + Hash,
    VK: Copy + Eq + Hash,
    VKS: KeySet<VK>,
{
    pub fn kind(&self) -> StoreKind {
        match self {
            PtData::Basic(store) => store.kind(),
            PtData::Diff(store) => store.kind(),
            PtData::DataFlow(store) => store.kind(),
            PtData::IncDataFlow(store) => store.kind(),
            PtData::Versioned(store) => store.kind(),
        }
    }

    pub fn get_pts(&self, var: K) -> Ref<'a, S> {
        match self {
            PtData::Basic(store) => store.get_pts(var),
            PtData::Diff(store) => store.get_pts(var),
            PtData::DataFlow(store) => store.get_pts(var),
            PtData::IncDataFlow(store) => store.get_pts(var),
            PtData::Versioned(store) => store.get_pts(var),
        }
    }

    /// # Panics
    ///
    /// Panics when the variant does not maintain a reverse index: always
    /// for the data-flow variants, and for the others when built without
    /// reverse tracking.
    pub fn get_rev_pts(&self, data: D) -> &KS {
        match self {
            PtData::Basic(store) => store.get_rev_pts(data),
            PtData::Diff(store) => store.get_rev_pts(data),
            PtData::DataFlow(store) => store.get_rev_pts(data),
            PtData::IncDataFlow(store) => store.get_rev_pts(data),
            PtData::Versioned(store) => store.get_rev_pts(data),
        }
    }

    pub fn add_pts(&mut self, dst: K, element: D) -> bool {
        match self {
            PtData::Basic(store) => store.add_pts(dst, element),
            PtData::Diff(store) => store.add_pts(dst, element),
            PtData::DataFlow(store) => store.add_pts(dst, element),
            PtData::IncDataFlow(store) => store.add_pts(dst, element),
            PtData::Versioned(store) => store.add_pts(dst, element),
        }
    }

    pub fn union_pts(&mut self, dst: K, src: K) -> bool {
        match self {
            PtData::Basic(store) => store.union_pts(dst, src),
            PtData::Diff(store) => store.union_pts(dst, src),
            PtData::DataFlow(store) => store.union_pts(dst, src),
            PtData::IncDataFlow(store) => store.union_pts(dst, src),
            PtData::Versioned(store) => store.union_pts(dst, src),
        }
    }

    pub fn union_pts_set(&mut self, dst: K, src: &S) -> bool {
        match self {
            PtData::Basic(store) => store.union_pts_set(dst, src),
            PtData::Diff(store) => store.union_pts_set(dst, src),
            PtData::DataFlow(store) => store.union_pts_set(dst, src),
            PtData::IncDataFlow(store) => store.union_pts_set(dst, src),
            PtData::Versioned(store) => store.union_pts_set(dst, src),
        }
    }

    pub fn clear_pts(&mut self, var: K, element: D) {
        match self {
            PtData::Basic(store) => store.clear_pts(var, element),
            PtData::Diff(store) => store.clear_pts(var, element),
            PtData::DataFlow(store) => store.clear_pts(var, element),
            PtData::IncDataFlow(store) => store.clear_pts(var, element),
            PtData::Versioned(store) => store.clear_pts(var, element),
        }
    }

    pub fn clear_full_pts(&mut self, var: K) {
        match self {
            PtData::Basic(store) => store.clear_full_pts(var),
            PtData::Diff(store) => store.clear_full_pts(var),
            PtData::DataFlow(store) => store.clear_full_pts(var),
            PtData::IncDataFlow(store) => store.clear_full_pts(var),
            PtData::Versioned(store) => store.clear_full_pts(var),
        }
    }

    pub fn clear(&mut self) {
        match self {
            PtData::Basic(store) => store.clear(),
            PtData::Diff(store) => store.clear(),
            PtData::DataFlow(store) => store.clear(),
            PtData::IncDataFlow(store) => store.clear(),
            PtData::Versioned(store) => store.clear(),
        }
    }

    pub fn top_n(&self, n: usize) -> (u64, u64) {
        match self {
            PtData::Basic(store) => store.top_n(n),
            PtData::Diff(store) => store.top_n(n),
            PtData::DataFlow(store) => store.top_n(n),
            PtData::IncDataFlow(store) => store.top_n(n),
            PtData::Versioned(store) => store.top_n(n),
        }
    }

    pub fn in_use_points_to_sets(&self) -> u64 {
        match self {
            PtData::Basic(store) => store.in_use_points_to_sets(),
            PtData::Diff(store) => store.in_use_points_to_sets(),
            PtData::DataFlow(store) => store.in_use_points_to_sets(),
            PtData::IncDataFlow(store) => store.in_use_points_to_sets(),
            PtData::Versioned(store) => store.in_use_points_to_sets(),
        }
    }

    // Variant accessors: the tagged-union rendering of downcasts.

    pub fn as_basic(&self) -> Option<&BasicStore<'a, K, D, S, KS>> {
        match self {
            PtData::Basic(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_basic_mut(&mut self) -> Option<&mut BasicStore<'a, K, D, S, KS>> {
        match self {
            PtData::Basic(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_diff(&self) -> Option<&DiffStore<'a, K, D, S, KS>> {
        match self {
            PtData::Diff(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_diff_mut(&mut self) -> Option<&mut DiffStore<'a, K, D, S, KS>> {
        match self {
            PtData::Diff(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_data_flow(&self) -> Option<&DFStore<'a, K, D, S, KS, L>> {
        match self {
            PtData::DataFlow(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_data_flow_mut(&mut self) -> Option<&mut DFStore<'a, K, D, S, KS, L>> {
        match self {
            PtData::DataFlow(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_inc_data_flow(&self) -> Option<&IncDFStore<'a, K, D, S, KS, L>> {
        match self {
            PtData::IncDataFlow(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_inc_data_flow_mut(&mut self) -> Option<&mut IncDFStore<'a, K, D, S, KS, L>> {
        match self {
            PtData::IncDataFlow(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_versioned(&self) -> Option<&VersionedStore<'a, K, D, S, KS, VK, VKS>> {
        match self {
            PtData::Versioned(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_versioned_mut(&mut self) -> Option<&mut VersionedStore<'a, K, D, S, KS, VK, VKS>> {
        match self {
            PtData::Versioned(store) => Some(store),
            _ => None,
        }
    }
}

impl<'a, K, D, S, KS, L, VK, VKS> From<BasicStore<'a, K, D, S, KS>>
    for PtData<'a, K, D, S, KS, L, VK, VKS>
{
    fn from(store: BasicStore<'a, K, D, S, KS>) -> Self {
        PtData::Basic(store)
    }
}

impl<'a, K, D, S, KS, L, VK, VKS> From<DiffStore<'a, K, D, S, KS>>
    for PtData<'a, K, D, S, KS, L, VK, VKS>
{
    fn from(store: DiffStore<'a, K, D, S, KS>) -> Self {
        PtData::Diff(store)
    }
}

impl<'a, K, D, S, KS, L, VK, VKS> From<DFStore<'a, K, D, S, KS, L>>
    for PtData<'a, K, D, S, KS, L, VK, VKS>
{
    fn from(store: DFStore<'a, K, D, S, KS, L>) -> Self {
        PtData::DataFlow(store)
    }
}

impl<'a, K, D, S, KS, L, VK, VKS> From<IncDFStore<'a, K, D, S, KS, L>>
    for PtData<'a, K, D, S, KS, L, VK, VKS>
{
    fn from(store: IncDFStore<'a, K, D, S, KS, L>) -> Self {
        PtData::IncDataFlow(store)
    }
}

impl<'a, K, D, S, KS, L, VK, VKS> From<VersionedStore<'a, K, D, S, KS, VK, VKS>>
    for PtData<'a, K, D, S, KS, L, VK, VKS>
{
    fn from(store: VersionedStore<'a, K, D, S, KS, VK, VKS>) -> Self {
        PtData::Versioned(store)
    }
}
