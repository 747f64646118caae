//! Core identifier types for the points-to storage layer.

use std::fmt;

use crate::utils::MyHash;

/// A handle to an interned points-to set.
///
/// Ids are cheap value types: comparing two ids compares the sets they
/// denote, because the issuing [`PointsToCache`][crate::cache::PointsToCache]
/// hash-conses set contents. An id is only meaningful together with the
/// cache that issued it.
///
/// # Invariants
///
/// - Id 0 ([`PointsToId::EMPTY`]) always denotes the empty set, and the
///   empty set is never interned under any other id.
/// - Ids are dense: the cache issues them in allocation order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct PointsToId(u32);

impl PointsToId {
    /// The distinguished id of the empty points-to set.
    pub const EMPTY: Self = Self(0);

    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the raw index into the issuing cache.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this id denotes the empty set.
    pub const fn is_empty_set(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PointsToId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl MyHash for PointsToId {
    fn hash(&self) -> u64 {
        self.0 as u64
    }
}

/// Runtime tag distinguishing the store variants.
///
/// Callers that erase the concrete store type (see
/// [`PtData`][crate::store::PtData]) discriminate on this tag instead of
/// downcasting.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StoreKind {
    /// Plain key-to-set storage, optionally with a reverse index.
    Basic,
    /// Basic storage plus per-key diff/propagated tracking.
    Diff,
    /// Basic storage plus per-location IN/OUT maps.
    DataFlow,
    /// Data-flow storage with dirty-variable tracking.
    IncDataFlow,
    /// Two parallel basic stores over disjoint key spaces.
    Versioned,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreKind::Basic => "basic",
            StoreKind::Diff => "diff",
            StoreKind::DataFlow => "data-flow",
            StoreKind::IncDataFlow => "incremental data-flow",
            StoreKind::Versioned => "versioned",
        };
        f.write_str(name)
    }
}
