//! The interning cache behind every points-to store.
//!
//! A [`PointsToCache`] owns each distinct points-to set exactly once and
//! hands out dense integer ids ([`PointsToId`]) in their place. Stores keep
//! only key-to-id maps; set algebra (union, intersection, complement) runs
//! over ids and is memoised, so a repeated operation on the same operands
//! is a single table lookup.
//!
//! The cache is append-only: interned sets are never dropped, which is
//! what makes ids stable for the cache's whole lifetime. Interior
//! mutability lets any number of stores share one cache through a plain
//! `&PointsToCache` for as long as the cache lives; the usual exclusive-
//! access discipline applies (one mutating caller at a time).

use std::cell::{Ref, RefCell};
use std::cmp::{max, min};

use hashbrown::HashMap;
use log::debug;

use crate::memo::MemoCache;
use crate::set::PointsToSet;
use crate::types::PointsToId;
use crate::utils::MyHash;

/// Memo key for a binary set operation over ids.
///
/// Union and intersection are commutative, so their constructors order the
/// operands; one table entry then serves both argument orders.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OpKey {
    Union(PointsToId, PointsToId),
    Intersect(PointsToId, PointsToId),
    Complement(PointsToId, PointsToId),
}

impl OpKey {
    pub fn union(a: PointsToId, b: PointsToId) -> Self {
        OpKey::Union(min(a, b), max(a, b))
    }

    pub fn intersect(a: PointsToId, b: PointsToId) -> Self {
        OpKey::Intersect(min(a, b), max(a, b))
    }

    pub fn complement(a: PointsToId, b: PointsToId) -> Self {
        OpKey::Complement(a, b)
    }
}

/// Hash-consing store for points-to sets, with memoised algebra over ids.
///
/// The empty set is interned at construction and always answers to
/// [`PointsToId::EMPTY`]; no other id ever denotes it.
pub struct PointsToCache<S> {
    /// Id to set. Append-only.
    sets: RefCell<Vec<S>>,
    /// Content hash to candidate ids; candidates are disambiguated by `Eq`.
    buckets: RefCell<HashMap<u64, Vec<PointsToId>>>,
    /// Memoised results of the binary operations.
    memo: RefCell<MemoCache<OpKey, PointsToId>>,
}

impl<S: PointsToSet> PointsToCache<S> {
    /// Creates a cache whose memo table is pre-allocated for `2^bits` entries.
    pub fn new(memo_bits: usize) -> Self {
        let cache = Self {
            sets: RefCell::new(Vec::new()),
            buckets: RefCell::new(HashMap::new()),
            memo: RefCell::new(MemoCache::new(memo_bits)),
        };
        let empty = cache.insert_new(S::empty());
        assert_eq!(empty, PointsToId::EMPTY);
        cache
    }

    /// The distinguished id of the empty set.
    pub const fn empty_id() -> PointsToId {
        PointsToId::EMPTY
    }

    /// Number of distinct sets interned so far (the empty set included).
    pub fn len(&self) -> usize {
        self.sets.borrow().len()
    }

    /// Always false: the empty set is interned at construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Memo-table hit count, for diagnostics.
    pub fn memo_hits(&self) -> usize {
        self.memo.borrow().hits()
    }

    /// Memo-table miss count, for diagnostics.
    pub fn memo_misses(&self) -> usize {
        self.memo.borrow().misses()
    }

    /// Materialises `id`.
    ///
    /// The returned guard borrows the cache's storage: it must be dropped
    /// before the next call that interns (any store mutation may intern).
    /// Holding it across one is reported as a borrow panic.
    pub fn pts(&self, id: PointsToId) -> Ref<'_, S> {
        let sets = self.sets.borrow();
        assert!(
            id.index() < sets.len(),
            "points-to id {} was not issued by this cache",
            id
        );
        Ref::map(sets, |sets| &sets[id.index()])
    }

    /// Interns `set`, returning the id every equal set shares.
    pub fn intern(&self, set: &S) -> PointsToId {
        if set.is_empty() {
            return PointsToId::EMPTY;
        }
        if let Some(id) = self.find(set) {
            return id;
        }
        self.insert_new(set.clone())
    }

    /// `a ∪ b`.
    pub fn union(&self, a: PointsToId, b: PointsToId) -> PointsToId {
        if a == b || b.is_empty_set() {
            return a;
        }
        if a.is_empty_set() {
            return b;
        }

        let key = OpKey::union(a, b);
        if let Some(&res) = self.memo.borrow().get(&key) {
            return res;
        }

        let result = {
            let sets = self.sets.borrow();
            let mut result = sets[a.index()].clone();
            if !result.union_with(&sets[b.index()]) {
                // b ⊆ a
                drop(sets);
                self.memo.borrow_mut().insert(key, a);
                return a;
            }
            result
        };

        let res = self.intern_owned(result);
        debug!("union({}, {}) -> {}", a, b, res);
        self.memo.borrow_mut().insert(key, res);
        res
    }

    /// `a ∩ b`.
    pub fn intersect(&self, a: PointsToId, b: PointsToId) -> PointsToId {
        if a.is_empty_set() || b.is_empty_set() {
            return PointsToId::EMPTY;
        }
        if a == b {
            return a;
        }

        let key = OpKey::intersect(a, b);
        if let Some(&res) = self.memo.borrow().get(&key) {
            return res;
        }

        let result = {
            let sets = self.sets.borrow();
            let mut result = sets[a.index()].clone();
            if !result.intersect_with(&sets[b.index()]) {
                // a ⊆ b
                drop(sets);
                self.memo.borrow_mut().insert(key, a);
                return a;
            }
            result
        };

        let res = self.intern_owned(result);
        debug!("intersect({}, {}) -> {}", a, b, res);
        self.memo.borrow_mut().insert(key, res);
        res
    }

    /// `a \ b`.
    pub fn complement(&self, a: PointsToId, b: PointsToId) -> PointsToId {
        if a == b || a.is_empty_set() {
            return PointsToId::EMPTY;
        }
        if b.is_empty_set() {
            return a;
        }

        let key = OpKey::complement(a, b);
        if let Some(&res) = self.memo.borrow().get(&key) {
            return res;
        }

        let result = {
            let sets = self.sets.borrow();
            let mut result = sets[a.index()].clone();
            if !result.subtract(&sets[b.index()]) {
                // Disjoint
                drop(sets);
                self.memo.borrow_mut().insert(key, a);
                return a;
            }
            result
        };

        let res = self.intern_owned(result);
        debug!("complement({}, {}) -> {}", a, b, res);
        self.memo.borrow_mut().insert(key, res);
        res
    }

    /// Interning entry point for op results: the set is already owned, so
    /// a hit costs no clone.
    fn intern_owned(&self, set: S) -> PointsToId {
        if set.is_empty() {
            return PointsToId::EMPTY;
        }
        if let Some(id) = self.find(&set) {
            return id;
        }
        self.insert_new(set)
    }

    /// Scans the bucket for `set`'s content hash.
    fn find(&self, set: &S) -> Option<PointsToId> {
        let sets = self.sets.borrow();
        let buckets = self.buckets.borrow();
        let candidates = buckets.get(&MyHash::hash(set))?;
        candidates
            .iter()
            .copied()
            .find(|id| sets[id.index()] == *set)
    }

    /// Appends a set known to be absent and registers it in its bucket.
    fn insert_new(&self, set: S) -> PointsToId {
        let hash = MyHash::hash(&set);
        let mut sets = self.sets.borrow_mut();
        let id = PointsToId::from_index(sets.len());
        debug!("interned new points-to set {} ({} members)", id, set.len());
        sets.push(set);
        self.buckets.borrow_mut().entry(hash).or_default().push(id);
        id
    }
}

impl<S: PointsToSet> Default for PointsToCache<S> {
    fn default() -> Self {
        Self::new(16)
    }
}
