//! Capability traits for the set types the store family is generic over.
//!
//! A store is parameterised by a points-to set type (the sets being
//! interned) and a key set type (the reverse index and dirty sets). The
//! traits here name the minimum each must provide; [`BitSet`][crate::bitset::BitSet]
//! is the intended points-to set for dense `u32` object ids, and
//! `hashbrown::HashSet` covers both roles for arbitrary `Copy` ids.

use std::hash::Hash;
use std::iter::Copied;

use hashbrown::{hash_set, HashSet};

use crate::utils::{mix64, MyHash};

/// A value-typed set of abstract objects, suitable for interning.
///
/// `Eq` and [`MyHash`] must agree on *contents*: two sets holding the same
/// members compare equal and hash identically no matter how they were
/// built. The interner relies on this to hand equal sets the same id.
pub trait PointsToSet: Clone + Eq + MyHash {
    type Item: Copy;
    type Iter<'a>: Iterator<Item = Self::Item>
    where
        Self: 'a;

    fn empty() -> Self;
    fn singleton(item: Self::Item) -> Self;

    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn contains(&self, item: Self::Item) -> bool;

    /// Returns whether the item was newly inserted.
    fn insert(&mut self, item: Self::Item) -> bool;
    /// Returns whether the item was present.
    fn remove(&mut self, item: Self::Item) -> bool;

    fn iter(&self) -> Self::Iter<'_>;

    /// `self |= other`. Returns whether `self` changed.
    fn union_with(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for item in other.iter() {
            changed |= self.insert(item);
        }
        changed
    }

    /// `self &= other`. Returns whether `self` changed.
    fn intersect_with(&mut self, other: &Self) -> bool {
        let gone: Vec<_> = self.iter().filter(|&item| !other.contains(item)).collect();
        for item in &gone {
            self.remove(*item);
        }
        !gone.is_empty()
    }

    /// `self -= other`. Returns whether `self` changed.
    fn subtract(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for item in other.iter() {
            changed |= self.remove(item);
        }
        changed
    }
}

impl<D> PointsToSet for HashSet<D>
where
    D: Copy + Eq + Hash + MyHash,
{
    type Item = D;
    type Iter<'a>
        = Copied<hash_set::Iter<'a, D>>
    where
        Self: 'a;

    fn empty() -> Self {
        HashSet::new()
    }

    fn singleton(item: D) -> Self {
        let mut set = HashSet::with_capacity(1);
        set.insert(item);
        set
    }

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn contains(&self, item: D) -> bool {
        HashSet::contains(self, &item)
    }

    fn insert(&mut self, item: D) -> bool {
        HashSet::insert(self, item)
    }

    fn remove(&mut self, item: D) -> bool {
        HashSet::remove(self, &item)
    }

    fn iter(&self) -> Self::Iter<'_> {
        HashSet::iter(self).copied()
    }
}

// Order-independent: items are mixed individually and folded with XOR.
impl<D> MyHash for HashSet<D>
where
    D: Copy + Eq + Hash + MyHash,
{
    fn hash(&self) -> u64 {
        let mut h = 0u64;
        for item in self {
            h ^= mix64(MyHash::hash(item));
        }
        h
    }
}

/// A set of store keys: the reverse index and the dirty-variable sets.
pub trait KeySet<K>: Default + Clone {
    type Iter<'a>: Iterator<Item = K>
    where
        Self: 'a,
        K: 'a;

    /// Returns whether the key was newly inserted.
    fn insert(&mut self, key: K) -> bool;
    /// Returns whether the key was present.
    fn remove(&mut self, key: K) -> bool;
    fn contains(&self, key: K) -> bool;

    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn clear(&mut self);

    fn iter(&self) -> Self::Iter<'_>;
}

impl<K> KeySet<K> for HashSet<K>
where
    K: Copy + Eq + Hash,
{
    type Iter<'a>
        = Copied<hash_set::Iter<'a, K>>
    where
        Self: 'a,
        K: 'a;

    fn insert(&mut self, key: K) -> bool {
        HashSet::insert(self, key)
    }

    fn remove(&mut self, key: K) -> bool {
        HashSet::remove(self, &key)
    }

    fn contains(&self, key: K) -> bool {
        HashSet::contains(self, &key)
    }

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn clear(&mut self) {
        HashSet::clear(self)
    }

    fn iter(&self) -> Self::Iter<'_> {
        HashSet::iter(self).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashset_points_to_set() {
        let mut a: HashSet<u32> = PointsToSet::singleton(1);
        assert!(PointsToSet::insert(&mut a, 2));
        assert!(!PointsToSet::insert(&mut a, 2));
        assert_eq!(PointsToSet::len(&a), 2);
        assert!(PointsToSet::contains(&a, 1));

        let b: HashSet<u32> = PointsToSet::singleton(3);
        assert!(a.union_with(&b));
        assert!(!a.union_with(&b));
        assert_eq!(PointsToSet::len(&a), 3);
    }

    #[test]
    fn test_hashset_algebra_defaults() {
        let mut a: HashSet<u32> = [1, 2, 3].into_iter().collect();
        let b: HashSet<u32> = [2, 3, 4].into_iter().collect();

        let mut i = a.clone();
        assert!(i.intersect_with(&b));
        assert_eq!(i, [2, 3].into_iter().collect());

        assert!(a.subtract(&b));
        assert_eq!(a, [1].into_iter().collect());
        assert!(!a.subtract(&b));
    }

    #[test]
    fn test_hashset_hash_order_independent() {
        let a: HashSet<u32> = [1, 2, 3].into_iter().collect();
        let b: HashSet<u32> = [3, 1, 2].into_iter().collect();
        assert_eq!(MyHash::hash(&a), MyHash::hash(&b));

        let c: HashSet<u32> = [1, 2].into_iter().collect();
        assert_ne!(MyHash::hash(&a), MyHash::hash(&c));
    }

    #[test]
    fn test_hashset_key_set() {
        let mut ks: HashSet<u32> = Default::default();
        assert!(KeySet::insert(&mut ks, 7));
        assert!(KeySet::contains(&ks, 7));
        assert!(KeySet::remove(&mut ks, 7));
        assert!(!KeySet::remove(&mut ks, 7));
        assert!(KeySet::is_empty(&ks));
    }
}
