//! # pts-rs: Persistent Points-To Storage in Rust
//!
//! **`pts-rs`** is a storage layer for static pointer analysis. It maps
//! pointer variables to **interned points-to sets**: every distinct set is
//! held exactly once by a shared cache, variables carry cheap integer ids,
//! and set algebra over ids is memoised.
//!
//! ## Why interning?
//!
//! Whole-program pointer analysis produces billions of set-valued
//! assignments that are hugely redundant --- many variables point to
//! identical sets, and a worklist solver recomputes the same unions over
//! and over. Hash-consing the sets makes equality an integer comparison,
//! storage proportional to the number of *distinct* sets, and repeated
//! algebra a table lookup.
//!
//! ## Key Features
//!
//! - **Cache-Centric Architecture**: every store borrows one
//!   [`PointsToCache`][crate::cache::PointsToCache] and never materialises
//!   a set of its own. Ids stay valid for the cache's whole lifetime.
//! - **Exact Change Reporting**: every mutation reports whether the
//!   destination id moved; this is the fixpoint signal solvers rely on.
//! - **A Family of Stores**: plain key-to-set storage, diff tracking for
//!   worklist propagation, per-location IN/OUT maps for flow-sensitive
//!   analysis, dirty-variable tracking for incremental re-propagation, and
//!   dual-space storage for versioned analyses --- all sharing one cache.
//! - **Generic over Identifiers**: keys, objects, locations and the set
//!   representations are type parameters; a packed
//!   [`BitSet`][crate::bitset::BitSet] is provided for dense `u32` ids.
//!
//! ## Basic Usage
//!
//! ```rust
//! use pts_rs::basic::BasicStore;
//! use pts_rs::bitset::BitSet;
//! use pts_rs::cache::PointsToCache;
//!
//! // 1. One cache, shared by every store bound to it.
//! let cache: PointsToCache<BitSet> = PointsToCache::default();
//!
//! // 2. A store with reverse (object -> keys) tracking enabled.
//! let mut store: BasicStore<u32, u32, BitSet> = BasicStore::new(&cache, true);
//!
//! // 3. Grow some points-to sets; `true` means "the set changed".
//! assert!(store.add_pts(1, 10));
//! assert!(store.add_pts(2, 10));
//! assert!(store.union_pts(3, 1));
//! assert!(!store.union_pts(3, 2)); // Already covered: no change.
//!
//! // 4. Equal contents share one interned set.
//! assert!(store.get_pts(3).contains(10));
//! assert_eq!(store.in_use_points_to_sets(), 1);
//! ```
//!
//! ## Core Components
//!
//! - **[`cache`]**: the interning cache and memoised id algebra.
//! - **[`basic`]**, **[`diff`]**, **[`dataflow`]**, **[`incremental`]**,
//!   **[`versioned`]**: the store family.
//! - **[`store`]**: a tagged handle for callers that pick a variant at
//!   runtime.

pub mod basic;
pub mod bitset;
pub mod cache;
pub mod dataflow;
pub mod debug;
pub mod diff;
pub mod incremental;
pub mod memo;
pub mod set;
pub mod stat;
pub mod store;
pub mod types;
pub mod utils;
pub mod versioned;
