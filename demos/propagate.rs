//! Walk-through: build a store, run a small union chain, inspect the
//! results.
//!
//! Run with:
//! ```bash
//! cargo run --example propagate
//! ```

use pts_rs::basic::BasicStore;
use pts_rs::bitset::BitSet;
use pts_rs::cache::PointsToCache;
use pts_rs::debug;
use pts_rs::set::KeySet;

fn main() {
    let cache: PointsToCache<BitSet> = PointsToCache::default();
    let mut store: BasicStore<u32, u32, BitSet> = BasicStore::new(&cache, true);

    // p = &a; p = &b; q = &b; r = p; r = q;
    let (p, q, r) = (1, 2, 3);
    let (a, b) = (10, 11);
    store.add_pts(p, a);
    store.add_pts(p, b);
    store.add_pts(q, b);
    store.union_pts(r, p);
    let changed = store.union_pts(r, q);

    println!("pts(r) = {:?}", store.get_pts(r).iter().collect::<Vec<_>>());
    println!("second union changed r: {changed}");

    let pointers_to_b: Vec<u32> = KeySet::iter(store.get_rev_pts(b)).collect();
    println!("variables that may point to b: {pointers_to_b:?}");

    let (top, total) = store.top_n(1);
    println!("most common set covers {top} of {total} pointers");
    println!("{}", debug::cache_summary(&cache));
    print!("{}", debug::dump_basic(&store, 16));
}
