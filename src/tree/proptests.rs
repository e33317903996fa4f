use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn validate_tree<K: RadixKey, V, const F: usize>(t: &RadixTree<K, V, F>) {
    let top = K::BYTES;

    let mut stack: Vec<(NodeId, usize)> = vec![(t.root, top)];
    let mut reachable = 0usize;
    let mut values = 0usize;
    while let Some((id, level)) = stack.pop() {
        reachable += 1;
        let node = t.pool.node(id);
        let occupied = node.occupied();
        assert_eq!(node.size as usize, occupied, "size must count live slots (level {level})");
        if id != t.root {
            assert!(occupied >= 1, "empty non-root node must have been pruned");
        }

        for slot in node.slots.iter() {
            match slot {
                Slot::Vacant => {}
                Slot::Child(child) => {
                    assert!(level > 1, "level-1 nodes hold values only");
                    stack.push((*child, level - 1));
                }
                Slot::Value(_) => {
                    assert_eq!(level, 1, "values live in level-1 nodes only");
                    values += 1;
                }
            }
        }
    }

    assert_eq!(values, t.len, "reachable value count must match len");
    assert_eq!(reachable, t.pool.live(), "every live node must be reachable");

    // Every cached entry names the node actually on the previous key's path.
    assert_eq!(t.trace[top], Some(t.root));
    assert_eq!(t.trace[0], None);
    let mut on_path = Some(t.root);
    for level in (1..top).rev() {
        on_path = on_path.and_then(|n| t.pool.node(n).slot(t.last_key.byte_at(level + 1)).child());
        if let Some(cached) = t.trace[level] {
            assert_eq!(Some(cached), on_path, "stale cache entry at level {level}");
        }
    }
}

/// Keys clustered in a few high-order prefixes so that operations collide,
/// share paths and trigger pruning.
fn key_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        3 => (0u32..4, 0u32..4, 0u32..4, 0u32..8)
            .prop_map(|(a, b, c, d)| a << 24 | b << 16 | c << 8 | d),
        1 => 0u32..64,
        1 => any::<u32>(),
    ]
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 40)]
    Insert(#[proptest(strategy = "key_strategy()")] u32, u16),
    #[proptest(weight = 10)]
    InsertIfAbsent(#[proptest(strategy = "key_strategy()")] u32, u16),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] u32),
    #[proptest(weight = 20)]
    Search(#[proptest(strategy = "key_strategy()")] u32),
    #[proptest(weight = 5)]
    Get(#[proptest(strategy = "key_strategy()")] u32),
    #[proptest(weight = 1)]
    Clear,
}

fn run_against_model<const F: usize>(ops: Vec<Op>) -> std::result::Result<(), TestCaseError> {
    let mut t: RadixTree<u32, u16, F> =
        RadixTree::with_config(Config::default().with_first_slab(2)).unwrap();
    let mut m: BTreeMap<u32, u16> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                prop_assert_eq!(t.insert(key, value), m.insert(key, value));
            }
            Op::InsertIfAbsent(key, value) => {
                let got = t.insert_if_absent(key, value).copied();
                let expected = match m.get(&key) {
                    Some(v) => Some(*v),
                    None => {
                        m.insert(key, value);
                        None
                    }
                };
                prop_assert_eq!(got, expected);
            }
            Op::Remove(key) => {
                prop_assert_eq!(t.remove(key), m.remove(&key));
            }
            Op::Search(key) => {
                prop_assert_eq!(t.search(key).copied(), m.get(&key).copied());
            }
            Op::Get(key) => {
                prop_assert_eq!(t.get(key).copied(), m.get(&key).copied());
            }
            Op::Clear => {
                t.clear();
                m.clear();
            }
        }

        prop_assert_eq!(t.len(), m.len());
    }

    validate_tree(&t);
    for (&key, &value) in &m {
        prop_assert_eq!(t.search(key), Some(&value));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_cached(ops in prop::collection::vec(any::<Op>(), 0..=500)) {
        run_against_model::<1>(ops)?;
    }

    #[test]
    fn prop_equivalence_floor_two(ops in prop::collection::vec(any::<Op>(), 0..=500)) {
        run_against_model::<2>(ops)?;
    }

    #[test]
    fn prop_equivalence_uncached(ops in prop::collection::vec(any::<Op>(), 0..=500)) {
        run_against_model::<0>(ops)?;
    }

    #[test]
    fn prop_invariants_hold_after_every_op(ops in prop::collection::vec(any::<Op>(), 0..=120)) {
        let mut t: RadixTree<u32, u16> = RadixTree::new();
        for op in ops {
            match op {
                Op::Insert(key, value) => { t.insert(key, value); }
                Op::InsertIfAbsent(key, value) => { t.insert_if_absent(key, value); }
                Op::Remove(key) => { t.remove(key); }
                Op::Search(key) => { t.search(key); }
                Op::Get(key) => { t.get(key); }
                Op::Clear => t.clear(),
            }
            validate_tree(&t);
        }
    }

    /// After a hit, resolving another present key costs exactly as many slot
    /// lookups as the level at which the two keys diverge.
    #[test]
    fn prop_hops_bounded_by_divergence(
        keys in prop::collection::btree_set(key_strategy(), 1..200),
        order in prop::collection::vec(any::<prop::sample::Index>(), 1..300),
    ) {
        let keys: Vec<u32> = keys.into_iter().collect();
        let mut t: RadixTree<u32, u32> = RadixTree::new();
        for &k in &keys {
            t.insert(k, k);
        }

        let mut prev = *keys.last().unwrap();
        for idx in order {
            let key = *idx.get(&keys);
            prop_assert_eq!(t.search(key), Some(&key));
            let expected = key.divergence(prev).max(1);
            prop_assert_eq!(t.last_hops(), expected);
            prop_assert!(t.last_hops() <= <u32 as RadixKey>::BYTES);
            prev = key;
        }
    }
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u32> = vec![0x0000_0000, 0x0000_0001, 0x0000_0100, 0x0001_0000, 0x0100_0000, 0x0101_0101];

    fn for_each_permutation(items: &[u32], f: &mut impl FnMut(&[u32])) {
        fn rec(items: &[u32], used: &mut [bool], out: &mut Vec<u32>, f: &mut impl FnMut(&[u32])) {
            if out.len() == items.len() {
                f(out.as_slice());
                return;
            }
            for i in 0..items.len() {
                if used[i] {
                    continue;
                }
                used[i] = true;
                out.push(items[i]);
                rec(items, used, out, f);
                out.pop();
                used[i] = false;
            }
        }
        let mut used = vec![false; items.len()];
        let mut out = Vec::with_capacity(items.len());
        rec(items, &mut used, &mut out, f);
    }

    let mut base: RadixTree<u32, u32> = RadixTree::new();
    for &k in &keys {
        base.insert(k, k);
    }

    for_each_permutation(&keys, &mut |perm: &[u32]| {
        let mut t = base.clone();
        for (removed, &k) in perm.iter().enumerate() {
            assert_eq!(t.remove(k), Some(k));
            assert_eq!(t.len(), keys.len() - removed - 1);
            validate_tree(&t);
            for &other in &perm[removed + 1..] {
                assert_eq!(t.search(other), Some(&other));
            }
        }
        assert!(t.is_empty());
        assert_eq!(t.pool.live(), 1);
    });
}
