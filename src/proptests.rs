use super::*;

use crate::node::{RadixNode, TreeNode, TrieNode};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

fn validate_trie(t: &DigitTrie<BinRange>) {
    let mut stack: Vec<&TrieNode<BinRange>> = vec![t.root()];
    let mut nodes = 0usize;
    while let Some(node) = stack.pop() {
        nodes += 1;
        if node.is_leaf() && !std::ptr::eq(node, t.root()) {
            assert!(node.record.is_some(), "trie leaf without a record");
        }
        stack.extend(node.children.iter().map(|(_, child)| child));
    }
    assert_eq!(nodes, t.size(), "reachable node count must match size");
    assert_eq!(t.is_empty(), t.size() == 1);
}

fn validate_radix(t: &RadixTree<BinRange>) {
    let root = t.root();
    assert!(root.label.is_empty(), "root label must stay empty");
    assert!(root.record.is_none());

    let mut stack: Vec<&RadixNode<BinRange>> = vec![root];
    let mut nodes = 0usize;
    while let Some(node) = stack.pop() {
        nodes += 1;
        for (d, child) in node.children.iter() {
            assert!(!child.label.is_empty(), "empty edge label");
            assert!(child.label.iter().all(u8::is_ascii_digit));
            assert_eq!(child.first_digit(), Some(d), "child stored under the wrong digit");
            if child.is_leaf() {
                assert!(child.record.is_some(), "radix leaf without a record");
            } else if child.record.is_none() {
                assert!(
                    child.number_of_children() >= 2,
                    "pass-through node {:?} was not combined",
                    String::from_utf8_lossy(&child.label)
                );
            }
            stack.push(child);
        }
    }
    assert_eq!(nodes, t.size(), "reachable node count must match size");
    assert_eq!(t.is_empty(), t.size() == 1);
}

#[derive(Clone, Debug)]
enum Op {
    Insert(String),
    Delete(String),
    Find(String),
}

/// Fixed-width keys over a small alphabet so paths share prefixes. No key
/// is a prefix of another, so every stored key ends on a leaf.
fn fixed_key_strategy() -> impl Strategy<Value = String> + Clone {
    prop::collection::vec(b'0'..=b'3', 6)
        .prop_map(|digits| String::from_utf8(digits).unwrap())
}

fn any_key_strategy() -> impl Strategy<Value = String> + Clone {
    prop::collection::vec(b'0'..=b'3', 1..=6)
        .prop_map(|digits| String::from_utf8(digits).unwrap())
}

fn ops_strategy(key: impl Strategy<Value = String> + Clone) -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        50 => key.clone().prop_map(Op::Insert),
        25 => key.clone().prop_map(Op::Delete),
        25 => key.prop_map(Op::Find),
    ];
    prop::collection::vec(op, 0..=300)
}

fn point(key: &str) -> Arc<BinRange> {
    Arc::new(BinRange::point(key).unwrap())
}

fn check_against_model<T: SearchTree<Record = BinRange>>(
    t: &mut T,
    ops: Vec<Op>,
    validate: impl Fn(&T),
) -> std::result::Result<(), TestCaseError> {
    let mut m: BTreeMap<String, Arc<BinRange>> = BTreeMap::new();
    for op in ops {
        match op {
            Op::Insert(key) => {
                let record = point(&key);
                let inserted = t.insert(&key, record.clone());
                prop_assert_eq!(inserted, !m.contains_key(&key));
                m.entry(key).or_insert(record);
            }
            Op::Delete(key) => {
                prop_assert_eq!(t.delete(&key), m.remove(&key).is_some());
            }
            Op::Find(key) => {
                let got = t.find(&key).map(|r| r.low_bin().to_owned());
                prop_assert_eq!(got.as_deref(), m.get(&key).map(|r| r.low_bin()));
            }
        }
        prop_assert_eq!(t.is_empty(), m.is_empty());
    }
    validate(&*t);
    for (key, record) in &m {
        prop_assert!(Arc::ptr_eq(t.find(key).unwrap(), record));
    }
    Ok(())
}

/// Non-overlapping 6-digit ranges, each either a single value or wider
/// than the sampling stride.
fn ranges_strategy() -> impl Strategy<Value = Vec<(u64, u64)>> {
    let width = prop_oneof![1 => Just(0u64), 4 => 11u64..300];
    prop::collection::vec((0u64..500, width), 1..20).prop_map(|blocks| {
        let mut next = 0u64;
        blocks
            .into_iter()
            .map(|(gap, width)| {
                let low = next + gap;
                let high = low + width;
                next = high + 1;
                (low, high)
            })
            .collect()
    })
}

fn containing(ranges: &[(u64, u64)], q: u64) -> Option<u64> {
    ranges
        .iter()
        .find(|&&(low, high)| low <= q && q <= high)
        .map(|&(low, _)| low)
}

fn load_ranges<T: SearchTree<Record = BinRange>>(t: &mut T, ranges: &[(u64, u64)]) {
    for &(low, high) in ranges {
        let record = BinRange::new(left_pad(low, 6), left_pad(high, 6)).unwrap();
        assert!(t.insert_bin_range(10, Arc::new(record)).unwrap());
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_trie_matches_model(ops in ops_strategy(fixed_key_strategy())) {
        let mut t: DigitTrie<BinRange> = DigitTrie::new();
        check_against_model(&mut t, ops, validate_trie)?;
    }

    #[test]
    fn prop_radix_matches_model(ops in ops_strategy(fixed_key_strategy())) {
        let mut t: RadixTree<BinRange> = RadixTree::new();
        check_against_model(&mut t, ops, validate_radix)?;
    }

    #[test]
    fn prop_structure_with_prefix_keys(ops in ops_strategy(any_key_strategy())) {
        let mut trie: DigitTrie<BinRange> = DigitTrie::new();
        let mut radix: RadixTree<BinRange> = RadixTree::new();
        // Keys each tree accepted and still holds.
        let mut in_trie = BTreeSet::new();
        let mut in_radix = BTreeSet::new();
        for op in ops {
            match op {
                Op::Insert(key) => {
                    if trie.insert(&key, point(&key)) {
                        in_trie.insert(key.clone());
                    }
                    let inserted = radix.insert(&key, point(&key));
                    prop_assert_eq!(inserted, in_radix.insert(key));
                }
                Op::Delete(key) => {
                    if trie.delete(&key) {
                        prop_assert!(in_trie.remove(&key));
                    }
                    let deleted = radix.delete(&key);
                    prop_assert_eq!(deleted, in_radix.remove(&key));
                }
                Op::Find(key) => {
                    for r in [trie.find(&key), radix.find(&key)].into_iter().flatten() {
                        prop_assert!(is_in_range(&key, &**r) || is_prefix(&key, &**r));
                    }
                }
            }
            for key in &in_trie {
                prop_assert_eq!(trie.find(key).map(|r| r.low_bin()), Some(key.as_str()));
            }
            for key in &in_radix {
                prop_assert_eq!(radix.find(key).map(|r| r.low_bin()), Some(key.as_str()));
            }
            validate_trie(&trie);
            validate_radix(&radix);
        }
    }

    #[test]
    fn prop_insert_then_delete_restores_size(
        keys in prop::collection::btree_set(fixed_key_strategy(), 0..40),
        extra in fixed_key_strategy(),
    ) {
        prop_assume!(!keys.contains(&extra));
        let mut trie: DigitTrie<BinRange> = DigitTrie::new();
        let mut radix: RadixTree<BinRange> = RadixTree::new();
        for key in &keys {
            trie.insert(key, point(key));
            radix.insert(key, point(key));
        }
        let (trie_size, radix_size) = (trie.size(), radix.size());

        prop_assert!(trie.insert(&extra, point(&extra)));
        prop_assert!(radix.insert(&extra, point(&extra)));
        prop_assert!(trie.delete(&extra));
        prop_assert!(radix.delete(&extra));

        prop_assert_eq!(trie.size(), trie_size);
        prop_assert_eq!(radix.size(), radix_size);
        prop_assert!(trie.find(&extra).is_none());
        prop_assert!(radix.find(&extra).is_none());
        validate_trie(&trie);
        validate_radix(&radix);
    }

    #[test]
    fn prop_sampled_ranges_resolve(
        ranges in ranges_strategy(),
        queries in prop::collection::vec(0u64..20_000, 1..200),
    ) {
        let mut trie: DigitTrie<BinRange> = DigitTrie::new();
        let mut radix: RadixTree<BinRange> = RadixTree::new();
        load_ranges(&mut trie, &ranges);
        load_ranges(&mut radix, &ranges);

        for q in queries {
            let key = left_pad(q, 6);
            let expected = containing(&ranges, q).map(|low| left_pad(low, 6));
            let got_trie = trie.find(&key).map(|r| r.low_bin().to_owned());
            let got_radix = radix.find(&key).map(|r| r.low_bin().to_owned());
            prop_assert_eq!(&got_trie, &expected, "trie lookup of {}", key);
            prop_assert_eq!(&got_radix, &expected, "radix lookup of {}", key);
        }
    }
}

#[test]
fn seeded_lookups_agree() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x5EED_B1B5);
    let mut ranges = Vec::new();
    let mut next = 100_000u64;
    while next < 990_000 && ranges.len() < 400 {
        let low = next + rng.gen_range(0..2_000);
        let high = low + rng.gen_range(11..1_500);
        ranges.push((low, high));
        next = high + 1;
    }

    let mut trie: DigitTrie<BinRange> = DigitTrie::new();
    let mut radix: RadixTree<BinRange> = RadixTree::new();
    load_ranges(&mut trie, &ranges);
    load_ranges(&mut radix, &ranges);
    assert!(radix.size() < trie.size());
    validate_trie(&trie);
    validate_radix(&radix);

    let mut found = 0;
    for _ in 0..20_000 {
        let q = rng.gen_range(100_000..1_000_000u64);
        let key = left_pad(q, 6);
        let expected = containing(&ranges, q).map(|low| left_pad(low, 6));
        let got_trie = trie.find(&key).map(|r| r.low_bin().to_owned());
        let got_radix = radix.find(&key).map(|r| r.low_bin().to_owned());
        assert_eq!(got_trie, expected, "trie lookup of {key}");
        assert_eq!(got_radix, expected, "radix lookup of {key}");
        found += usize::from(expected.is_some());
    }
    assert!(found > 0);
}

#[test]
fn delete_every_key_in_each_order() {
    let keys = ["1010", "1011", "1020", "2000", "1100", "1012"];
    let mut orders = vec![keys.to_vec()];
    let mut reversed = keys.to_vec();
    reversed.reverse();
    orders.push(reversed);
    let mut rotated = keys.to_vec();
    rotated.rotate_left(2);
    orders.push(rotated);

    for order in orders {
        let mut trie: DigitTrie<BinRange> = DigitTrie::new();
        let mut radix: RadixTree<BinRange> = RadixTree::new();
        for key in keys {
            assert!(trie.insert(key, point(key)));
            assert!(radix.insert(key, point(key)));
        }
        for key in order {
            assert!(trie.delete(key), "trie delete {key}");
            assert!(radix.delete(key), "radix delete {key}");
            validate_trie(&trie);
            validate_radix(&radix);
        }
        assert!(trie.is_empty());
        assert!(radix.is_empty());
        assert_eq!(radix.size(), 1);
    }
}
