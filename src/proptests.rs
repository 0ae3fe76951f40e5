use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::HashSet;

/// Checks every structural invariant of `t`, panicking on the first breach.
pub(crate) fn validate_tree<T, S: Semantics<T>>(t: &BPlusTree<T, S>) {
    let b = t.b;
    let root = t.nodes.get(t.root);
    let Node::Internal(root_node) = root else {
        panic!("root must be an internal node");
    };
    assert!(root_node.parent.is_null(), "root must not have a parent");
    assert!(
        (1..=b).contains(&root_node.children.len()),
        "root child count {} out of range",
        root_node.children.len()
    );
    let lone_leaf = root_node.children.len() == 1;

    // (node, lower bound, upper bound, depth)
    let mut stack: Vec<(NodeId, Option<i64>, Option<i64>, usize)> = vec![(t.root, None, None, 1)];
    let mut leaves: Vec<(NodeId, usize)> = Vec::new();
    let mut values = 0usize;

    while let Some((id, lo, hi, depth)) = stack.pop() {
        let node = t.nodes.get(id);
        let keys = node.keys();
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "keys must be strictly ascending: {keys:?}"
        );
        for &k in keys {
            assert!(lo.map_or(true, |lo| k >= lo), "key {k} below bound {lo:?}");
            assert!(hi.map_or(true, |hi| k < hi), "key {k} above bound {hi:?}");
        }

        match node {
            Node::Internal(internal) => {
                let n = internal.children.len();
                assert_eq!(internal.keys.len() + 1, n, "internal key/child mismatch");
                if id != t.root {
                    assert!(
                        (b.div_ceil(2)..=b).contains(&n),
                        "internal child count {n} out of range for b={b}"
                    );
                }

                // Push right to left so leaves pop in ascending order.
                for i in (0..n).rev() {
                    let child = internal.children.as_slice()[i];
                    assert_eq!(t.nodes.get(child).parent(), id, "stale parent link");
                    let child_lo = if i == 0 { lo } else { Some(keys[i - 1]) };
                    let child_hi = if i == n - 1 { hi } else { Some(keys[i]) };
                    stack.push((child, child_lo, child_hi, depth + 1));
                }
            }
            Node::Leaf(leaf) => {
                let n = leaf.len();
                assert_eq!(leaf.buckets.len(), n, "leaf key/bucket mismatch");
                assert!(n < b, "leaf holds {n} entries with b={b}");
                if !lone_leaf {
                    assert!(
                        n >= (b / 2).max(1),
                        "leaf holds {n} entries, below minimum for b={b}"
                    );
                }
                for (&key, bucket) in leaf.keys.iter().zip(leaf.buckets.iter()) {
                    let members = bucket.as_slice();
                    assert!(!members.is_empty(), "empty bucket under {key}");
                    for (i, v) in members.iter().enumerate() {
                        assert_eq!(t.semantics.hash(v), key, "value filed under wrong hash");
                        assert!(
                            !members[..i].iter().any(|w| t.semantics.equals(v, w)),
                            "duplicate value under {key}"
                        );
                    }
                    values += members.len();
                }
                leaves.push((id, depth));
            }
        }
    }

    let depth = leaves[0].1;
    assert!(leaves.iter().all(|&(_, d)| d == depth), "leaves at uneven depth");
    assert_eq!(t.height(), depth);
    assert_eq!(values, t.size, "value count must match BPlusTree::len");

    let mut chain = Vec::new();
    let mut cursor = t.first_leaf();
    while !cursor.is_null() {
        chain.push(cursor);
        cursor = t.nodes.leaf(cursor).next;
    }
    let order: Vec<NodeId> = leaves.iter().map(|&(id, _)| id).collect();
    assert_eq!(chain, order, "leaf chain must visit every leaf left to right");
}

/// Semantics that squeeze `u16` values into few hashes.
fn narrow(modulus: u16) -> impl Semantics<u16> + Clone {
    FnSemantics::new(
        move |v: &u16| i64::from(*v % modulus) - 8,
        |a: &u16, b: &u16| a == b,
    )
}

fn insert_all<S: Semantics<u16>>(t: &mut BPlusTree<u16, S>, values: &[u16]) {
    for &v in values {
        let hash = t.semantics().hash(&v);
        t.insert(hash, v).unwrap();
    }
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 3)]
    Insert(#[proptest(strategy = "0u16..1024")] u16),
    Contains(#[proptest(strategy = "0u16..1024")] u16),
}

fn values_strategy() -> impl Strategy<Value = Vec<u16>> {
    prop::collection::vec(0u16..2048, 0..=600)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_matches_hash_set(
        b in MIN_B..=12usize,
        modulus in prop_oneof![Just(16u16), Just(1024u16)],
        ops in prop::collection::vec(any::<Op>(), 0..=1500),
    ) {
        let mut t: BPlusTree<u16, _> = BPlusTree::with_semantics(b, narrow(modulus)).unwrap();
        let mut m: HashSet<u16> = HashSet::new();

        for op in ops {
            match op {
                Op::Insert(v) => {
                    let hash = t.semantics().hash(&v);
                    prop_assert_eq!(t.insert(hash, v), Ok(m.insert(v)));
                }
                Op::Contains(v) => {
                    let hash = t.semantics().hash(&v);
                    prop_assert_eq!(t.contains(hash, &v), m.contains(&v));
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<u16> = t.iter().copied().collect();
        let hashes: Vec<i64> = got.iter().map(|v| t.semantics().hash(v)).collect();
        prop_assert!(hashes.windows(2).all(|w| w[0] <= w[1]));
        let got: HashSet<u16> = got.into_iter().collect();
        prop_assert_eq!(got, m);
    }

    #[test]
    fn prop_equality_ignores_shape(
        b1 in MIN_B..=9usize,
        b2 in MIN_B..=9usize,
        values in values_strategy(),
        extra in 2048u16..4096,
    ) {
        let mut a: BPlusTree<u16, _> = BPlusTree::with_semantics(b1, narrow(32)).unwrap();
        let mut c: BPlusTree<u16, _> = BPlusTree::with_semantics(b2, narrow(32)).unwrap();
        insert_all(&mut a, &values);
        let reversed: Vec<u16> = values.iter().rev().copied().collect();
        insert_all(&mut c, &reversed);

        prop_assert!(a.equals(&c));
        prop_assert!(c.equals(&a));

        insert_all(&mut c, &[extra]);
        prop_assert!(!a.equals(&c));
        prop_assert!(!c.equals(&a));
    }

    #[test]
    fn prop_bulk_strategies_agree(
        b in MIN_B..=16usize,
        modulus in prop_oneof![Just(16u16), Just(2048u16)],
        values in values_strategy(),
    ) {
        let opts = BPlusOptions::default().with_b(b);
        let seq = BPlusTree::from_values(
            opts.clone().with_bulk_load(BulkLoad::Sequential),
            narrow(modulus),
            values.iter().copied(),
        ).unwrap();
        let sorted = BPlusTree::from_values(
            opts.with_bulk_load(BulkLoad::Sorted),
            narrow(modulus),
            values.iter().copied(),
        ).unwrap();

        validate_tree(&seq);
        validate_tree(&sorted);
        prop_assert_eq!(seq.len(), sorted.len());
        prop_assert!(seq.equals(&sorted));
        for v in 0u16..64 {
            let hash = seq.semantics().hash(&v);
            prop_assert_eq!(seq.contains(hash, &v), sorted.contains(hash, &v));
        }
        let a: Vec<i64> = seq.entries().map(|(k, _)| k).collect();
        let c: Vec<i64> = sorted.entries().map(|(k, _)| k).collect();
        prop_assert_eq!(a, c);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    // Four hashes, two of them shared.
    let values: Vec<u16> = vec![1, 17, 33, 2, 18, 5, 7];

    for b in [2usize, 3, 4] {
        let mut reference: BPlusTree<u16, _> = BPlusTree::with_semantics(b, narrow(16)).unwrap();
        insert_all(&mut reference, &values);

        for_each_permutation(&values, |perm| {
            let mut t: BPlusTree<u16, _> = BPlusTree::with_semantics(b, narrow(16)).unwrap();
            for &v in &perm {
                let hash = t.semantics().hash(&v);
                assert_eq!(t.insert(hash, v), Ok(true));
                validate_tree(&t);
            }
            for &v in &perm {
                let hash = t.semantics().hash(&v);
                assert_eq!(t.insert(hash, v), Ok(false));
            }
            assert_eq!(t.len(), values.len());
            assert!(t.equals(&reference));
        });
    }
}
