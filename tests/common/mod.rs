use avl_kv::AvlTree;
use proptest::prelude::*;

#[allow(dead_code)]
pub(super) fn assert_eq_iters<I: Iterator, J: Iterator<Item = I::Item>>(
    mut i: I,
    mut j: J,
) where
    I::Item: std::fmt::Debug + Eq, // same inferred for J::Item
{
    loop {
        match (i.next(), j.next()) {
            (None, None) => return,
            (a, b) => assert_eq!(a, b),
        }
    }
}

#[allow(dead_code)]
pub(super) fn level_keys<K: Clone, V>(t: &AvlTree<K, V>) -> Vec<K> {
    t.level_order().iter().map(|n| n.key().clone()).collect()
}

#[allow(dead_code)]
pub(super) fn inorder_keys<K: Clone, V>(t: &AvlTree<K, V>) -> Vec<K> {
    t.inorder().iter().map(|n| n.key().clone()).collect()
}

// Builds a tree whose values equal their keys, as the scenario tables do.
#[allow(dead_code)]
pub(super) fn tree_of(keys: &[i32]) -> AvlTree<i32, i32> {
    AvlTree::from_arrays(keys.iter().copied(), keys.iter().copied())
        .expect("scenario keys are distinct")
}

#[allow(dead_code)]
pub(super) type SmallIntPairs = Vec<(u16, u16)>;

#[allow(dead_code)]
pub(super) fn small_int_pairs() -> impl Strategy<Value = SmallIntPairs> {
    prop::collection::vec((0u16..1024u16, 0u16..1024u16), 0..512)
}

#[allow(dead_code)]
pub(super) fn string_u16_pairs() -> impl Strategy<Value = Vec<(String, u16)>> {
    prop::collection::vec(("[a-z]{0,2}", 0u16..1024u16), 0..512)
}

// A sequence of operations on a narrow key range, so that duplicates,
// misses and repeated deletions all occur often.
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub(super) enum Op {
    Insert(u8, u16),
    Delete(u8),
    Update(u8, u16),
    Find(u8),
}

#[allow(dead_code)]
pub(super) fn ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        3 => (0u8..64, any::<u16>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (0u8..64).prop_map(Op::Delete),
        1 => (0u8..64, any::<u16>()).prop_map(|(k, v)| Op::Update(k, v)),
        1 => (0u8..64).prop_map(Op::Find),
    ];
    prop::collection::vec(op, 0..256)
}
