//! Property-based tests for the binary tree encoding.
//!
//! These check invariants that must hold for every tree the node model can
//! express, not just the shapes the parser backend happens to produce.

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use uast_query::{codec, CodecError, Node, PathQuery, Point, Position};

// ============================================================================
// Test Strategies
// ============================================================================

fn kind_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,12}"
}

fn point_strategy() -> impl Strategy<Value = Point> {
    (any::<u32>(), any::<u32>(), any::<u32>()).prop_map(|(l, c, o)| Point::new(l, c, o))
}

fn position_strategy() -> impl Strategy<Value = Option<Position>> {
    prop::option::of((point_strategy(), point_strategy()).prop_map(|(s, e)| Position::new(s, e)))
}

fn leaf_strategy() -> impl Strategy<Value = Node> {
    (
        kind_strategy(),
        prop::option::of(".{0,16}"),
        prop::collection::btree_map("[a-zA-Z]{1,8}", ".{0,8}", 0..4),
        prop::collection::btree_set("[A-Z][a-z]{0,8}", 0..4),
        position_strategy(),
    )
        .prop_map(|(kind, token, properties, roles, position)| {
            Node::from_parts(kind, token, properties, roles, position, Vec::new()).unwrap()
        })
}

/// Strategy: arbitrary trees, including empty collections and absent fields
fn tree_strategy() -> impl Strategy<Value = Node> {
    leaf_strategy().prop_recursive(5, 96, 6, |inner| {
        (leaf_strategy(), prop::collection::vec(inner, 0..6))
            .prop_map(|(node, children)| node.with_children(children))
    })
}

// ============================================================================
// Codec Property Tests
// ============================================================================

proptest! {
    /// Decoding an encoded tree yields a structurally equal tree.
    #[test]
    fn prop_roundtrip(tree in tree_strategy()) {
        let bytes = codec::encode(&tree);
        let decoded = codec::decode(&bytes).unwrap();
        prop_assert_eq!(&decoded, &tree);
        prop_assert_eq!(codec::encode(&decoded), bytes);
    }

    /// Structurally equal trees encode to identical bytes.
    #[test]
    fn prop_equal_trees_equal_bytes(tree in tree_strategy()) {
        let copy = tree.clone();
        prop_assert_eq!(codec::encode(&tree), codec::encode(&copy));
    }

    /// Any single flipped byte is detected.
    #[test]
    fn prop_corruption_detected(tree in tree_strategy(), index in any::<prop::sample::Index>(), mask in 1u8..=255) {
        let mut bytes = codec::encode(&tree);
        let i = index.index(bytes.len());
        bytes[i] ^= mask;
        prop_assert!(codec::decode(&bytes).is_err());
    }

    /// Every proper prefix of an encoding is rejected.
    #[test]
    fn prop_truncation_detected(tree in tree_strategy(), index in any::<prop::sample::Index>()) {
        let bytes = codec::encode(&tree);
        let len = index.index(bytes.len());
        prop_assert!(codec::decode(&bytes[..len]).is_err());
    }

    /// Queries select the same subtrees before and after a round trip.
    #[test]
    fn prop_queries_agree_after_roundtrip(tree in tree_strategy(), kind in kind_strategy()) {
        let decoded = codec::decode(&codec::encode(&tree)).unwrap();
        let query = PathQuery::compile(&format!("//{kind} | //*[@token]")).unwrap();

        let before: Vec<Vec<u8>> = query.evaluate(&tree).into_iter().map(codec::encode).collect();
        let after: Vec<Vec<u8>> = query.evaluate(&decoded).into_iter().map(codec::encode).collect();
        prop_assert_eq!(before, after);
    }
}

// ============================================================================
// Fixed Cases
// ============================================================================

#[test]
fn bare_node_roundtrip() {
    let node = Node::new("Empty").unwrap();
    let decoded = codec::decode(&codec::encode(&node)).unwrap();
    assert_eq!(decoded, node);
    assert!(decoded.token().is_none());
    assert!(decoded.properties().is_empty());
    assert!(decoded.roles().is_empty());
    assert!(decoded.position().is_none());
    assert!(decoded.children().is_empty());
}

#[test]
fn wide_tree_roundtrip() {
    let children = (0..10_000).map(|i| Node::new("Item").unwrap().with_token(i.to_string()));
    let tree = Node::new("List").unwrap().with_children(children);
    let decoded = codec::decode(&codec::encode(&tree)).unwrap();
    assert_eq!(decoded.children().len(), 10_000);
    assert_eq!(decoded, tree);
}

#[test]
fn deep_chain_roundtrip() {
    let mut tree = Node::new("Leaf").unwrap();
    for _ in 0..100_000 {
        tree = Node::new("Wrap").unwrap().with_child(tree);
    }
    let decoded = codec::decode(&codec::encode(&tree)).unwrap();
    assert_eq!(decoded.depth(), 100_001);
    assert!(decoded == tree);
}

#[test]
fn rejects_foreign_bytes() {
    assert!(matches!(codec::decode(b""), Err(CodecError::BadMagic)));
    assert!(matches!(
        codec::decode(b"PK\x03\x04 not a tree"),
        Err(CodecError::BadMagic)
    ));
}

#[test]
fn empty_maps_are_default() {
    let tree = Node::from_parts(
        "Node",
        None,
        BTreeMap::new(),
        BTreeSet::new(),
        None,
        Vec::new(),
    )
    .unwrap();
    assert_eq!(tree, Node::new("Node").unwrap());
}
