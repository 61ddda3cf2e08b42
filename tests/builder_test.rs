//! Tests for TreeBuilder validation

use rstest::rstest;

use arborist::domain::{build_tree, DomainError, Point3, SwcNode, TreeBuilder};
use arborist::util::testing;

fn node(id: i64, parent: Option<i64>) -> SwcNode {
    SwcNode::new(id, Point3::new(id as f64, 0.0, 0.0), parent)
}

#[test]
fn given_empty_input_when_building_then_empty_tree() {
    testing::init_test_setup();

    let result = build_tree(&[]);

    assert_eq!(result.unwrap_err(), DomainError::EmptyTree);
}

#[rstest]
#[case::two_roots(
    vec![node(1, None), node(2, None), node(3, Some(1))],
    DomainError::MultipleRoots { ids: vec![1, 2] }
)]
#[case::missing_parent(
    vec![node(1, None), node(2, Some(1)), node(3, Some(42))],
    DomainError::DanglingParent { id: 3, parent: 42 }
)]
#[case::no_root(
    vec![node(1, Some(2)), node(2, Some(1))],
    DomainError::NoRoot { node_count: 2 }
)]
#[case::duplicate_id(
    vec![node(1, None), node(2, Some(1)), node(2, Some(1))],
    DomainError::DuplicateId(2)
)]
#[case::detached_cycle(
    vec![node(1, None), node(2, Some(1)), node(3, Some(4)), node(4, Some(3))],
    DomainError::CycleDetected { root: 1, unreachable: 2 }
)]
fn given_malformed_nodes_when_building_then_rejected(
    #[case] nodes: Vec<SwcNode>,
    #[case] expected: DomainError,
) {
    testing::init_test_setup();

    // Act
    let err = build_tree(&nodes).unwrap_err();

    // Assert
    assert!(err.is_malformed(), "{err} should count as malformed");
    assert_eq!(err, expected);
}

#[test]
fn given_children_listed_before_parents_when_building_then_same_shape() {
    // Arrange
    let ordered = vec![node(1, None), node(2, Some(1)), node(3, Some(2)), node(4, Some(1))];
    let shuffled = vec![node(3, Some(2)), node(4, Some(1)), node(2, Some(1)), node(1, None)];

    // Act
    let a = build_tree(&ordered).unwrap();
    let b = build_tree(&shuffled).unwrap();

    // Assert
    assert_eq!(a.len(), b.len());
    assert_eq!(a.leaf_nodes().len(), b.leaf_nodes().len());
    assert_eq!(a.cable_length(), b.cable_length());
    assert_eq!(a.depth(), 3);
    assert_eq!(b.depth(), 3);
}

#[test]
fn given_builder_when_reused_then_no_state_leaks() {
    // Arrange
    let mut builder = TreeBuilder::new();
    let broken = vec![node(1, None), node(2, Some(9))];
    let valid = vec![node(1, None), node(2, Some(1))];

    // Act
    let first = builder.build(&broken);
    let second = builder.build(&valid);

    // Assert
    assert!(first.is_err());
    assert_eq!(second.unwrap().len(), 2);
}

#[test]
fn given_coincident_points_when_building_then_zero_weight_edge_kept() {
    // Arrange
    let nodes = vec![
        SwcNode::new(1, Point3::new(1.0, 1.0, 1.0), None),
        SwcNode::new(2, Point3::new(1.0, 1.0, 1.0), Some(1)),
    ];

    // Act
    let tree = build_tree(&nodes).unwrap();

    // Assert
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.cable_length(), 0.0);
}
