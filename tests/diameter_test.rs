//! Tests for the diameter algorithms and their agreement

use proptest::prelude::*;
use proptest::sample::Index;
use rstest::rstest;

use arborist::domain::{
    agrees, build_tree, diameter_by_shortest_path, diameter_by_walk, diameter_memoized, leaves,
    longest_path_memoized, path_weight, DomainError, Point3, SwcNode, TreeArena,
    DEFAULT_TOLERANCE,
};
use arborist::util::testing::{self, chain, star};

fn ids(tree: &TreeArena, path: &[arborist::domain::NodeId]) -> Vec<i64> {
    tree.nodes_of(path).iter().map(|n| n.id).collect()
}

#[test]
fn given_single_node_when_measuring_then_zero_diameter_and_root_is_leaf() {
    testing::init_test_setup();

    // Arrange
    let tree = build_tree(&[SwcNode::new(7, Point3::new(1.0, 2.0, 3.0), None)]).unwrap();

    // Act
    let walk = diameter_by_walk(&tree).unwrap();
    let shortest = diameter_by_shortest_path(&tree).unwrap();

    // Assert
    assert_eq!(walk, 0.0);
    assert_eq!(shortest.max_distance, 0.0);
    assert_eq!(ids(&tree, &shortest.path), vec![7]);
    assert_eq!(ids(&tree, &leaves(&tree)), vec![7]);
}

#[rstest]
#[case(2)]
#[case(10)]
#[case(500)]
fn given_unit_chain_when_measuring_then_diameter_is_length_minus_one(#[case] n: usize) {
    // Arrange
    let tree = build_tree(&chain(n)).unwrap();
    let expected = (n - 1) as f64;

    // Act
    let walk = diameter_by_walk(&tree).unwrap();
    let memo = diameter_memoized(&tree).unwrap();
    let shortest = diameter_by_shortest_path(&tree).unwrap();

    // Assert
    assert_eq!(walk, expected);
    assert_eq!(memo, expected);
    assert_eq!(shortest.max_distance, expected);
    assert_eq!(shortest.path.len(), n);
    assert_eq!(ids(&tree, &shortest.path), (1..=n as i64).collect::<Vec<_>>());
}

#[test]
fn given_star_when_measuring_then_diameter_is_longest_arm() {
    // Arrange
    let tree = build_tree(&star(&[1.5, 4.0, 2.5, 0.5])).unwrap();

    // Act
    let shortest = diameter_by_shortest_path(&tree).unwrap();

    // Assert
    assert_eq!(diameter_by_walk(&tree).unwrap(), 4.0);
    assert_eq!(shortest.max_distance, 4.0);
    assert_eq!(ids(&tree, &shortest.path), vec![1, 3]);
    assert_eq!(ids(&tree, &leaves(&tree)), vec![2, 3, 4, 5]);
}

#[test]
fn given_tied_tips_when_measuring_then_first_tip_in_preorder_wins() {
    // Arrange
    let tree = build_tree(&star(&[2.0, 2.0, 1.0])).unwrap();

    // Act
    let shortest = diameter_by_shortest_path(&tree).unwrap();
    let memo = longest_path_memoized(&tree).unwrap();

    // Assert
    assert_eq!(ids(&tree, &shortest.path), vec![1, 2]);
    assert_eq!(ids(&tree, &memo.path), vec![1, 2]);
}

#[test]
fn given_zero_length_edges_when_measuring_then_no_special_case() {
    // Arrange: second node coincides with the root
    let nodes = vec![
        SwcNode::new(1, Point3::new(0.0, 0.0, 0.0), None),
        SwcNode::new(2, Point3::new(0.0, 0.0, 0.0), Some(1)),
        SwcNode::new(3, Point3::new(0.0, 3.0, 4.0), Some(2)),
    ];
    let tree = build_tree(&nodes).unwrap();

    // Act
    let shortest = diameter_by_shortest_path(&tree).unwrap();

    // Assert
    assert_eq!(diameter_by_walk(&tree).unwrap(), 5.0);
    assert_eq!(shortest.max_distance, 5.0);
    assert_eq!(ids(&tree, &shortest.path), vec![1, 2, 3]);
}

#[test]
fn given_empty_tree_when_measuring_then_empty_tree_error() {
    let tree = TreeArena::new();

    assert_eq!(diameter_by_walk(&tree).unwrap_err(), DomainError::EmptyTree);
    assert_eq!(
        diameter_by_shortest_path(&tree).unwrap_err(),
        DomainError::EmptyTree
    );
    assert_eq!(diameter_memoized(&tree).unwrap_err(), DomainError::EmptyTree);
}

#[test]
fn given_same_tree_when_measuring_twice_then_identical_results() {
    // Arrange
    let tree = build_tree(&star(&[3.0, 1.0, 2.0])).unwrap();

    // Act
    let first = diameter_by_shortest_path(&tree).unwrap();
    let second = diameter_by_shortest_path(&tree).unwrap();

    // Assert
    assert_eq!(first, second);
    assert_eq!(diameter_by_walk(&tree).unwrap(), diameter_by_walk(&tree).unwrap());
}

/// Random trees: node i > 0 hangs below a uniformly chosen earlier node.
fn random_tree() -> impl Strategy<Value = Vec<SwcNode>> {
    (1usize..80)
        .prop_flat_map(|n| {
            (
                proptest::collection::vec(
                    (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0),
                    n,
                ),
                proptest::collection::vec(any::<Index>(), n),
            )
        })
        .prop_map(|(positions, parents)| {
            positions
                .into_iter()
                .zip(parents)
                .enumerate()
                .map(|(i, ((x, y, z), parent))| {
                    let parent = (i > 0).then(|| parent.index(i) as i64 + 1);
                    SwcNode::new(i as i64 + 1, Point3::new(x, y, z), parent)
                })
                .collect()
        })
}

proptest! {
    #[test]
    fn walk_memoized_and_shortest_path_agree(nodes in random_tree()) {
        let tree = build_tree(&nodes).unwrap();

        let walk = diameter_by_walk(&tree).unwrap();
        let memo = diameter_memoized(&tree).unwrap();
        let shortest = diameter_by_shortest_path(&tree).unwrap();

        prop_assert!(agrees(walk, memo, DEFAULT_TOLERANCE), "walk {} memo {}", walk, memo);
        prop_assert!(
            agrees(walk, shortest.max_distance, DEFAULT_TOLERANCE),
            "walk {} shortest {}", walk, shortest.max_distance
        );
    }

    #[test]
    fn longest_path_runs_root_to_leaf_with_matching_weight(nodes in random_tree()) {
        let tree = build_tree(&nodes).unwrap();

        let longest = diameter_by_shortest_path(&tree).unwrap();

        prop_assert_eq!(longest.path.first().copied(), tree.root());
        let last = *longest.path.last().unwrap();
        prop_assert!(tree.leaf_nodes().contains(&last));
        prop_assert!(agrees(path_weight(&tree, &longest.path), longest.max_distance, DEFAULT_TOLERANCE));
    }
}
