use rstar_int_test::test_util::{
    cleanup, create_small_node_context, create_test_context_with, point, random_points, rect,
    run_test, sorted,
};
use rstar_spatial::{RStarTree, RTreeConfig, SpatialError, SpatialIndex};

#[test]
fn test_three_points_overflow_root_leaf() {
    run_test(
        || create_test_context_with(RTreeConfig::new(2).capacity(2).min_fill(1)),
        |ctx| {
            let index = ctx.tree();
            index.add(point(&[0.0, 0.0], 1))?;
            index.add(point(&[5.0, 5.0], 2))?;
            index.add(point(&[10.0, 10.0], 3))?;

            let tree = index.read();
            assert_eq!(tree.height(), 2);
            assert_eq!(tree.len(), 3);
            assert!(tree.check_integrity()?.is_valid());

            let found = tree.search(&rect(&[-1.0, -1.0], &[11.0, 11.0]))?;
            assert_eq!(sorted(found), vec![1, 2, 3]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invariants_hold_after_every_insert() {
    run_test(
        create_small_node_context,
        |ctx| {
            let index = ctx.tree();
            for p in random_points(31, 300, 2) {
                index.add(p)?;
                let report = index.read().check_integrity()?;
                assert!(report.is_valid(), "{:?}", report.errors);
            }

            let stats = index.read().stats();
            assert_eq!(stats.total_entries, 300);
            assert!(stats.splits > 0);
            assert!(stats.reinsertions > 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_height_grows_only_through_root_splits() {
    run_test(
        create_small_node_context,
        |ctx| {
            let index = ctx.tree();
            let mut last_height = index.read().height();
            for p in random_points(5, 400, 2) {
                index.add(p)?;
                let height = index.read().height();
                assert!(height == last_height || height == last_height + 1);
                last_height = height;
            }
            assert!(last_height >= 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_dimension_mismatch_is_rejected_before_any_change() {
    run_test(
        create_small_node_context,
        |ctx| {
            let index = ctx.tree();
            index.add_all(random_points(8, 50, 2))?;
            let before = index.read().stats();

            let result = index.add(point(&[1.0, 2.0, 3.0], 99));
            assert!(matches!(
                result,
                Err(SpatialError::DimensionMismatch {
                    expected: 2,
                    actual: 3
                })
            ));

            let after = index.read().stats();
            assert_eq!(after.total_entries, before.total_entries);
            assert_eq!(after.node_stores, before.node_stores);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_three_dimensional_tree() {
    run_test(
        || create_test_context_with(RTreeConfig::new(3).capacity(8)),
        |ctx| {
            let index = ctx.tree();
            index.add_all(random_points(12, 500, 3))?;
            assert_eq!(index.size(), 500);

            let tree = index.read();
            assert_eq!(tree.dimension(), 3);
            assert!(tree.check_integrity()?.is_valid());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_ten_thousand_inserts_are_deterministic() {
    let points = random_points(2024, 10_000, 2);
    let build = || {
        let mut tree = RStarTree::in_memory(RTreeConfig::default()).unwrap();
        tree.insert_all(points.iter().cloned()).unwrap();
        tree
    };
    let first = build();
    let second = build();

    assert_eq!(first.len(), 10_000);
    assert_eq!(first.len(), second.len());
    assert_eq!(first.height(), second.height());

    for query in [
        rect(&[0.0, 0.0], &[1000.0, 1000.0]),
        rect(&[100.0, 200.0], &[300.0, 250.0]),
        rect(&[999.0, 999.0], &[2000.0, 2000.0]),
    ] {
        assert_eq!(first.search(&query).unwrap(), second.search(&query).unwrap());
    }

    let report = first.check_integrity().unwrap();
    assert!(report.is_valid(), "{:?}", report.errors);
    assert_eq!(report.entries_found, 10_000);
}
