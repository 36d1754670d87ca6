use rand::rngs::StdRng;
use rand::SeedableRng;
use rstar_int_test::test_util::{
    brute_force, cleanup, create_small_node_context, random_points, random_query, rect, run_test,
    sorted,
};
use rstar_spatial::disk_rtree::rtree_constants::TREE_FILE;
use rstar_spatial::{
    DirectoryStore, RStarTree, RTreeConfig, SpatialError, SpatialIndex,
};
use std::fs;

#[test]
fn test_reopen_preserves_points_and_shape() {
    run_test(
        create_small_node_context,
        |ctx| {
            let points = random_points(41, 700, 2);
            ctx.tree().add_all(points.clone())?;
            let (height, capacity) = {
                let tree = ctx.tree();
                let tree = tree.read();
                (tree.height(), tree.capacity())
            };

            let reopened = ctx.reopen(8)?;
            let index = reopened.tree();
            {
                let tree = index.read();
                assert_eq!(tree.len(), 700);
                assert_eq!(tree.height(), height);
                assert_eq!(tree.capacity(), capacity);
                assert_eq!(tree.stats().cached_pages, 0);
            }

            let mut rng = StdRng::seed_from_u64(42);
            for _ in 0..40 {
                let query = random_query(&mut rng, 2, 300.0);
                assert_eq!(sorted(index.find_within(&query)?), brute_force(&points, &query));
            }
            assert!(index.read().stats().cached_pages <= 8);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_inserts_continue_after_reopen() {
    run_test(
        create_small_node_context,
        |ctx| {
            let points = random_points(43, 400, 2);
            ctx.tree().add_all(points[..200].to_vec())?;

            let reopened = ctx.reopen(32)?;
            let index = reopened.tree();
            index.add_all(points[200..].to_vec())?;
            assert_eq!(index.size(), 400);

            let report = index.read().check_integrity()?;
            assert!(report.is_valid(), "{:?}", report.errors);

            let all = rect(&[0.0, 0.0], &[1000.0, 1000.0]);
            assert_eq!(sorted(index.find_within(&all)?), brute_force(&points, &all));
            cleanup(reopened)
        },
        |_| Ok(()),
    )
}

#[test]
fn test_corrupted_node_file_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let root_page = {
        let mut tree =
            RStarTree::create_in_dir(dir.path(), RTreeConfig::new(2).capacity(6)).unwrap();
        tree.insert_all(random_points(3, 100, 2)).unwrap();
        tree.flush().unwrap();
        tree.root_page()
    };

    let store = DirectoryStore::open(dir.path()).unwrap();
    let path = store.node_path(root_page);
    let mut bytes = fs::read(&path).unwrap();
    // Damage the stored checksum
    bytes[0] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let tree = RStarTree::open_dir(dir.path()).unwrap();
    let result = tree.search(&rect(&[0.0, 0.0], &[1000.0, 1000.0]));
    assert!(matches!(result, Err(SpatialError::CorruptPage { .. })));

    let report = tree.check_integrity().unwrap();
    assert!(!report.is_valid());
}

#[test]
fn test_garbled_header_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut tree = RStarTree::create_in_dir(dir.path(), RTreeConfig::default()).unwrap();
        tree.insert_all(random_points(9, 10, 2)).unwrap();
    }
    fs::write(dir.path().join(TREE_FILE), b"not a tree").unwrap();

    let result = RStarTree::open_dir(dir.path());
    assert!(matches!(
        result,
        Err(SpatialError::CorruptPage { page_id: 0, .. })
    ));
}

#[test]
fn test_create_refuses_existing_tree() {
    let dir = tempfile::tempdir().unwrap();
    RStarTree::create_in_dir(dir.path(), RTreeConfig::default()).unwrap();

    let result = RStarTree::create_in_dir(dir.path(), RTreeConfig::default());
    assert!(matches!(result, Err(SpatialError::InvalidOperation(_))));
}

#[test]
fn test_open_missing_tree_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(RStarTree::open_dir(dir.path()).is_err());
}
