use rand::rngs::StdRng;
use rand::SeedableRng;
use rstar_int_test::test_util::{
    brute_force, cleanup, create_small_node_context, create_test_context, point, random_points,
    random_query, rect, run_test, sorted,
};
use rstar_spatial::{SpatialError, SpatialIndex};
use std::thread;

#[test]
fn test_search_matches_linear_scan() {
    run_test(
        create_small_node_context,
        |ctx| {
            let index = ctx.tree();
            let points = random_points(77, 1500, 2);
            index.add_all(points.clone())?;

            let mut rng = StdRng::seed_from_u64(78);
            for _ in 0..100 {
                let query = random_query(&mut rng, 2, 250.0);
                let found = sorted(index.find_within(&query)?);
                assert_eq!(found, brute_force(&points, &query), "query {}", query);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_search_on_empty_tree() {
    run_test(
        create_test_context,
        |ctx| {
            let found = ctx.tree().find_within(&rect(&[-10.0, -10.0], &[10.0, 10.0]))?;
            assert!(found.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_query_touching_points_on_its_boundary() {
    run_test(
        create_small_node_context,
        |ctx| {
            let index = ctx.tree();
            for i in 0..10 {
                index.add(point(&[i as f64, 0.0], i))?;
            }

            // Edges and corners count
            let found = index.find_within(&rect(&[2.0, 0.0], &[4.0, 0.0]))?;
            assert_eq!(sorted(found), vec![2, 3, 4]);

            let found = index.find_within(&rect(&[9.0, -1.0], &[20.0, 0.0]))?;
            assert_eq!(found, vec![9]);

            let found = index.find_within(&rect(&[4.5, 0.0], &[4.9, 1.0]))?;
            assert!(found.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_search_rejects_wrong_dimension() {
    run_test(
        create_test_context,
        |ctx| {
            let result = ctx.tree().find_within(&rect(&[0.0], &[1.0]));
            assert!(matches!(result, Err(SpatialError::DimensionMismatch { .. })));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_search_iter_can_stop_early() {
    run_test(
        create_small_node_context,
        |ctx| {
            let index = ctx.tree();
            index.add_all(random_points(4, 500, 2))?;

            let tree = index.read();
            let all = rect(&[0.0, 0.0], &[1000.0, 1000.0]);
            let loads_before = tree.stats().node_loads;
            let first = tree.search_iter(&all)?.next();
            assert!(matches!(first, Some(Ok(_))));

            // A full scan afterwards still sees every point
            assert_eq!(tree.search_iter(&all)?.count(), 500);
            assert!(tree.stats().node_loads >= loads_before);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_concurrent_searches_during_inserts() {
    run_test(
        create_small_node_context,
        |ctx| {
            let index = ctx.tree();
            let points = random_points(19, 1200, 2);
            index.add_all(points[..600].to_vec())?;

            let writer = {
                let index = index.clone();
                let rest = points[600..].to_vec();
                thread::spawn(move || {
                    for p in rest {
                        index.add(p).unwrap();
                    }
                })
            };

            let readers: Vec<_> = (0..3)
                .map(|seed| {
                    let index = index.clone();
                    thread::spawn(move || {
                        let mut rng = StdRng::seed_from_u64(seed);
                        for _ in 0..30 {
                            let query = random_query(&mut rng, 2, 400.0);
                            index.find_within(&query).unwrap();
                        }
                    })
                })
                .collect();

            writer.join().unwrap();
            for reader in readers {
                reader.join().unwrap();
            }

            let all = rect(&[0.0, 0.0], &[1000.0, 1000.0]);
            assert_eq!(sorted(index.find_within(&all)?), brute_force(&points, &all));
            Ok(())
        },
        cleanup,
    )
}
