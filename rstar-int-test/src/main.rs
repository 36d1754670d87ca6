use rstar_int_test::test_util::{cleanup, create_test_context, random_points, rect};
use rstar_spatial::{SpatialIndex, SpatialResult};

fn main() -> SpatialResult<()> {
    println!("Starting stress test...");
    let ctx = create_test_context()?;
    let index = ctx.tree();

    let count = 200_000;
    let points = random_points(1, count, 2);

    let start = std::time::Instant::now();
    index.add_all(points)?;
    println!("Inserted {} points in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let found = index.find_within(&rect(&[0.0, 0.0], &[1000.0, 1000.0]))?;
    println!("Found {} points in {:?}", found.len(), start.elapsed());

    let start = std::time::Instant::now();
    let mut hits = 0;
    for i in 0..1000 {
        let x = (i % 100) as f64 * 10.0;
        let y = (i / 100) as f64 * 100.0;
        hits += index.find_within(&rect(&[x, y], &[x + 10.0, y + 10.0]))?.len();
    }
    println!("Ran 1000 small queries ({} hits) in {:?}", hits, start.elapsed());

    let reopened = ctx.reopen(256)?;
    let start = std::time::Instant::now();
    let found = reopened.tree().find_within(&rect(&[250.0, 250.0], &[500.0, 500.0]))?;
    println!("Cold query found {} points in {:?}", found.len(), start.elapsed());
    println!("{:?}", reopened.tree().read().stats());

    cleanup(ctx)
}
