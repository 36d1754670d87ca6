use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstar_spatial::{
    DirectoryStore, HyperRectangle, ObjectId, RStarTree, RTreeConfig, SharedRStarTree,
    SpatialError, SpatialPoint, SpatialResult,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Runs a test between a setup and a teardown step.
///
/// `after` runs even when the test fails or panics, so temporary trees are
/// always cleaned up. Any failure ends in a panic carrying the error.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> SpatialResult<()>,
    B: Fn() -> SpatialResult<TestContext>,
    A: Fn(TestContext) -> SpatialResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let result = catch_unwind(AssertUnwindSafe(|| test(ctx.clone())));
    let after_result = after(ctx);

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            panic!("Test panicked: {}", err_msg);
        }
    }

    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

/// A tree in its own temporary directory.
#[derive(Clone)]
pub struct TestContext {
    dir: Arc<TempDir>,
    tree: SharedRStarTree<DirectoryStore>,
}

impl TestContext {
    pub fn new(dir: Arc<TempDir>, tree: SharedRStarTree<DirectoryStore>) -> Self {
        Self { dir, tree }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tree(&self) -> SharedRStarTree<DirectoryStore> {
        self.tree.clone()
    }

    /// Opens the same directory again with a fresh cache.
    pub fn reopen(&self, cache_pages: usize) -> SpatialResult<TestContext> {
        self.tree.read().flush()?;
        let tree = RStarTree::open_dir_with_cache_size(self.path(), cache_pages)?;
        Ok(TestContext::new(self.dir.clone(), SharedRStarTree::new(tree)))
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn create_test_context() -> SpatialResult<TestContext> {
    create_test_context_with(RTreeConfig::default())
}

pub fn create_test_context_with(config: RTreeConfig) -> SpatialResult<TestContext> {
    init_logger();
    let dir = tempfile::tempdir()?;
    let tree = RStarTree::create_in_dir(dir.path().join("tree"), config)?;
    Ok(TestContext::new(Arc::new(dir), SharedRStarTree::new(tree)))
}

/// Tree with small nodes, so a few hundred points already build several
/// levels.
pub fn create_small_node_context() -> SpatialResult<TestContext> {
    create_test_context_with(RTreeConfig::new(2).capacity(6).min_fill(2).cache_pages(16))
}

/// Flushes the tree and fails when its structure is broken.
pub fn cleanup(ctx: TestContext) -> SpatialResult<()> {
    let tree = ctx.tree();
    let tree = tree.read();
    tree.flush()?;

    let report = tree.check_integrity()?;
    if !report.is_valid() {
        return Err(SpatialError::InvalidOperation(format!(
            "tree left inconsistent: {:?}",
            report.errors
        )));
    }
    Ok(())
}

/// Seeded points spread uniformly over `[0, 1000)` on every axis.
pub fn random_points(seed: u64, count: usize, dimension: usize) -> Vec<SpatialPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let coordinates = (0..dimension).map(|_| rng.gen_range(0.0..1000.0)).collect();
            SpatialPoint::new(coordinates, i as ObjectId).unwrap()
        })
        .collect()
}

/// Random query box with sides up to `max_side`.
pub fn random_query(rng: &mut StdRng, dimension: usize, max_side: f64) -> HyperRectangle {
    let mut min = Vec::with_capacity(dimension);
    let mut max = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let lo = rng.gen_range(-50.0..1000.0);
        min.push(lo);
        max.push(lo + rng.gen_range(0.0..max_side));
    }
    HyperRectangle::new(min, max).unwrap()
}

/// Linear scan answering the same question as a tree search.
pub fn brute_force(points: &[SpatialPoint], query: &HyperRectangle) -> Vec<ObjectId> {
    let mut ids: Vec<_> = points
        .iter()
        .filter(|p| query.contains_point(p.coordinates()).unwrap())
        .map(|p| p.object_id())
        .collect();
    ids.sort_unstable();
    ids
}

pub fn sorted(mut ids: Vec<ObjectId>) -> Vec<ObjectId> {
    ids.sort_unstable();
    ids
}

pub fn rect(min: &[f64], max: &[f64]) -> HyperRectangle {
    HyperRectangle::new(min.to_vec(), max.to_vec()).unwrap()
}

pub fn point(coordinates: &[f64], object_id: ObjectId) -> SpatialPoint {
    SpatialPoint::new(coordinates.to_vec(), object_id).unwrap()
}
