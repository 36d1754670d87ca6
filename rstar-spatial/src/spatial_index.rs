//! SpatialIndex trait definition.

use crate::disk_rtree::rtree_types::SpatialResult;
use crate::hyper_rectangle::HyperRectangle;
use crate::spatial_point::{ObjectId, SpatialPoint};

/// A point index that can be shared between threads.
///
/// Implementations serialise writers themselves, so every method takes
/// `&self`.
pub trait SpatialIndex: Send + Sync {
    /// Adds a point to the index.
    fn add(&self, point: SpatialPoint) -> SpatialResult<()>;

    /// Adds every point, stopping at the first failure. Returns the number
    /// of points added.
    fn add_all(&self, points: Vec<SpatialPoint>) -> SpatialResult<usize> {
        let mut added = 0;
        for point in points {
            self.add(point)?;
            added += 1;
        }
        Ok(added)
    }

    /// Finds the ids of all points inside the query region, bounds included.
    fn find_within(&self, query: &HyperRectangle) -> SpatialResult<Vec<ObjectId>>;

    /// Gets the number of indexed points.
    fn size(&self) -> u64;

    /// Makes all added points durable.
    fn flush(&self) -> SpatialResult<()>;
}
