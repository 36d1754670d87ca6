//! Thread-safe handle around an [`RStarTree`].

use std::sync::Arc;

use log::trace;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::rtree_impl::RStarTree;
use super::rtree_storage::{DirectoryStore, NodeStore};
use super::rtree_types::SpatialResult;
use crate::hyper_rectangle::HyperRectangle;
use crate::spatial_index::SpatialIndex;
use crate::spatial_point::{ObjectId, SpatialPoint};

/// Cloneable handle to a tree shared between threads.
///
/// Inserts take the write lock, searches the read lock, so any number of
/// searches run alongside each other and never observe a half-done insert.
pub struct SharedRStarTree<S: NodeStore = DirectoryStore> {
    inner: Arc<RwLock<RStarTree<S>>>,
}

impl<S: NodeStore> Clone for SharedRStarTree<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: NodeStore> SharedRStarTree<S> {
    pub fn new(tree: RStarTree<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, RStarTree<S>> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, RStarTree<S>> {
        self.inner.write()
    }
}

impl<S: NodeStore> From<RStarTree<S>> for SharedRStarTree<S> {
    fn from(tree: RStarTree<S>) -> Self {
        Self::new(tree)
    }
}

impl<S: NodeStore> SpatialIndex for SharedRStarTree<S> {
    fn add(&self, point: SpatialPoint) -> SpatialResult<()> {
        self.inner.write().insert(point)
    }

    fn add_all(&self, points: Vec<SpatialPoint>) -> SpatialResult<usize> {
        // One lock for the whole batch
        let mut tree = self.inner.write();
        trace!("Adding batch of {} points", points.len());
        tree.insert_all(points)
    }

    fn find_within(&self, query: &HyperRectangle) -> SpatialResult<Vec<ObjectId>> {
        self.inner.read().search(query)
    }

    fn size(&self) -> u64 {
        self.inner.read().len()
    }

    fn flush(&self) -> SpatialResult<()> {
        self.inner.read().flush()
    }
}
