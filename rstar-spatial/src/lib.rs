//! # rstar-spatial - Disk-page R*-tree spatial index
//!
//! This crate indexes multi-dimensional points, each tagged with the id of an
//! external record, and answers "which records lie inside this box" without
//! scanning them all.
//!
//! ## Features
//!
//! - **Disk-Page Nodes**: one node per page, loaded on demand
//! - **LRU Cache**: frequently accessed pages kept in memory
//! - **R\* Insertion**: overlap-aware subtree choice, forced reinsertion and
//!   the R\* split keep the tree tight
//! - **Atomic Inserts**: an insert either commits completely or leaves the
//!   tree unchanged
//! - **Pluggable Storage**: a directory per tree, or memory only
//!
//! ## R*-Tree API
//!
//! ```rust
//! use rstar_spatial::{HyperRectangle, RStarTree, RTreeConfig, SpatialPoint};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let mut tree = RStarTree::create_in_dir(dir.path(), RTreeConfig::new(2))?;
//!
//! tree.insert(SpatialPoint::new(vec![1.0, 1.0], 10)?)?;
//! tree.insert(SpatialPoint::new(vec![4.0, 7.0], 11)?)?;
//! tree.insert(SpatialPoint::new(vec![9.0, 2.0], 12)?)?;
//!
//! let query = HyperRectangle::new(vec![0.0, 0.0], vec![5.0, 8.0])?;
//! let mut found = tree.search(&query)?;
//! found.sort_unstable();
//! assert_eq!(found, vec![10, 11]);
//!
//! tree.flush()?;
//! drop(tree);
//!
//! // Reopening reads only the header; nodes come back as they are needed.
//! let tree = RStarTree::open_dir(dir.path())?;
//! assert_eq!(tree.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod disk_rtree;
pub mod hyper_rectangle;
pub mod spatial_index;
pub mod spatial_point;

pub use disk_rtree::{
    DirectoryStore, IntegrityReport, MemoryStore, NodeCapacity, NodeStore, RStarTree,
    RTreeConfig, RTreeStats, SearchIter, SharedRStarTree, SpatialError, SpatialResult,
};
pub use hyper_rectangle::HyperRectangle;
pub use spatial_index::SpatialIndex;
pub use spatial_point::{ObjectId, SpatialPoint};
