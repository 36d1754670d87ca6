//! Disk-page R*-tree for multi-dimensional point indexing.
//!
//! This module provides the tree engine and everything it needs:
//! - One node per page, loaded on demand through a [`NodeStore`]
//! - LRU cache for hot pages
//! - R* insertion: overlap-aware subtree choice, forced reinsertion and the
//!   margin/overlap driven split
//! - Lazy range search that only visits pages whose MBR meets the query
//!
//! The engine never depends on a byte layout; [`DirectoryStore`] and
//! [`MemoryStore`] are the two stores shipped with it.

pub mod rtree_types;
pub mod rtree_constants;
pub mod rtree_config;
pub mod rtree_cache;
pub mod rtree_storage;
mod rtree_split;
mod rtree_impl;
mod rtree_shared;

pub use rtree_types::{
    SpatialError, SpatialResult, RTreeStats, IntegrityReport, Node, ChildRef, Entry,
    OverlappingEntries, PageId, PageWithChecksum, TreeHeader,
};
pub use rtree_constants::{DEFAULT_CACHE_PAGES, DEFAULT_PAGE_SIZE, DEFAULT_REINSERT_FRACTION};
pub use rtree_config::{NodeCapacity, RTreeConfig};
pub use rtree_storage::{DirectoryStore, MemoryStore, NodeStore};
pub use rtree_impl::{RStarTree, SearchIter};
pub use rtree_shared::SharedRStarTree;
