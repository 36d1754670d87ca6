//! Core types and data structures for the disk-based R*-tree.
//!
//! This module defines the fundamental types used throughout the tree:
//! - Error types and result types
//! - Node types (Leaf and Internal) and the entries they hold
//! - Statistics and integrity reports
//! - Tree header and checksummed page wrapper

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

use super::rtree_constants::{MAGIC, VERSION};
use crate::hyper_rectangle::HyperRectangle;
use crate::spatial_point::{ObjectId, SpatialPoint};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur in spatial indexing operations
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Node is full (capacity {capacity})")]
    NodeFull { capacity: usize },

    #[error("Corrupt page {page_id}: {reason}")]
    CorruptPage { page_id: PageId, reason: String },

    #[error("I/O failure: {0}")]
    IoFailure(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;

/// Page ID - unique identifier for a node in the persistence layer
pub type PageId = u64;

// ============================================================================
// Statistics
// ============================================================================

/// Statistics about R*-tree operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RTreeStats {
    pub total_entries: u64,
    pub tree_height: u32,
    pub cached_pages: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub node_loads: u64,
    pub node_stores: u64,
    pub splits: u64,
    pub reinsertions: u64,
}

/// Result of a full structural check of the tree
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    /// Total nodes visited
    pub nodes_checked: u64,
    /// Points found in the leaves
    pub entries_found: u64,
    /// Depth of the leaves (root is depth 1); `None` until a leaf is seen
    pub leaf_depth: Option<u32>,
    /// Detailed violations
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no invariant violation was recorded
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

// ============================================================================
// Node Types
// ============================================================================

/// A child reference in an internal node: the child's MBR and its page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRef {
    pub mbr: HyperRectangle,
    pub page_id: PageId,
}

/// Anything that can be stored in a node
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Point(SpatialPoint),
    Child(ChildRef),
}

impl Entry {
    pub fn mbr(&self) -> HyperRectangle {
        match self {
            Entry::Point(point) => point.mbr(),
            Entry::Child(child) => child.mbr.clone(),
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Entry::Point(point) => point.dimension(),
            Entry::Child(child) => child.mbr.dimension(),
        }
    }
}

/// Entries of a node that overlap a query region
#[derive(Debug)]
pub enum OverlappingEntries<'a> {
    Points(Vec<&'a SpatialPoint>),
    Children(Vec<&'a ChildRef>),
}

impl OverlappingEntries<'_> {
    pub fn len(&self) -> usize {
        match self {
            OverlappingEntries::Points(points) => points.len(),
            OverlappingEntries::Children(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Node types in the R*-tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Leaf node containing indexed points
    Leaf { entries: Vec<SpatialPoint> },
    /// Internal node containing child references
    Internal {
        children: Vec<ChildRef>,
        level: u32, // Height from leaf level (leaves are 0)
    },
}

impl Node {
    pub fn empty_leaf() -> Self {
        Node::Leaf {
            entries: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Height above the leaf level
    pub fn level(&self) -> u32 {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { level, .. } => *level,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Node::Leaf { entries } => entries.len(),
            Node::Internal { children, .. } => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self, capacity: usize) -> bool {
        self.len() >= capacity
    }

    /// Union of all entry shapes, `None` for an empty node.
    pub fn bounding_box(&self) -> Option<HyperRectangle> {
        match self {
            Node::Leaf { entries } => {
                let (first, rest) = entries.split_first()?;
                let mut bbox = first.mbr();
                for point in rest {
                    bbox.expand_point(point.coordinates());
                }
                Some(bbox)
            }
            Node::Internal { children, .. } => {
                let (first, rest) = children.split_first()?;
                let mut bbox = first.mbr.clone();
                for child in rest {
                    bbox.expand(&child.mbr);
                }
                Some(bbox)
            }
        }
    }

    /// Appends an entry, failing with `NodeFull` when at capacity.
    pub fn insert_entry(&mut self, entry: Entry, capacity: usize) -> SpatialResult<()> {
        if self.is_full(capacity) {
            return Err(SpatialError::NodeFull { capacity });
        }
        self.push_entry(entry)
    }

    /// Appends an entry without a capacity check; the node may overflow by one
    /// until the engine splits it or evicts entries for reinsertion.
    pub(crate) fn push_entry(&mut self, entry: Entry) -> SpatialResult<()> {
        match (self, entry) {
            (Node::Leaf { entries }, Entry::Point(point)) => {
                entries.push(point);
                Ok(())
            }
            (Node::Internal { children, .. }, Entry::Child(child)) => {
                children.push(child);
                Ok(())
            }
            (Node::Leaf { .. }, Entry::Child(_)) => Err(SpatialError::InvalidOperation(
                "cannot store a child reference in a leaf node".into(),
            )),
            (Node::Internal { .. }, Entry::Point(_)) => Err(SpatialError::InvalidOperation(
                "cannot store a point in an internal node".into(),
            )),
        }
    }

    /// Entries relevant to a query: child refs whose MBR intersects it for
    /// internal nodes, points inside it for leaves.
    pub fn overlapping_entries(&self, query: &HyperRectangle) -> OverlappingEntries<'_> {
        match self {
            Node::Leaf { entries } => OverlappingEntries::Points(
                entries
                    .iter()
                    .filter(|point| query.covers_point(point.coordinates()))
                    .collect(),
            ),
            Node::Internal { children, .. } => OverlappingEntries::Children(
                children
                    .iter()
                    .filter(|child| child.mbr.touches(query))
                    .collect(),
            ),
        }
    }

    /// Structural sanity check applied to every node read from a store.
    pub fn validate(&self, dimension: usize, capacity: usize) -> Result<(), String> {
        if self.len() > capacity {
            return Err(format!(
                "{} entries exceed capacity {}",
                self.len(),
                capacity
            ));
        }
        match self {
            Node::Leaf { entries } => {
                if let Some(point) = entries.iter().find(|p| p.dimension() != dimension) {
                    return Err(format!(
                        "point {} has dimension {}, tree has {}",
                        point.object_id(),
                        point.dimension(),
                        dimension
                    ));
                }
            }
            Node::Internal { children, level } => {
                if *level == 0 {
                    return Err("internal node at leaf level".into());
                }
                if let Some(child) = children.iter().find(|c| c.mbr.dimension() != dimension) {
                    return Err(format!(
                        "child {} has dimension {}, tree has {}",
                        child.page_id,
                        child.mbr.dimension(),
                        dimension
                    ));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Page with Checksum
// ============================================================================

/// A page wrapped with CRC32 checksum for corruption detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageWithChecksum {
    /// CRC32 checksum of the node data
    pub checksum: u32,
    /// The actual node data
    pub node: Node,
}

impl PageWithChecksum {
    pub fn new(node: Node) -> SpatialResult<Self> {
        let checksum = Self::calculate_checksum(&node)?;
        Ok(Self { checksum, node })
    }

    /// Calculate CRC32 checksum of node data
    pub fn calculate_checksum(node: &Node) -> SpatialResult<u32> {
        let serialized = bincode::serde::encode_to_vec(node, bincode::config::legacy())
            .map_err(|e| SpatialError::Serialization(e.to_string()))?;
        Ok(Self::crc32(&serialized))
    }

    /// CRC32-MPEG2 implementation (matching common checksums)
    fn crc32(data: &[u8]) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;
        const POLY: u32 = 0x04C11DB7;

        for &byte in data {
            crc ^= (byte as u32) << 24;
            for _ in 0..8 {
                crc = if crc & 0x80000000 != 0 {
                    (crc << 1) ^ POLY
                } else {
                    crc << 1
                };
            }
        }

        crc ^ 0xFFFFFFFF
    }

    /// Verify checksum and consume self to return node
    pub fn into_node(self, page_id: PageId) -> SpatialResult<Node> {
        let expected = Self::calculate_checksum(&self.node)?;
        if self.checksum != expected {
            return Err(SpatialError::CorruptPage {
                page_id,
                reason: format!(
                    "checksum mismatch (expected: {:x}, got: {:x})",
                    expected, self.checksum
                ),
            });
        }
        Ok(self.node)
    }
}

// ============================================================================
// Tree Header
// ============================================================================

/// Root/metadata record of a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeHeader {
    pub magic: u32,
    pub version: u32,
    pub dimension: u32,
    pub page_size: u32,
    pub capacity: u32,
    pub min_fill: u32,
    pub reinsert_fraction: f64,
    pub root_page: PageId,
    pub height: u32,
    pub entry_count: u64,
}

impl TreeHeader {
    pub fn validate(&self) -> SpatialResult<()> {
        if self.magic != MAGIC {
            return Err(SpatialError::CorruptPage {
                page_id: 0,
                reason: "invalid file format (bad magic)".into(),
            });
        }
        if self.version != VERSION {
            return Err(SpatialError::CorruptPage {
                page_id: 0,
                reason: format!("unsupported format version {}", self.version),
            });
        }
        if self.dimension == 0 || self.height == 0 || self.root_page == 0 {
            return Err(SpatialError::CorruptPage {
                page_id: 0,
                reason: "header has zero dimension, height or root".into(),
            });
        }
        if self.capacity < 2 || self.min_fill == 0 || self.min_fill > self.capacity / 2 {
            return Err(SpatialError::CorruptPage {
                page_id: 0,
                reason: format!(
                    "inconsistent capacity {} / min fill {}",
                    self.capacity, self.min_fill
                ),
            });
        }
        Ok(())
    }

    pub fn root_level(&self) -> u32 {
        self.height - 1
    }
}
