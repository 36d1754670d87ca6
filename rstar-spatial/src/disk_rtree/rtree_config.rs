//! Tree configuration and node capacity derivation.

use super::rtree_constants::{
    DEFAULT_CACHE_PAGES, DEFAULT_DIMENSION, DEFAULT_MIN_FILL_PERCENT, DEFAULT_PAGE_SIZE,
    DEFAULT_REINSERT_FRACTION, MAX_REINSERT_FRACTION, NODE_OVERHEAD_BYTES,
};
use super::rtree_types::{SpatialError, SpatialResult, TreeHeader};

/// Capacity constants of one tree, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCapacity {
    /// Maximum entries per node (CAPACITY)
    pub max_entries: usize,
    /// Minimum entries per non-root node after a split (MIN_FILL)
    pub min_entries: usize,
}

/// Configuration of a tree, supplied once at creation time.
///
/// Dimension, page size, capacity and reinsertion share are written to the
/// tree header and cannot change afterwards; changing them requires a
/// rebuild. Only `cache_pages` is a per-process setting.
///
/// ```rust
/// use rstar_spatial::RTreeConfig;
///
/// let config = RTreeConfig::new(3).page_size(4096).reinsert_fraction(0.25);
/// let capacity = config.node_capacity().unwrap();
/// assert!(capacity.min_entries <= capacity.max_entries / 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RTreeConfig {
    dimension: usize,
    page_size: usize,
    reinsert_fraction: f64,
    capacity: Option<usize>,
    min_fill: Option<usize>,
    cache_pages: usize,
}

impl Default for RTreeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl RTreeConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            page_size: DEFAULT_PAGE_SIZE,
            reinsert_fraction: DEFAULT_REINSERT_FRACTION,
            capacity: None,
            min_fill: None,
            cache_pages: DEFAULT_CACHE_PAGES,
        }
    }

    /// Rebuilds the persistent part of a configuration from a tree header.
    pub fn from_header(header: &TreeHeader, cache_pages: usize) -> Self {
        Self {
            dimension: header.dimension as usize,
            page_size: header.page_size as usize,
            reinsert_fraction: header.reinsert_fraction,
            capacity: Some(header.capacity as usize),
            min_fill: Some(header.min_fill as usize),
            cache_pages,
        }
    }

    #[inline]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Overrides the derived CAPACITY.
    #[inline]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Overrides the derived MIN_FILL.
    #[inline]
    pub fn min_fill(mut self, min_fill: usize) -> Self {
        self.min_fill = Some(min_fill);
        self
    }

    #[inline]
    pub fn reinsert_fraction(mut self, reinsert_fraction: f64) -> Self {
        self.reinsert_fraction = reinsert_fraction;
        self
    }

    #[inline]
    pub fn cache_pages(mut self, cache_pages: usize) -> Self {
        self.cache_pages = cache_pages;
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn get_page_size(&self) -> usize {
        self.page_size
    }

    pub fn get_reinsert_fraction(&self) -> f64 {
        self.reinsert_fraction
    }

    pub fn get_cache_pages(&self) -> usize {
        self.cache_pages
    }

    /// Encoded size of one internal entry (`ChildRef`): two length-prefixed
    /// coordinate vectors plus the page id. Internal entries are the larger
    /// of the two entry kinds, so they bound the capacity.
    pub fn internal_entry_bytes(dimension: usize) -> usize {
        16 * dimension + 24
    }

    /// Encoded size of one leaf entry (`SpatialPoint`).
    pub fn leaf_entry_bytes(dimension: usize) -> usize {
        8 * dimension + 16
    }

    /// Derives (or validates the overrides of) CAPACITY and MIN_FILL.
    pub fn node_capacity(&self) -> SpatialResult<NodeCapacity> {
        if self.dimension == 0 {
            return Err(SpatialError::InvalidConfig(
                "dimension must be positive".into(),
            ));
        }
        if !(0.0..=MAX_REINSERT_FRACTION).contains(&self.reinsert_fraction) {
            return Err(SpatialError::InvalidConfig(format!(
                "reinsert fraction {} outside [0, {}]",
                self.reinsert_fraction, MAX_REINSERT_FRACTION
            )));
        }
        if self.cache_pages == 0 {
            return Err(SpatialError::InvalidConfig(
                "cache must hold at least one page".into(),
            ));
        }

        let entry_bytes = Self::internal_entry_bytes(self.dimension);
        let usable = self.page_size.saturating_sub(NODE_OVERHEAD_BYTES);
        let page_capacity = usable / entry_bytes;

        let max_entries = match self.capacity {
            Some(capacity) if capacity > page_capacity => {
                return Err(SpatialError::InvalidConfig(format!(
                    "capacity {} does not fit in a {} byte page (max {})",
                    capacity, self.page_size, page_capacity
                )));
            }
            Some(capacity) => capacity,
            None => page_capacity,
        };
        if max_entries < 2 {
            return Err(SpatialError::InvalidConfig(format!(
                "page size {} holds {} entries, need at least 2",
                self.page_size, max_entries
            )));
        }

        let min_entries = match self.min_fill {
            Some(min_fill) => min_fill,
            None => (max_entries * DEFAULT_MIN_FILL_PERCENT / 100).clamp(1, max_entries / 2),
        };
        if min_entries == 0 || min_entries > max_entries / 2 {
            return Err(SpatialError::InvalidConfig(format!(
                "min fill {} must lie in [1, {}]",
                min_entries,
                max_entries / 2
            )));
        }

        Ok(NodeCapacity {
            max_entries,
            min_entries,
        })
    }
}
