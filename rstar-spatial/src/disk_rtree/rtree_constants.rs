//! Constants for the disk-based R*-tree.

/// Default page size (8KB) - one node per page
pub const DEFAULT_PAGE_SIZE: usize = 8192;

/// Default number of dimensions
pub const DEFAULT_DIMENSION: usize = 2;

/// Default share of an overflowing node that is reinserted from the root
pub const DEFAULT_REINSERT_FRACTION: f64 = 0.30;

/// Upper bound for the reinsertion share
pub const MAX_REINSERT_FRACTION: f64 = 0.5;

/// Minimum fill as a percentage of capacity (typically 40%)
pub const DEFAULT_MIN_FILL_PERCENT: usize = 40;

/// Default cache size in number of pages (2MB with 8KB pages)
pub const DEFAULT_CACHE_PAGES: usize = 256;

/// Bytes reserved per page for the checksum, enum tag, level and length prefix
pub const NODE_OVERHEAD_BYTES: usize = 32;

/// Page id reserved for the tree header
pub const HEADER_PAGE: u64 = 0;

/// Magic number for file format identification
pub const MAGIC: u32 = 0x5253_5452; // "RSTR"

/// File format version
pub const VERSION: u32 = 1;

/// Node file naming inside a tree directory: `rstar_<id>.node`
pub const NODE_FILE_PREFIX: &str = "rstar_";
pub const NODE_FILE_SUFFIX: &str = ".node";

/// Metadata record inside a tree directory
pub const TREE_FILE: &str = "tree.rstar";
