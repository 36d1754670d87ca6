//! Persistence layer for the R*-tree.
//!
//! The tree engine only talks to the [`NodeStore`] trait: load a node by id,
//! store a node by id, allocate a fresh id, and read/write the tree header.
//! Two stores are provided:
//! - [`DirectoryStore`]: one directory per tree, one file per node, plus a
//!   metadata file. Each read touches exactly one node file.
//! - [`MemoryStore`]: nodes kept in a map, for ephemeral indexes and tests.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::rtree_constants::{
    HEADER_PAGE, NODE_FILE_PREFIX, NODE_FILE_SUFFIX, TREE_FILE,
};
use super::rtree_types::{
    Node, PageId, PageWithChecksum, SpatialError, SpatialResult, TreeHeader,
};

/// Load/store interface consumed by the tree engine.
///
/// Implementations own the byte layout. They report undecodable or
/// inconsistent pages as [`SpatialError::CorruptPage`] and write errors as
/// [`SpatialError::IoFailure`]. Retrying transient failures is up to the
/// store; the engine never retries.
pub trait NodeStore: Send + Sync {
    /// Loads the node stored under `page_id`.
    fn load_node(&self, page_id: PageId) -> SpatialResult<Node>;

    /// Stores (creates or replaces) the node under `page_id`.
    fn store_node(&self, page_id: PageId, node: &Node) -> SpatialResult<()>;

    /// Allocates an id that has never been handed out by this store.
    fn new_node_id(&self) -> SpatialResult<PageId>;

    /// Loads the tree header, `None` if the store holds no tree yet.
    fn load_header(&self) -> SpatialResult<Option<TreeHeader>>;

    /// Stores the tree header.
    fn store_header(&self, header: &TreeHeader) -> SpatialResult<()>;

    /// Makes everything stored so far durable.
    fn sync(&self) -> SpatialResult<()> {
        Ok(())
    }
}

fn check_page_id(page_id: PageId) -> SpatialResult<()> {
    if page_id == HEADER_PAGE {
        return Err(SpatialError::InvalidOperation(
            "page 0 is reserved for the tree header".into(),
        ));
    }
    Ok(())
}

// ============================================================================
// Directory Store
// ============================================================================

/// Stores one tree in a directory: `rstar_<id>.node` per node and
/// `tree.rstar` for the header.
///
/// Node files hold a bincode-encoded [`PageWithChecksum`]. A page that does
/// not fit in `page_size` bytes is rejected on write. Files are replaced by
/// writing a temporary file and renaming it over the old one.
pub struct DirectoryStore {
    dir: PathBuf,
    page_size: usize,
    next_page_id: AtomicU64,
}

impl DirectoryStore {
    /// Creates a store in `dir`, creating the directory if needed.
    ///
    /// Fails if the directory already holds a tree.
    pub fn create(dir: impl AsRef<Path>, page_size: usize) -> SpatialResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        if dir.join(TREE_FILE).exists() {
            return Err(SpatialError::InvalidOperation(format!(
                "{} already holds a tree",
                dir.display()
            )));
        }

        Ok(Self {
            dir,
            page_size,
            next_page_id: AtomicU64::new(1),
        })
    }

    /// Opens the store of an existing tree.
    ///
    /// Only the header is read; node files stay on disk until accessed. The
    /// next node id is derived from the node files present.
    pub fn open(dir: impl AsRef<Path>) -> SpatialResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let header = read_header_file(&dir.join(TREE_FILE))?.ok_or_else(|| {
            SpatialError::InvalidOperation(format!("{} holds no tree", dir.display()))
        })?;

        let mut max_id = 0;
        for entry in fs::read_dir(&dir)? {
            let name = entry?.file_name();
            if let Some(page_id) = name.to_str().and_then(parse_node_file_name) {
                max_id = max_id.max(page_id);
            }
        }

        Ok(Self {
            dir,
            page_size: header.page_size as usize,
            next_page_id: AtomicU64::new(max_id + 1),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Path of the file holding `page_id`.
    pub fn node_path(&self, page_id: PageId) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", NODE_FILE_PREFIX, page_id, NODE_FILE_SUFFIX))
    }

    fn replace_file(&self, path: &Path, bytes: &[u8]) -> SpatialResult<()> {
        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn parse_node_file_name(name: &str) -> Option<PageId> {
    name.strip_prefix(NODE_FILE_PREFIX)?
        .strip_suffix(NODE_FILE_SUFFIX)?
        .parse()
        .ok()
}

fn read_header_file(path: &Path) -> SpatialResult<Option<TreeHeader>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    bincode::serde::decode_from_slice(&bytes, bincode::config::legacy())
        .map(|(header, _)| Some(header))
        .map_err(|e| SpatialError::CorruptPage {
            page_id: HEADER_PAGE,
            reason: e.to_string(),
        })
}

impl NodeStore for DirectoryStore {
    fn load_node(&self, page_id: PageId) -> SpatialResult<Node> {
        check_page_id(page_id)?;

        let mut buffer = Vec::with_capacity(self.page_size);
        File::open(self.node_path(page_id))?.read_to_end(&mut buffer)?;
        if buffer.len() > self.page_size {
            return Err(SpatialError::CorruptPage {
                page_id,
                reason: format!("{} bytes exceed page size {}", buffer.len(), self.page_size),
            });
        }

        let page: PageWithChecksum =
            bincode::serde::decode_from_slice(&buffer, bincode::config::legacy())
                .map(|(page, _)| page)
                .map_err(|e| SpatialError::CorruptPage {
                    page_id,
                    reason: e.to_string(),
                })?;

        // Verify checksum and extract node
        page.into_node(page_id)
    }

    fn store_node(&self, page_id: PageId, node: &Node) -> SpatialResult<()> {
        check_page_id(page_id)?;

        let page = PageWithChecksum::new(node.clone())?;
        let bytes = bincode::serde::encode_to_vec(&page, bincode::config::legacy())
            .map_err(|e| SpatialError::Serialization(e.to_string()))?;

        if bytes.len() > self.page_size {
            return Err(SpatialError::Serialization(format!(
                "Node too large: {} bytes (max {})",
                bytes.len(),
                self.page_size
            )));
        }

        self.replace_file(&self.node_path(page_id), &bytes)
    }

    fn new_node_id(&self) -> SpatialResult<PageId> {
        Ok(self.next_page_id.fetch_add(1, Ordering::Relaxed))
    }

    fn load_header(&self) -> SpatialResult<Option<TreeHeader>> {
        read_header_file(&self.dir.join(TREE_FILE))
    }

    fn store_header(&self, header: &TreeHeader) -> SpatialResult<()> {
        let bytes = bincode::serde::encode_to_vec(header, bincode::config::legacy())
            .map_err(|e| SpatialError::Serialization(e.to_string()))?;
        self.replace_file(&self.dir.join(TREE_FILE), &bytes)
    }

    fn sync(&self) -> SpatialResult<()> {
        // Directory entries become durable once the directory itself is synced.
        #[cfg(unix)]
        File::open(&self.dir)?.sync_all()?;
        Ok(())
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// Keeps nodes in memory. Nothing survives the process.
pub struct MemoryStore {
    nodes: RwLock<HashMap<PageId, Node>>,
    header: RwLock<Option<TreeHeader>>,
    next_page_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            header: RwLock::new(None),
            next_page_id: AtomicU64::new(1),
        }
    }

    /// Number of stored nodes
    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore for MemoryStore {
    fn load_node(&self, page_id: PageId) -> SpatialResult<Node> {
        check_page_id(page_id)?;
        self.nodes.read().get(&page_id).cloned().ok_or_else(|| {
            SpatialError::IoFailure(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("page {} not found", page_id),
            ))
        })
    }

    fn store_node(&self, page_id: PageId, node: &Node) -> SpatialResult<()> {
        check_page_id(page_id)?;
        self.nodes.write().insert(page_id, node.clone());
        Ok(())
    }

    fn new_node_id(&self) -> SpatialResult<PageId> {
        Ok(self.next_page_id.fetch_add(1, Ordering::Relaxed))
    }

    fn load_header(&self) -> SpatialResult<Option<TreeHeader>> {
        Ok(self.header.read().clone())
    }

    fn store_header(&self, header: &TreeHeader) -> SpatialResult<()> {
        *self.header.write() = Some(header.clone());
        Ok(())
    }
}
