//! RStarTree implementation.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;

use super::rtree_cache::PageCache;
use super::rtree_config::{NodeCapacity, RTreeConfig};
use super::rtree_constants::{DEFAULT_CACHE_PAGES, MAGIC, VERSION};
use super::rtree_split::{choose_subtree, reinsert_count, split_entries, take_farthest};
use super::rtree_storage::{DirectoryStore, MemoryStore, NodeStore};
use super::rtree_types::{
    ChildRef, Entry, IntegrityReport, Node, OverlappingEntries, PageId, RTreeStats,
    SpatialError, SpatialResult, TreeHeader,
};
use crate::hyper_rectangle::HyperRectangle;
use crate::spatial_point::{ObjectId, SpatialPoint};

/// A disk-page R*-tree over `D`-dimensional points.
///
/// Nodes live in a [`NodeStore`] and are brought into an LRU page cache on
/// first access. The tree has a single writer: [`insert`](Self::insert) takes
/// `&mut self`, searches take `&self`. Each insert is staged in a private
/// working set and committed at the end, so a failed insert leaves the tree
/// as it was before.
pub struct RStarTree<S: NodeStore = DirectoryStore> {
    store: S,
    config: RTreeConfig,
    capacity: NodeCapacity,
    header: TreeHeader,
    cache: Mutex<PageCache>,
    stats: RTreeStatistics,
}

/// Internal statistics tracking
struct RTreeStatistics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    node_loads: AtomicU64,
    node_stores: AtomicU64,
    splits: AtomicU64,
    reinsertions: AtomicU64,
}

impl RTreeStatistics {
    fn new() -> Self {
        Self {
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            node_loads: AtomicU64::new(0),
            node_stores: AtomicU64::new(0),
            splits: AtomicU64::new(0),
            reinsertions: AtomicU64::new(0),
        }
    }
}

/// What happened below a node during one insertion step, as seen by its
/// parent.
#[derive(Debug)]
enum InsertOutcome {
    /// The entry went in; the child MBR grows to cover it.
    Absorbed,
    /// The child split; `kept` is the new MBR of the original page and
    /// `sibling` must be added next to it.
    Split { kept: HyperRectangle, sibling: ChildRef },
    /// Entries left the child for reinsertion; its MBR is now `mbr`.
    Shrunk { mbr: HyperRectangle },
}

/// Working set of one top-level insert.
struct InsertContext {
    header: TreeHeader,
    staged: BTreeMap<PageId, Node>,
    fresh: BTreeSet<PageId>,
    originals: HashMap<PageId, Arc<Node>>,
    reinserted_levels: BTreeSet<u32>,
    /// Entries waiting to be reinserted from the root, with their level.
    pending: Vec<(Entry, u32)>,
    splits: u64,
    reinsertions: u64,
}

impl InsertContext {
    fn new(header: TreeHeader) -> Self {
        Self {
            header,
            staged: BTreeMap::new(),
            fresh: BTreeSet::new(),
            originals: HashMap::new(),
            reinserted_levels: BTreeSet::new(),
            pending: Vec::new(),
            splits: 0,
            reinsertions: 0,
        }
    }

    fn stage(&mut self, page_id: PageId, node: Node) {
        self.staged.insert(page_id, node);
    }

    fn allocate<S: NodeStore>(&mut self, store: &S) -> SpatialResult<PageId> {
        let page_id = store.new_node_id()?;
        self.fresh.insert(page_id);
        Ok(page_id)
    }
}

impl RStarTree<DirectoryStore> {
    /// Creates an empty tree in `dir`.
    pub fn create_in_dir(dir: impl AsRef<Path>, config: RTreeConfig) -> SpatialResult<Self> {
        config.node_capacity()?;
        let store = DirectoryStore::create(dir, config.get_page_size())?;
        Self::create(store, config)
    }

    /// Opens the tree stored in `dir` with the default cache size.
    pub fn open_dir(dir: impl AsRef<Path>) -> SpatialResult<Self> {
        Self::open_dir_with_cache_size(dir, DEFAULT_CACHE_PAGES)
    }

    pub fn open_dir_with_cache_size(
        dir: impl AsRef<Path>,
        cache_pages: usize,
    ) -> SpatialResult<Self> {
        Self::open(DirectoryStore::open(dir)?, cache_pages)
    }
}

impl RStarTree<MemoryStore> {
    /// Creates an empty tree that lives in memory only.
    pub fn in_memory(config: RTreeConfig) -> SpatialResult<Self> {
        Self::create(MemoryStore::new(), config)
    }
}

impl<S: NodeStore> RStarTree<S> {
    /// Creates an empty tree in `store`: an empty leaf root, height 1.
    ///
    /// Fails with `InvalidConfig` for an invalid configuration and with
    /// `InvalidOperation` when the store already holds a tree.
    pub fn create(store: S, config: RTreeConfig) -> SpatialResult<Self> {
        let capacity = config.node_capacity()?;
        if store.load_header()?.is_some() {
            return Err(SpatialError::InvalidOperation(
                "store already holds a tree".into(),
            ));
        }

        let root_page = store.new_node_id()?;
        let root = Node::empty_leaf();
        store.store_node(root_page, &root)?;

        let header = TreeHeader {
            magic: MAGIC,
            version: VERSION,
            dimension: config.dimension() as u32,
            page_size: config.get_page_size() as u32,
            capacity: capacity.max_entries as u32,
            min_fill: capacity.min_entries as u32,
            reinsert_fraction: config.get_reinsert_fraction(),
            root_page,
            height: 1,
            entry_count: 0,
        };
        store.store_header(&header)?;

        info!(
            "Created R*-tree: dimension {}, page size {}, capacity {}/{}",
            header.dimension, header.page_size, capacity.max_entries, capacity.min_entries
        );

        let tree = Self::assemble(store, config, capacity, header);
        tree.cache_page(root_page, Arc::new(root));
        Ok(tree)
    }

    /// Opens the tree held by `store`. Only the header is read; nodes are
    /// loaded on demand.
    pub fn open(store: S, cache_pages: usize) -> SpatialResult<Self> {
        if cache_pages == 0 {
            return Err(SpatialError::InvalidConfig(
                "cache must hold at least one page".into(),
            ));
        }
        let header = store.load_header()?.ok_or_else(|| {
            SpatialError::InvalidOperation("store holds no tree".into())
        })?;
        header.validate()?;

        // Everything else in the config comes from the header.
        let config = RTreeConfig::from_header(&header, cache_pages);
        let capacity = config.node_capacity().map_err(|e| match e {
            SpatialError::InvalidConfig(reason) => SpatialError::CorruptPage {
                page_id: 0,
                reason,
            },
            other => other,
        })?;

        info!(
            "Opened R*-tree: {} entries, height {}, root page {}",
            header.entry_count, header.height, header.root_page
        );
        Ok(Self::assemble(store, config, capacity, header))
    }

    fn assemble(store: S, config: RTreeConfig, capacity: NodeCapacity, header: TreeHeader) -> Self {
        let cache = PageCache::new(config.get_cache_pages());
        Self {
            store,
            config,
            capacity,
            header,
            cache: Mutex::new(cache),
            stats: RTreeStatistics::new(),
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> u64 {
        self.header.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.header.entry_count == 0
    }

    /// Number of levels, 1 for a tree whose root is a leaf.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension()
    }

    pub fn capacity(&self) -> NodeCapacity {
        self.capacity
    }

    pub fn config(&self) -> &RTreeConfig {
        &self.config
    }

    pub fn root_page(&self) -> PageId {
        self.header.root_page
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives the store back, e.g. to reopen the tree from it.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Get tree statistics
    pub fn stats(&self) -> RTreeStats {
        RTreeStats {
            total_entries: self.header.entry_count,
            tree_height: self.header.height,
            cached_pages: self.cache.lock().len() as u64,
            cache_hits: self.stats.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.stats.cache_misses.load(Ordering::Relaxed),
            node_loads: self.stats.node_loads.load(Ordering::Relaxed),
            node_stores: self.stats.node_stores.load(Ordering::Relaxed),
            splits: self.stats.splits.load(Ordering::Relaxed),
            reinsertions: self.stats.reinsertions.load(Ordering::Relaxed),
        }
    }

    /// Makes every committed insert durable.
    pub fn flush(&self) -> SpatialResult<()> {
        self.store.sync()
    }

    fn check_dimension(&self, actual: usize) -> SpatialResult<()> {
        let expected = self.config.dimension();
        if actual != expected {
            return Err(SpatialError::DimensionMismatch { expected, actual });
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Page access
    // ------------------------------------------------------------------------

    /// Read a node - first checks cache, then loads it from the store.
    fn load(&self, page_id: PageId) -> SpatialResult<Arc<Node>> {
        if let Some(node) = self.cache.lock().get(page_id) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(node);
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
        self.stats.node_loads.fetch_add(1, Ordering::Relaxed);

        let node = self.store.load_node(page_id).map_err(|e| {
            warn!("Failed to load page {}: {}", page_id, e);
            e
        })?;
        if let Err(reason) = node.validate(self.config.dimension(), self.capacity.max_entries) {
            warn!("Rejected page {}: {}", page_id, reason);
            return Err(SpatialError::CorruptPage { page_id, reason });
        }

        let node = Arc::new(node);
        self.cache_page(page_id, node.clone());
        Ok(node)
    }

    fn cache_page(&self, page_id: PageId, node: Arc<Node>) {
        if let Some(evicted) = self.cache.lock().insert(page_id, node) {
            trace!("Evicted page {} from cache", evicted);
        }
    }

    /// Takes a writable copy of a node into the working set.
    fn take_node(&self, ctx: &mut InsertContext, page_id: PageId) -> SpatialResult<Node> {
        if let Some(node) = ctx.staged.remove(&page_id) {
            return Ok(node);
        }
        let node = self.load(page_id)?;
        ctx.originals
            .entry(page_id)
            .or_insert_with(|| node.clone());
        Ok(node.as_ref().clone())
    }

    // ------------------------------------------------------------------------
    // Insert
    // ------------------------------------------------------------------------

    /// Inserts a point.
    ///
    /// The dimension is checked before any node is touched. Overflowing
    /// nodes first try forced reinsertion (once per level and insert, never
    /// at the root) and split otherwise.
    pub fn insert(&mut self, point: SpatialPoint) -> SpatialResult<()> {
        self.check_dimension(point.dimension())?;
        trace!("Inserting {}", point);

        let mut ctx = InsertContext::new(self.header.clone());
        self.insert_from_root(&mut ctx, Entry::Point(point), 0)?;

        // Reinsert forced-out entries, closest to their old node first.
        while let Some((entry, level)) = ctx.pending.pop() {
            self.insert_from_root(&mut ctx, entry, level)?;
        }

        ctx.header.entry_count += 1;
        self.commit(ctx)
    }

    /// Inserts every point of `points`, stopping at the first failure.
    /// Returns the number of points inserted.
    pub fn insert_all<I>(&mut self, points: I) -> SpatialResult<usize>
    where
        I: IntoIterator<Item = SpatialPoint>,
    {
        let mut inserted = 0;
        for point in points {
            self.insert(point)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    fn insert_from_root(
        &self,
        ctx: &mut InsertContext,
        entry: Entry,
        level: u32,
    ) -> SpatialResult<()> {
        let root_page = ctx.header.root_page;
        if let InsertOutcome::Split { kept, sibling } =
            self.insert_at(ctx, root_page, entry, level)?
        {
            let new_root = ctx.allocate(&self.store)?;
            let root_level = ctx.header.height;
            let root = Node::Internal {
                children: vec![
                    ChildRef {
                        mbr: kept,
                        page_id: root_page,
                    },
                    sibling,
                ],
                level: root_level,
            };
            ctx.stage(new_root, root);
            ctx.header.root_page = new_root;
            ctx.header.height += 1;
            debug!(
                "Root split: new root page {} at height {}",
                new_root, ctx.header.height
            );
        }
        Ok(())
    }

    /// Inserts `entry` into the subtree rooted at `page_id`, placing it in a
    /// node at `target_level`. Every node on the path is staged.
    fn insert_at(
        &self,
        ctx: &mut InsertContext,
        page_id: PageId,
        entry: Entry,
        target_level: u32,
    ) -> SpatialResult<InsertOutcome> {
        let mut node = self.take_node(ctx, page_id)?;
        let level = node.level();
        if level < target_level {
            return Err(SpatialError::CorruptPage {
                page_id,
                reason: format!("node at level {} below target {}", level, target_level),
            });
        }

        let mut shrunk = false;
        if level == target_level {
            node.push_entry(entry)?;
        } else if let Node::Internal { children, .. } = &mut node {
            if children.is_empty() {
                return Err(SpatialError::CorruptPage {
                    page_id,
                    reason: "internal node without children".into(),
                });
            }

            let entry_mbr = entry.mbr();
            let idx = choose_subtree(children, &entry_mbr, level == 1);
            match self.insert_at(ctx, children[idx].page_id, entry, target_level)? {
                InsertOutcome::Absorbed => children[idx].mbr.expand(&entry_mbr),
                InsertOutcome::Split { kept, sibling } => {
                    children[idx].mbr = kept;
                    children.push(sibling);
                }
                InsertOutcome::Shrunk { mbr } => {
                    children[idx].mbr = mbr;
                    shrunk = true;
                }
            }
        }

        if node.len() > self.capacity.max_entries {
            return self.treat_overflow(ctx, page_id, node);
        }

        let outcome = if shrunk {
            let mbr = node.bounding_box().ok_or_else(|| SpatialError::CorruptPage {
                page_id,
                reason: "node emptied during reinsertion".into(),
            })?;
            InsertOutcome::Shrunk { mbr }
        } else {
            InsertOutcome::Absorbed
        };
        ctx.stage(page_id, node);
        Ok(outcome)
    }

    /// Handles a node holding `CAPACITY + 1` entries.
    fn treat_overflow(
        &self,
        ctx: &mut InsertContext,
        page_id: PageId,
        mut node: Node,
    ) -> SpatialResult<InsertOutcome> {
        let level = node.level();
        let is_root = page_id == ctx.header.root_page;
        let count = reinsert_count(
            self.capacity.max_entries,
            self.capacity.min_entries,
            ctx.header.reinsert_fraction,
        );

        if !is_root && count > 0 && ctx.reinserted_levels.insert(level) {
            let Some(center) = node.bounding_box().map(|mbr| mbr.center()) else {
                return Err(SpatialError::CorruptPage {
                    page_id,
                    reason: "overflowing node has no entries".into(),
                });
            };

            let removed: Vec<Entry> = match &mut node {
                Node::Leaf { entries } => take_farthest(entries, &center, count)
                    .into_iter()
                    .map(Entry::Point)
                    .collect(),
                Node::Internal { children, .. } => take_farthest(children, &center, count)
                    .into_iter()
                    .map(Entry::Child)
                    .collect(),
            };
            debug!(
                "Forced reinsertion of {} entries from page {} at level {}",
                removed.len(),
                page_id,
                level
            );

            // Farthest first, so the closest entry is popped first.
            ctx.pending
                .extend(removed.into_iter().map(|entry| (entry, level)));
            ctx.reinsertions += 1;

            let mbr = node.bounding_box().ok_or_else(|| SpatialError::CorruptPage {
                page_id,
                reason: "reinsertion emptied the node".into(),
            })?;
            ctx.stage(page_id, node);
            return Ok(InsertOutcome::Shrunk { mbr });
        }

        let min_fill = self.capacity.min_entries;
        let (kept_node, sibling_node) = match node {
            Node::Leaf { entries } => {
                let (first, second) = split_entries(entries, min_fill);
                (Node::Leaf { entries: first }, Node::Leaf { entries: second })
            }
            Node::Internal { children, level } => {
                let (first, second) = split_entries(children, min_fill);
                (
                    Node::Internal {
                        children: first,
                        level,
                    },
                    Node::Internal {
                        children: second,
                        level,
                    },
                )
            }
        };

        let (Some(kept), Some(sibling_mbr)) =
            (kept_node.bounding_box(), sibling_node.bounding_box())
        else {
            return Err(SpatialError::InvalidOperation(format!(
                "split of page {} produced an empty group",
                page_id
            )));
        };

        let sibling_page = ctx.allocate(&self.store)?;
        debug!(
            "Split page {} at level {}: {} / {} entries, new page {}",
            page_id,
            level,
            kept_node.len(),
            sibling_node.len(),
            sibling_page
        );
        ctx.stage(page_id, kept_node);
        ctx.stage(sibling_page, sibling_node);
        ctx.splits += 1;

        Ok(InsertOutcome::Split {
            kept,
            sibling: ChildRef {
                mbr: sibling_mbr,
                page_id: sibling_page,
            },
        })
    }

    /// Writes the working set: fresh pages, then rewritten pages, then the
    /// header. On failure the rewritten pages are restored and the in-memory
    /// state is left untouched.
    fn commit(&mut self, ctx: InsertContext) -> SpatialResult<()> {
        let mut rewritten = Vec::new();
        if let Err(e) = self.write_staged(&ctx, &mut rewritten) {
            warn!("Insert commit failed, rolling back {} pages: {}", rewritten.len(), e);
            for page_id in rewritten {
                if let Some(original) = ctx.originals.get(&page_id) {
                    if let Err(restore) = self.store.store_node(page_id, original) {
                        error!("Failed to restore page {}: {}", page_id, restore);
                    }
                }
            }
            return Err(e);
        }

        self.stats
            .node_stores
            .fetch_add(ctx.staged.len() as u64, Ordering::Relaxed);
        self.stats.splits.fetch_add(ctx.splits, Ordering::Relaxed);
        self.stats
            .reinsertions
            .fetch_add(ctx.reinsertions, Ordering::Relaxed);

        self.header = ctx.header;
        for (page_id, node) in ctx.staged {
            self.cache_page(page_id, Arc::new(node));
        }
        Ok(())
    }

    fn write_staged(
        &self,
        ctx: &InsertContext,
        rewritten: &mut Vec<PageId>,
    ) -> SpatialResult<()> {
        for (page_id, node) in ctx.staged.iter().filter(|(id, _)| ctx.fresh.contains(*id)) {
            self.store.store_node(*page_id, node)?;
        }
        for (page_id, node) in ctx.staged.iter().filter(|(id, _)| !ctx.fresh.contains(*id)) {
            rewritten.push(*page_id);
            self.store.store_node(*page_id, node)?;
        }
        self.store.store_header(&ctx.header)
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// Lazily yields the ids of all points inside `query`, bounds included.
    ///
    /// Only pages whose MBR meets the query are loaded. The iterator can be
    /// dropped at any point; it stops after the first error.
    pub fn search_iter(&self, query: &HyperRectangle) -> SpatialResult<SearchIter<'_, S>> {
        self.check_dimension(query.dimension())?;
        trace!("Searching {}", query);
        Ok(SearchIter {
            tree: self,
            query: query.clone(),
            stack: vec![self.header.root_page],
            ready: Vec::new().into_iter(),
            failed: false,
        })
    }

    /// Collects the ids of all points inside `query`.
    pub fn search(&self, query: &HyperRectangle) -> SpatialResult<Vec<ObjectId>> {
        self.search_iter(query)?.collect()
    }

    // ------------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------------

    /// Walks the whole tree and checks its structural invariants: stored
    /// MBRs match their children, node sizes stay within capacity, all
    /// leaves sit at the same depth and the point count matches the header.
    pub fn check_integrity(&self) -> SpatialResult<IntegrityReport> {
        let mut report = IntegrityReport::new();

        if let Err(e) = self.header.validate() {
            report.errors.push(format!("Invalid header: {}", e));
            return Ok(report);
        }

        self.check_subtree(
            self.header.root_page,
            None,
            self.header.root_level(),
            1,
            &mut report,
        );

        if report.entries_found != self.header.entry_count {
            report.errors.push(format!(
                "header counts {} entries, leaves hold {}",
                self.header.entry_count, report.entries_found
            ));
        }
        if report.errors.is_empty() && report.leaf_depth != Some(self.header.height) {
            report.errors.push(format!(
                "leaves at depth {:?}, height is {}",
                report.leaf_depth, self.header.height
            ));
        }

        debug!(
            "Integrity check: {} nodes, {} entries, {} errors",
            report.nodes_checked,
            report.entries_found,
            report.errors.len()
        );
        Ok(report)
    }

    fn check_subtree(
        &self,
        page_id: PageId,
        stored_mbr: Option<&HyperRectangle>,
        expected_level: u32,
        depth: u32,
        report: &mut IntegrityReport,
    ) {
        let node = match self.load(page_id) {
            Ok(node) => node,
            Err(e) => {
                report.errors.push(format!("Page {}: {}", page_id, e));
                return;
            }
        };
        report.nodes_checked += 1;

        let is_root = stored_mbr.is_none();
        if node.level() != expected_level {
            report.errors.push(format!(
                "Page {}: level {}, expected {}",
                page_id,
                node.level(),
                expected_level
            ));
        }

        let len = node.len();
        if len > self.capacity.max_entries {
            report.errors.push(format!(
                "Page {}: {} entries exceed capacity {}",
                page_id, len, self.capacity.max_entries
            ));
        }
        if !is_root && len < self.capacity.min_entries {
            report.errors.push(format!(
                "Page {}: {} entries below minimum fill {}",
                page_id, len, self.capacity.min_entries
            ));
        }
        if is_root && !node.is_leaf() && len < 2 {
            report
                .errors
                .push(format!("Page {}: internal root with {} children", page_id, len));
        }

        if let Some(stored) = stored_mbr {
            match node.bounding_box() {
                Some(actual) if actual == *stored => {}
                Some(actual) => report.errors.push(format!(
                    "Page {}: parent stores {}, entries span {}",
                    page_id, stored, actual
                )),
                None => report
                    .errors
                    .push(format!("Page {}: empty non-root node", page_id)),
            }
        }

        match node.as_ref() {
            Node::Leaf { entries } => {
                report.entries_found += entries.len() as u64;
                match report.leaf_depth {
                    None => report.leaf_depth = Some(depth),
                    Some(leaf_depth) if leaf_depth != depth => report.errors.push(format!(
                        "Page {}: leaf at depth {}, others at {}",
                        page_id, depth, leaf_depth
                    )),
                    Some(_) => {}
                }
            }
            Node::Internal { children, .. } => {
                for child in children {
                    self.check_subtree(
                        child.page_id,
                        Some(&child.mbr),
                        expected_level.saturating_sub(1),
                        depth + 1,
                        report,
                    );
                }
            }
        }
    }
}

/// Lazy range query over an [`RStarTree`], created by
/// [`RStarTree::search_iter`].
pub struct SearchIter<'a, S: NodeStore> {
    tree: &'a RStarTree<S>,
    query: HyperRectangle,
    stack: Vec<PageId>,
    ready: std::vec::IntoIter<ObjectId>,
    failed: bool,
}

impl<S: NodeStore> Iterator for SearchIter<'_, S> {
    type Item = SpatialResult<ObjectId>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(object_id) = self.ready.next() {
                return Some(Ok(object_id));
            }
            if self.failed {
                return None;
            }

            let page_id = self.stack.pop()?;
            let node = match self.tree.load(page_id) {
                Ok(node) => node,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };

            match node.overlapping_entries(&self.query) {
                OverlappingEntries::Points(points) => {
                    let ids: Vec<ObjectId> = points.iter().map(|p| p.object_id()).collect();
                    self.ready = ids.into_iter();
                }
                OverlappingEntries::Children(children) => {
                    // Reversed so the first child is visited first
                    self.stack
                        .extend(children.iter().rev().map(|child| child.page_id));
                }
            }
        }
    }
}
