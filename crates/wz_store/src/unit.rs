//! Units and their parse state

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};
use wz_node::{Container, Node, UnitPath};

/// Identity of a unit: its category and its name relative to the category
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitId {
    pub category: String,
    /// Name including subdirectories and the `.img` suffix, e.g. `Map0/100000000.img`
    pub name: String,
}

impl UnitId {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Case insensitive key used for lookups
    pub fn key(&self) -> String {
        format!("{}/{}", self.category, self.name).to_ascii_lowercase()
    }

    /// Directory of the unit within its category, empty for top level units
    pub fn subdirectory(&self) -> &str {
        self.name.rsplit_once('/').map_or("", |(dir, _)| dir)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// A named, lazily parsed unit of the archive
///
/// A unit exists from the moment the archive is indexed. Its tree is only present while it is
/// parsed, see [`crate::Store::ensure_parsed`].
pub struct Unit {
    id: UnitId,
    pub(crate) parse_lock: Mutex<()>,
    /// `None` while unparsed
    pub(crate) state: RwLock<Option<Arc<ParsedUnit>>>,
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("id", &self.id)
            .field("parsed", &self.is_parsed())
            .finish()
    }
}

impl Unit {
    pub(crate) fn new(id: UnitId) -> Self {
        Self {
            id,
            parse_lock: Mutex::new(()),
            state: RwLock::new(None),
        }
    }

    pub fn id(&self) -> &UnitId {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.id.category
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn is_parsed(&self) -> bool {
        self.state.read().is_some()
    }

    /// Whether the unit is parsed and holds unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.state.read().as_ref().is_some_and(|p| p.is_dirty())
    }

    /// The current tree without parsing the unit
    pub fn parsed(&self) -> Option<Arc<ParsedUnit>> {
        self.state.read().clone()
    }

    /// Qualified location of a node in this unit
    pub fn location(&self, path: &str) -> UnitPath {
        UnitPath::new(&self.id.category, &self.id.name, path)
    }
}

/// The tree of a parsed unit
///
/// Handles to a parsed unit stay readable after the unit is unparsed, but are then detached:
/// they no longer see edits and edits through the store no longer reach them.
#[derive(Debug)]
pub struct ParsedUnit {
    root: RwLock<Node>,
    dirty: AtomicBool,
    size: AtomicUsize,
}

impl ParsedUnit {
    pub(crate) fn new(root: Container) -> Self {
        let root = Node::Container(root);
        let size = root.estimated_size();
        Self {
            root: RwLock::new(root),
            dirty: AtomicBool::new(false),
            size: AtomicUsize::new(size),
        }
    }

    /// Read access to the root container
    pub fn read(&self) -> RwLockReadGuard<'_, Node> {
        self.root.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Node> {
        self.root.write()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Estimated bytes held by the tree
    pub fn estimated_size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Number of children of the root
    pub fn child_count(&self) -> usize {
        self.read().children().map_or(0, |c| c.len())
    }

    pub(crate) fn mark_dirty(&self, root: &Node) {
        self.size.store(root.estimated_size(), Ordering::Relaxed);
        self.dirty.store(true, Ordering::SeqCst);
    }

    pub(crate) fn mark_clean(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }
}
