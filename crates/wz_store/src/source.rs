//! Where unit bytes come from and go to

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::{
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::manifest::MANIFEST_FILE;

/// Backing storage of an archive
///
/// Categories are top level namespaces. Units are addressed by their path relative to the
/// category, with `/` separators and the `.img` suffix, for example `Map0/100000000.img`.
pub trait UnitSource: Send + Sync + Debug {
    /// Display name of the archive
    fn name(&self) -> String;

    /// Every category, in a stable order
    fn categories(&self) -> Result<Vec<String>>;

    /// Every unit of a category, in a stable order
    fn units(&self, category: &str) -> Result<Vec<String>>;

    /// Raw bytes of a unit
    fn read(&self, category: &str, unit: &str) -> io::Result<Vec<u8>>;

    /// Replace the bytes of a unit
    fn write(&self, category: &str, unit: &str, bytes: &[u8]) -> io::Result<()>;

    /// Raw bytes of the archive manifest, if there is one
    fn manifest(&self) -> Result<Option<Vec<u8>>>;
}

impl<S: UnitSource + ?Sized> UnitSource for std::sync::Arc<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn categories(&self) -> Result<Vec<String>> {
        (**self).categories()
    }

    fn units(&self, category: &str) -> Result<Vec<String>> {
        (**self).units(category)
    }

    fn read(&self, category: &str, unit: &str) -> io::Result<Vec<u8>> {
        (**self).read(category, unit)
    }

    fn write(&self, category: &str, unit: &str, bytes: &[u8]) -> io::Result<()> {
        (**self).write(category, unit, bytes)
    }

    fn manifest(&self) -> Result<Option<Vec<u8>>> {
        (**self).manifest()
    }
}

/// An extracted archive on disk
///
/// Every directory below the root is a category and every `*.img` file within it, at any depth,
/// is a unit.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::NotFound(format!(
                "archive directory {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unit_path(&self, category: &str, unit: &str) -> PathBuf {
        unit.split('/')
            .fold(self.root.join(category), |path, segment| path.join(segment))
    }
}

fn is_unit_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("img"))
}

impl UnitSource for FsSource {
    fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    #[instrument(skip(self), err)]
    fn categories(&self) -> Result<Vec<String>> {
        let mut categories = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() && !name.starts_with('.') {
                categories.push(name);
            }
        }
        categories.sort();
        Ok(categories)
    }

    #[instrument(skip(self), err)]
    fn units(&self, category: &str) -> Result<Vec<String>> {
        let base = self.root.join(category);
        let mut units = Vec::new();
        for entry in WalkDir::new(&base).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_unit_file(entry.path()) {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&base)
                .map_err(|e| Error::InvalidArgument(e.to_string()))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            units.push(name);
        }
        debug!(category, count = units.len(), "indexed units");
        Ok(units)
    }

    fn read(&self, category: &str, unit: &str) -> io::Result<Vec<u8>> {
        fs::read(self.unit_path(category, unit))
    }

    fn write(&self, category: &str, unit: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.unit_path(category, unit);
        let staging = path.with_extension("img.tmp");
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &path)
    }

    fn manifest(&self) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(MANIFEST_FILE);
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// An archive held entirely in memory
///
/// Counts reads so callers can observe how often units are fetched.
#[derive(Debug, Default)]
pub struct MemorySource {
    name: String,
    categories: RwLock<IndexMap<String, IndexMap<String, Vec<u8>>>>,
    manifest: Option<Vec<u8>>,
    reads: AtomicUsize,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an empty category
    pub fn with_category(self, category: impl Into<String>) -> Self {
        self.categories.write().entry(category.into()).or_default();
        self
    }

    /// Add or replace a unit
    pub fn with_unit(self, category: impl Into<String>, unit: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.categories
            .write()
            .entry(category.into())
            .or_default()
            .insert(unit.into(), bytes);
        self
    }

    pub fn with_manifest(mut self, bytes: Vec<u8>) -> Self {
        self.manifest = Some(bytes);
        self
    }

    /// Number of successful unit reads so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Current bytes of a unit
    pub fn unit_bytes(&self, category: &str, unit: &str) -> Option<Vec<u8>> {
        self.categories.read().get(category)?.get(unit).cloned()
    }
}

impl UnitSource for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn categories(&self) -> Result<Vec<String>> {
        Ok(self.categories.read().keys().cloned().collect())
    }

    fn units(&self, category: &str) -> Result<Vec<String>> {
        self.categories
            .read()
            .get(category)
            .map(|units| units.keys().cloned().collect())
            .ok_or_else(|| Error::NotFound(format!("category '{category}'")))
    }

    fn read(&self, category: &str, unit: &str) -> io::Result<Vec<u8>> {
        let bytes = self.unit_bytes(category, unit).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{category}/{unit}"))
        })?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(bytes)
    }

    fn write(&self, category: &str, unit: &str, bytes: &[u8]) -> io::Result<()> {
        let mut categories = self.categories.write();
        let units = categories.get_mut(category).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("category '{category}'"))
        })?;
        units.insert(unit.to_owned(), bytes.to_vec());
        Ok(())
    }

    fn manifest(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.manifest.clone())
    }
}
