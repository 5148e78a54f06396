//! The store and its unit lifecycle

use lru::LruCache;
use parking_lot::{Mutex, RwLockReadGuard};
use serde::Serialize;
use std::{io, path::Path, sync::Arc};
use tracing::{debug, info, instrument};
use wz_node::{path, Node, UnitPath};

use crate::codec::{ImgCodec, UnitCodec};
use crate::error::{Error, Result};
use crate::index::{ArchiveIndex, Category};
use crate::manifest::Manifest;
use crate::media::{AudioCodec, BitmapCodec, PassthroughAudioCodec, RawBitmapCodec};
use crate::options::StoreOptions;
use crate::source::{FsSource, UnitSource};
use crate::stats::{CacheSnapshot, CacheStats};
use crate::unit::{ParsedUnit, Unit};

/// A parsed unit as reported by [`Store::parsed_units`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedUnitInfo {
    pub category: String,
    pub name: String,
    /// Number of children of the unit root
    pub children: usize,
    pub dirty: bool,
}

/// Lazily parsed, cached view over an archive
///
/// Every unit is known from the start but only parsed when something navigates into it. Parsed
/// units stay cached until they are unparsed explicitly, the cache is cleared, or, with
/// [`StoreOptions::max_cached_units`], the least recently used clean units are evicted.
///
/// A [`ParsedUnit`] handed out by the store keeps its tree alive after the unit is unparsed, but
/// that tree is detached: edits made through the store after a reparse do not show up in it.
pub struct Store {
    name: String,
    source: Box<dyn UnitSource>,
    codec: Box<dyn UnitCodec>,
    pub(crate) bitmaps: Box<dyn BitmapCodec>,
    pub(crate) audio: Box<dyn AudioCodec>,
    index: ArchiveIndex,
    manifest: Manifest,
    pub(crate) options: StoreOptions,
    stats: CacheStats,
    /// Parsed units from most to least recently used
    recent: Mutex<LruCache<String, Arc<Unit>>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("units", &self.index.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Store {
    /// Open an extracted archive directory with the reference codecs
    #[instrument(skip(root), fields(root = %root.as_ref().display()), err)]
    pub fn open(root: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        Self::new(FsSource::new(root.as_ref())?, options)
    }

    /// Index `source` with the reference codecs
    pub fn new(source: impl UnitSource + 'static, options: StoreOptions) -> Result<Self> {
        let name = source.name();
        let manifest = Manifest::load(source.manifest()?.as_deref(), &name)?;
        let index = ArchiveIndex::build(&source)?;

        Ok(Self {
            name,
            source: Box::new(source),
            codec: Box::new(ImgCodec::default()),
            bitmaps: Box::new(RawBitmapCodec),
            audio: Box::new(PassthroughAudioCodec),
            index,
            manifest,
            options,
            stats: CacheStats::default(),
            recent: Mutex::new(LruCache::unbounded()),
        })
    }

    pub fn with_codec(mut self, codec: impl UnitCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn with_bitmap_codec(mut self, codec: impl BitmapCodec + 'static) -> Self {
        self.bitmaps = Box::new(codec);
        self
    }

    pub fn with_audio_codec(mut self, codec: impl AudioCodec + 'static) -> Self {
        self.audio = Box::new(codec);
        self
    }

    /// Name of the archive, usually its root directory
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.index.categories()
    }

    pub fn category(&self, name: &str) -> Result<&Category> {
        self.index.category(name)
    }

    /// Every unit of the archive, parsed or not
    pub fn units(&self) -> impl Iterator<Item = &Arc<Unit>> {
        self.index.units()
    }

    /// Look up a unit without parsing it
    pub fn get_unit(&self, category: &str, name: &str) -> Result<Arc<Unit>> {
        self.index.find(category, name).cloned()
    }

    /// Look up a unit and make sure it is parsed
    pub fn open_unit(&self, category: &str, name: &str) -> Result<(Arc<Unit>, Arc<ParsedUnit>)> {
        let unit = self.get_unit(category, name)?;
        let parsed = self.ensure_parsed(&unit)?;
        Ok((unit, parsed))
    }

    /// Parse `unit` unless it already is
    ///
    /// Only one caller parses a given unit at a time. Callers arriving while a parse is running
    /// wait for it and count as cache hits.
    pub fn ensure_parsed(&self, unit: &Arc<Unit>) -> Result<Arc<ParsedUnit>> {
        let current = unit.state.read().clone();
        if let Some(parsed) = current {
            self.stats.hit();
            debug!(unit = %unit.id(), "cache hit");
            self.touch(unit);
            return Ok(parsed);
        }

        let parsed = {
            let _parsing = unit.parse_lock.lock();
            let current = unit.state.read().clone();
            let parsed = match current {
                Some(parsed) => {
                    self.stats.hit();
                    debug!(unit = %unit.id(), "cache hit after waiting for parse");
                    parsed
                }
                None => {
                    self.stats.miss();
                    debug!(unit = %unit.id(), "cache miss");
                    self.parse(unit)?
                }
            };
            // Registered under the parse lock so a concurrent unparse cannot leave a stale entry
            self.recent.lock().put(unit.id().key(), Arc::clone(unit));
            parsed
        };

        self.evict_over_capacity(Some(unit));
        Ok(parsed)
    }

    #[instrument(skip_all, fields(unit = %unit.id()), err)]
    fn parse(&self, unit: &Unit) -> Result<Arc<ParsedUnit>> {
        let bytes = self.source.read(unit.category(), unit.name())?;
        let root = self.codec.decode_unit(&bytes)?;
        let parsed = Arc::new(ParsedUnit::new(root));
        *unit.state.write() = Some(Arc::clone(&parsed));
        self.stats.disk_read();
        debug!(bytes = bytes.len(), size = parsed.estimated_size(), "parsed unit");
        Ok(parsed)
    }

    fn touch(&self, unit: &Unit) {
        self.recent.lock().get(&unit.id().key());
    }

    /// Drop the tree of `unit`, losing unsaved changes
    ///
    /// Returns whether the unit was parsed.
    #[instrument(skip_all, fields(unit = %unit.id()))]
    pub fn unparse(&self, unit: &Unit) -> bool {
        self.unparse_unit(unit, false)
    }

    fn unparse_unit(&self, unit: &Unit, only_clean: bool) -> bool {
        let taken = {
            let _parsing = unit.parse_lock.lock();
            let taken = {
                let mut state = unit.state.write();
                if only_clean && state.as_ref().is_some_and(|p| p.is_dirty()) {
                    return false;
                }
                state.take()
            };
            self.recent.lock().pop(&unit.id().key());
            taken
        };

        match taken {
            Some(parsed) => {
                if parsed.is_dirty() {
                    info!(unit = %unit.id(), "unparsed unit, unsaved changes were lost");
                } else {
                    debug!(unit = %unit.id(), "unparsed unit");
                }
                true
            }
            None => false,
        }
    }

    /// Unparse clean units, least recently used first, until the cache fits its capacity
    fn evict_over_capacity(&self, keep: Option<&Arc<Unit>>) -> usize {
        let Some(capacity) = self.options.max_cached_units else {
            return 0;
        };

        let victims = {
            let recent = self.recent.lock();
            let excess = recent.len().saturating_sub(capacity);
            recent
                .iter()
                .rev()
                .map(|(_, unit)| unit)
                .filter(|unit| keep.map_or(true, |keep| !Arc::ptr_eq(keep, unit)))
                .filter(|unit| !unit.is_dirty())
                .take(excess)
                .cloned()
                .collect::<Vec<_>>()
        };

        let evicted = victims
            .iter()
            .filter(|unit| self.unparse_unit(unit, true))
            .count();
        if evicted > 0 {
            info!(evicted, capacity, "evicted least recently used units");
        }
        evicted
    }

    /// Apply the cache capacity now, returning how many units were unparsed
    pub fn trim_cache(&self) -> usize {
        self.evict_over_capacity(None)
    }

    /// Unparse every unit, returning how many were parsed
    #[instrument(skip(self))]
    pub fn clear_cache(&self) -> usize {
        let cleared = self
            .index
            .units()
            .filter(|unit| self.unparse_unit(unit, false))
            .count();
        info!(cleared, "cleared unit cache");
        cleared
    }

    /// Parse every unit of a category, returning how many units it has
    #[instrument(skip(self), err)]
    pub fn preload(&self, category: &str) -> Result<usize> {
        let category = self.index.category(category)?;
        for unit in category.units() {
            self.ensure_parsed(unit)?;
        }
        Ok(category.len())
    }

    /// Unparse every parsed unit of a category, returning how many there were
    #[instrument(skip(self), err)]
    pub fn unload_category(&self, category: &str) -> Result<usize> {
        Ok(self
            .index
            .category(category)?
            .units()
            .filter(|unit| self.unparse_unit(unit, false))
            .count())
    }

    /// Write the tree of `unit` back to the source and clear its dirty flag
    ///
    /// Saving an unparsed unit does nothing.
    #[instrument(skip_all, fields(unit = %unit.id()), err)]
    pub fn save(&self, unit: &Unit) -> Result<()> {
        let state = unit.state.read();
        let Some(parsed) = state.as_ref() else {
            debug!("unit is not parsed, nothing to save");
            return Ok(());
        };

        let persistence = |source: io::Error| Error::PersistenceError {
            unit: unit.id().to_string(),
            source,
        };

        let root = parsed.read();
        let Node::Container(container) = &*root else {
            return Err(Error::InvalidArgument(format!(
                "root of {} is not a container",
                unit.id()
            )));
        };
        let bytes = self
            .codec
            .encode_unit(container)
            .map_err(|e| persistence(io::Error::other(e)))?;
        self.source
            .write(unit.category(), unit.name(), &bytes)
            .map_err(persistence)?;
        parsed.mark_clean();

        info!(bytes = bytes.len(), "saved unit");
        Ok(())
    }

    /// Throw away unsaved changes by reparsing `unit` from its source
    #[instrument(skip_all, fields(unit = %unit.id()), err)]
    pub fn discard(&self, unit: &Arc<Unit>) -> Result<Arc<ParsedUnit>> {
        self.unparse(unit);
        self.ensure_parsed(unit)
    }

    pub fn is_parsed(&self, unit: &Unit) -> bool {
        unit.is_parsed()
    }

    /// Every unit currently parsed, in index order
    pub fn parsed_units(&self) -> Vec<ParsedUnitInfo> {
        self.index
            .units()
            .filter_map(|unit| {
                let parsed = unit.parsed()?;
                Some(ParsedUnitInfo {
                    category: unit.category().to_owned(),
                    name: unit.name().to_owned(),
                    children: parsed.child_count(),
                    dirty: parsed.is_dirty(),
                })
            })
            .collect()
    }

    /// Current cache counters
    pub fn stats(&self) -> CacheSnapshot {
        let (cached, memory) = self
            .index
            .units()
            .filter_map(|unit| unit.parsed())
            .fold((0, 0), |(count, bytes), parsed| {
                (count + 1, bytes + parsed.estimated_size())
            });
        self.stats
            .snapshot(cached, memory, self.index.categories().count())
    }

    /// Run `f` on the root of the unit `at` names, parsing it if needed
    pub(crate) fn read_root<T>(
        &self,
        at: &UnitPath,
        f: impl FnOnce(&Node) -> Result<T>,
    ) -> Result<T> {
        let (_, parsed) = self.open_unit(&at.category, &at.unit)?;
        let root = parsed.read();
        f(&root)
    }

    /// Run `f` on the node at `at`, parsing its unit if needed
    pub(crate) fn read_node<T>(
        &self,
        at: &UnitPath,
        f: impl FnOnce(&Node) -> Result<T>,
    ) -> Result<T> {
        self.read_root(at, |root| {
            let node =
                path::resolve(root, &at.path).ok_or_else(|| Error::NotFound(at.to_string()))?;
            f(node)
        })
    }

    /// Edit the tree of `unit` and mark it dirty if `f` succeeds
    ///
    /// Holds the unit's state for the duration, so the unit cannot be unparsed underneath `f`.
    pub(crate) fn modify_unit<T>(
        &self,
        unit: &Arc<Unit>,
        f: impl FnOnce(&mut Node) -> Result<T>,
    ) -> Result<T> {
        let parsed = loop {
            self.ensure_parsed(unit)?;
            if let Ok(parsed) = RwLockReadGuard::try_map(unit.state.read(), Option::as_ref) {
                break parsed;
            }
        };

        let mut root = parsed.write();
        let value = f(&mut root)?;
        parsed.mark_dirty(&root);
        Ok(value)
    }
}
