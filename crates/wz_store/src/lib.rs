//! This library serves an extracted **WZ** archive as a lazily parsed, cached and mutable
//! tree of nodes.
//!
//! # Layout
//!
//! An archive is a directory of categories, each a directory of `.img` units, possibly nested
//! in subdirectories. An optional `manifest.json` at the root describes the archive version.
//!
//! ```text
//! v83/
//! ├── manifest.json
//! ├── Map/
//! │   └── Map0/
//! │       └── 100000000.img
//! └── String/
//!     └── Mob.img
//! ```
//!
//! # Lifecycle
//!
//! Opening a [`Store`] only lists the units. A unit is parsed the first time something
//! navigates into it and stays cached until it is unparsed, the cache is cleared, or the
//! optional LRU capacity pushes it out. Units with unsaved changes are never evicted
//! automatically.
//!
//! | Operation                    | Effect                                               |
//! |------------------------------|------------------------------------------------------|
//! | [`Store::get_unit`]          | look a unit up without parsing it                    |
//! | [`Store::ensure_parsed`]     | parse once, concurrent callers wait for the parse    |
//! | [`Store::unparse`]           | drop the tree, losing unsaved changes                |
//! | [`Store::save`]              | encode the tree and write it back, clearing dirty    |
//! | [`Store::discard`]           | reparse from the source                              |
//! | [`Store::clear_cache`]       | unparse everything                                   |
//!
//! # Addressing
//!
//! Nodes are addressed by [`UnitPath`]: a category, a unit name and a path inside the unit.
//! Category and unit lookups ignore case, and the `.img` suffix may be left out.
//!
//! ```no_run
//! use wz_store::{Store, StoreOptions, UnitPath};
//!
//! # fn main() -> wz_store::error::Result<()> {
//! let store = Store::open("v83", StoreOptions::default())?;
//! let name = store.get_string(&UnitPath::new("String", "Mob", "100100/name"))?;
//! println!("{name}");
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod codec;
pub mod error;
pub mod export;
pub mod index;
pub mod manifest;
pub mod media;
pub mod modify;
pub mod options;
mod png;
pub mod query;
pub mod search;
pub mod source;
mod stats;
pub mod store;
pub mod unit;

pub use analysis::{Issue, Severity, ValidationReport};
pub use codec::{ImgCodec, UnitCodec};
pub use export::{ExportReport, MediaKind};
pub use index::{ArchiveIndex, Category};
pub use manifest::Manifest;
pub use media::{AudioCodec, BitmapCodec, PassthroughAudioCodec, RawBitmapCodec};
pub use options::StoreOptions;
pub use query::Scope;
pub use search::{SearchKind, SearchQuery, SearchResults};
pub use source::{FsSource, MemorySource, UnitSource};
pub use stats::CacheSnapshot;
pub use store::Store;
pub use unit::{ParsedUnit, Unit, UnitId};
pub use wz_node::{Node, NodeKind, UnitPath, Vector2};
