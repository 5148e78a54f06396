use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;
use wz_store::{Scope, Store, StoreOptions, UnitPath};

pub mod broken_links;
pub mod diff;
pub mod export;
pub mod get;
pub mod info;
pub mod ls;
pub mod search;
pub mod set;
pub mod stats;
pub mod tree;
pub mod validate;

#[derive(clap::Subcommand)]
pub enum ImgCommands {
    /// Show the archive version and its categories
    Info(info::InfoArgs),
    /// List categories, units or the children of a node
    Ls(ls::LsArgs),
    /// Print the subtree below a node
    Tree(tree::TreeArgs),
    /// Read a single node
    Get(get::GetArgs),
    /// Search node names or values
    Search(search::SearchArgs),
    /// Compare two nodes, possibly in different units
    Diff(diff::DiffArgs),
    /// Check a subtree for broken links and undecodable media
    Validate(validate::ValidateArgs),
    /// Write canvases and sounds out as files, or a subtree as JSON
    Export(export::ExportArgs),
    /// Export the canvases of whole categories as PNG files
    ExportImages(export::ExportImagesArgs),
    /// Show unit counts and cache statistics
    Stats(stats::StatsArgs),
    /// List links that point at nothing
    BrokenLinks(broken_links::BrokenLinksArgs),
    /// Change the value of a node and save its unit
    Set(set::SetArgs),
}

impl ImgCommands {
    pub fn handle(&self) -> Result<()> {
        match self {
            ImgCommands::Info(info) => info.handle(),
            ImgCommands::Ls(ls) => ls.handle(),
            ImgCommands::Tree(tree) => tree.handle(),
            ImgCommands::Get(get) => get.handle(),
            ImgCommands::Search(search) => search.handle(),
            ImgCommands::Diff(diff) => diff.handle(),
            ImgCommands::Validate(validate) => validate.handle(),
            ImgCommands::Export(export) => export.handle(),
            ImgCommands::ExportImages(export) => export.handle(),
            ImgCommands::Stats(stats) => stats.handle(),
            ImgCommands::BrokenLinks(links) => links.handle(),
            ImgCommands::Set(set) => set.handle(),
        }
    }
}

/// Where the archive lives and how to hold it
#[derive(Args)]
pub struct ArchiveArgs {
    /// An extracted archive directory
    #[arg(short, long, value_name = "DIR")]
    root: PathBuf,

    /// Number of parsed units kept in memory
    #[arg(long, value_name = "UNITS")]
    cache_size: Option<usize>,

    /// Follow links into other units
    #[arg(long, default_value_t = false)]
    follow_links: bool,
}

impl ArchiveArgs {
    pub fn open(&self) -> Result<Store> {
        let options = StoreOptions::builder()
            .maybe_max_cached_units(self.cache_size)
            .follow_cross_unit_links(self.follow_links)
            .build();
        Store::open(&self.root, options).context(format!("path: {}", self.root.display()))
    }
}

/// Narrows archive wide commands down to a category or a unit
#[derive(Args)]
pub struct ScopeArgs {
    /// Only look at this category
    #[arg(short, long)]
    category: Option<String>,

    /// Only look at this unit of the category
    #[arg(short, long, requires = "category")]
    unit: Option<String>,
}

impl ScopeArgs {
    pub fn scope(&self) -> Scope {
        match (&self.category, &self.unit) {
            (Some(category), Some(unit)) => Scope::unit(category, unit),
            (Some(category), None) => Scope::Category(category.clone()),
            _ => Scope::Archive,
        }
    }
}

/// Parse a `Category/sub/Unit.img/path` location
pub fn parse_location(text: &str) -> std::result::Result<UnitPath, String> {
    UnitPath::parse_qualified(text).ok_or_else(|| {
        format!("'{text}' is not a location, expected Category/Unit.img/path/to/node")
    })
}

pub(crate) fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}
