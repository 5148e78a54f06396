use clap::{Args, ValueEnum};
use miette::{miette, Context, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;
use walkdir::WalkDir;
use wz_node::UnitPath;
use wz_store::{ExportReport, MediaKind};

use super::{parse_location, ArchiveArgs};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Canvases as PNG files and sounds as audio files
    #[default]
    Media,
    /// Only canvases, as PNG files
    Images,
    /// Only sounds, as audio files
    Sounds,
    /// The whole subtree as one JSON document
    Json,
    /// The whole subtree as one XML document
    Xml,
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    /// A node given as Category/Unit.img/path
    #[arg(value_parser = parse_location)]
    location: UnitPath,

    /// A target directory for media, or a target file for JSON and XML
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// What to write
    #[arg(short, long, value_enum, default_value_t = Format::Media)]
    format: Format,

    /// Levels below the node to export
    #[arg(short, long)]
    depth: Option<usize>,

    /// Allow writing into a non-empty target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

fn check_target(out: &Path, overwrite: bool) -> Result<()> {
    let occupied = match fs::metadata(out) {
        Ok(meta) if meta.is_dir() => WalkDir::new(out).min_depth(1).into_iter().next().is_some(),
        Ok(_) => true,
        Err(_) => false,
    };
    if occupied && !overwrite {
        return Err(miette!(
            "{} already exists, pass --overwrite to write into it",
            out.display()
        ));
    }
    Ok(())
}

fn summarize(report: &ExportReport) {
    for (location, error) in &report.failures {
        println!("❌ {}: {}", location.red(), error);
    }
    println!(
        "{}",
        format!(
            "{} files written, {} failed{}",
            report.written.len(),
            report.failures.len(),
            if report.truncated { ", stopped at the item limit" } else { "" }
        )
        .dimmed()
    );
}

impl ExportArgs {
    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;

        let kind = match self.format {
            Format::Media => MediaKind::All,
            Format::Images => MediaKind::Images,
            Format::Sounds => MediaKind::Sounds,
            Format::Json => {
                let json = store.export_json(&self.location, self.depth.unwrap_or(usize::MAX))?;
                return self.write_document(&serde_json::to_string_pretty(&json).into_diagnostic()?);
            }
            Format::Xml => {
                let xml = store.export_xml(&self.location, self.depth.unwrap_or(usize::MAX))?;
                return self.write_document(&xml);
            }
        };

        let out = self
            .out
            .as_ref()
            .ok_or_else(|| miette!("media exports need a target directory, pass --out"))?;
        check_target(out, self.overwrite)?;
        let report = store.export_media_of(&self.location, out, self.depth, kind)?;
        summarize(&report);
        Ok(())
    }

    fn write_document(&self, text: &str) -> Result<()> {
        match &self.out {
            Some(out) => {
                check_target(out, self.overwrite)?;
                fs::write(out, text)
                    .into_diagnostic()
                    .context(format!("creating {}", out.display()))?;
                info!("wrote {}", out.display());
            }
            None => println!("{text}"),
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct ExportImagesArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    /// Categories to export, all of them when omitted
    #[arg(short, long)]
    category: Vec<String>,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    out: PathBuf,

    /// Stop after this many images
    #[arg(short, long, default_value_t = 10_000)]
    max: usize,

    /// Allow writing into a non-empty target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExportImagesArgs {
    pub fn handle(&self) -> Result<()> {
        check_target(&self.out, self.overwrite)?;
        let store = self.archive.open()?;
        let report = store.export_images_batch(&self.category, &self.out, self.max)?;
        summarize(&report);
        Ok(())
    }
}
