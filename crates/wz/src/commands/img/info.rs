use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;

use super::{print_json, ArchiveArgs};

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    /// Summarize one category instead of the archive
    #[arg(short, long)]
    category: Option<String>,

    /// Print JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;

        if let Some(category) = &self.category {
            let summary = store.category_summary(category)?;
            if self.json {
                return print_json(&summary);
            }
            println!("{} ({} units)", summary.name.bold(), summary.units);
            if !summary.subdirectories.is_empty() {
                println!("  subdirectories: {}", summary.subdirectories.join(", "));
            }
            println!(
                "  sampled {} units: {} properties, {} canvases, {} sounds",
                summary.sampled_units, summary.properties, summary.canvases, summary.sounds
            );
            return Ok(());
        }

        let version = store.version_info();
        if self.json {
            return print_json(&version);
        }
        println!(
            "{} {}",
            version.display_name.as_deref().unwrap_or(&version.name).bold(),
            version.version
        );
        if let Some(region) = &version.source_region {
            println!("  region: {region}");
        }
        println!("  pre big bang: {}", version.is_pre_bb);
        println!("  64 bit: {}", version.is_64_bit);
        for category in store.categories() {
            println!("{}/ {}", category.name().blue(), category.len().dimmed());
        }
        Ok(())
    }
}
