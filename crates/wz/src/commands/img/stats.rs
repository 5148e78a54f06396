use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;

use super::{print_json, ArchiveArgs};

#[derive(Args)]
pub struct StatsArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    /// Parse every unit of these categories first
    #[arg(short, long)]
    preload: Vec<String>,

    /// Print JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl StatsArgs {
    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;
        for category in &self.preload {
            store.preload(category)?;
        }

        let statistics = store.statistics();
        if self.json {
            return print_json(&statistics);
        }

        println!("{} ({} units)", statistics.name.bold(), statistics.total_units);
        for category in &statistics.categories {
            println!(
                "  {:<12} {:>6} units {:>6} parsed",
                category.name, category.units, category.parsed_units
            );
        }
        let cache = &statistics.cache;
        println!(
            "{}",
            format!(
                "cache: {} units, ~{} bytes, {} hits, {} misses, {} reads, {:.1}% hit ratio",
                cache.cached_units,
                cache.memory_bytes,
                cache.hits,
                cache.misses,
                cache.disk_reads,
                cache.hit_ratio * 100.0
            )
            .dimmed()
        );
        Ok(())
    }
}
