use clap::Args;
use miette::{miette, Result};
use owo_colors::OwoColorize;
use wz_node::UnitPath;
use wz_store::Severity;

use super::{parse_location, print_json, ArchiveArgs};

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    /// A node given as Category/Unit.img/path
    #[arg(value_parser = parse_location)]
    location: UnitPath,

    /// Levels below the node to check
    #[arg(short, long)]
    depth: Option<usize>,

    /// Print JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl ValidateArgs {
    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;
        let report = store.validate(&self.location, self.depth)?;

        if self.json {
            print_json(&report)?;
        } else {
            let stats = &report.stats;
            println!(
                "{} nodes: {} containers, {} canvases, {} sounds, {} links",
                stats.total, stats.containers, stats.canvases, stats.binaries, stats.links
            );
            for issue in &report.issues {
                match issue.severity {
                    Severity::Error => println!("❌ {}: {}", issue.path.red(), issue.message),
                    Severity::Warning => {
                        println!("⚠️  {}: {}", issue.path.yellow(), issue.message)
                    }
                }
            }
        }

        match report.errors() {
            0 => Ok(()),
            errors => Err(miette!(
                "{errors} errors and {} warnings in {}",
                report.warnings(),
                self.location
            )),
        }
    }
}
