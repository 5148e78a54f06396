use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;

use super::{print_json, ArchiveArgs, ScopeArgs};

#[derive(Args)]
pub struct BrokenLinksArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    #[command(flatten)]
    scope: ScopeArgs,

    /// Stop after this many broken links
    #[arg(short, long, default_value_t = 100)]
    max: usize,

    /// Print JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl BrokenLinksArgs {
    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;
        let report = store.find_broken_links(&self.scope.scope(), self.max)?;
        if self.json {
            return print_json(&report);
        }

        for link in &report.links {
            println!(
                "❌ {} [{:?}] {}: {}",
                link.location.red(),
                link.kind,
                link.raw,
                link.outcome.dimmed()
            );
        }
        println!(
            "{}",
            format!(
                "{} broken of {} links in {} units{}",
                report.links.len(),
                report.links_checked,
                report.units_scanned,
                if report.truncated { ", stopped early" } else { "" }
            )
            .dimmed()
        );
        Ok(())
    }
}
