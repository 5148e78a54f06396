use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use wz_node::UnitPath;

use super::{print_json, ArchiveArgs};

#[derive(Args)]
pub struct LsArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    /// A category, or a node given as Category/Unit.img/path
    target: Option<String>,

    /// Entries to skip
    #[arg(long, default_value_t = 0)]
    offset: usize,

    /// Entries to show
    #[arg(short, long, default_value_t = 100)]
    limit: usize,

    /// Only show names
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Print JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl LsArgs {
    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;

        let Some(target) = &self.target else {
            for category in store.categories() {
                println!("{}/ {}", category.name().blue(), category.len().dimmed());
            }
            return Ok(());
        };

        if let Some(at) = UnitPath::parse_qualified(target) {
            let page = store.list_children(&at, self.compact, self.offset, self.limit)?;
            if self.json {
                return print_json(&page);
            }
            for entry in &page.entries {
                match (&entry.kind, &entry.value, entry.child_count) {
                    (Some(kind), Some(value), _) => {
                        println!("{} [{}] = {}", entry.name, kind.dimmed(), value)
                    }
                    (Some(kind), None, Some(count)) => {
                        println!("{}/ [{}] {}", entry.name.blue(), kind.dimmed(), count)
                    }
                    (Some(kind), None, None) => println!("{} [{}]", entry.name, kind.dimmed()),
                    (None, _, _) => println!("{}", entry.name),
                }
            }
            if page.has_more {
                let next = page.offset + page.entries.len();
                println!(
                    "{}",
                    format!("{} more, continue with --offset {next}", page.total - next).dimmed()
                );
            }
            return Ok(());
        }

        let category = store.category(target)?;
        for unit in category.units().skip(self.offset).take(self.limit) {
            let marker = if unit.is_parsed() { "*" } else { " " };
            println!("{marker} {}", unit.name());
        }
        Ok(())
    }
}
