use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use wz_node::NodeKind;
use wz_store::{search::DEFAULT_MAX_RESULTS, SearchKind, SearchQuery};

use super::{print_json, ArchiveArgs, ScopeArgs};

#[derive(Args)]
pub struct SearchArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    #[command(flatten)]
    scope: ScopeArgs,

    /// A name pattern with `*` and `?` wildcards, or a value substring
    pattern: String,

    /// What to match: name, value or both
    #[arg(short, long, default_value = "name")]
    kind: SearchKind,

    /// Only match nodes of this kind
    #[arg(short = 't', long = "type")]
    type_filter: Option<NodeKind>,

    /// Stop after this many matches
    #[arg(short, long, default_value_t = DEFAULT_MAX_RESULTS)]
    max: usize,

    /// Only report locations
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Print JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl SearchArgs {
    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;
        let query = SearchQuery::builder()
            .pattern(self.pattern.as_str())
            .kind(self.kind)
            .maybe_type_filter(self.type_filter)
            .compact(self.compact)
            .max_results(self.max)
            .build();

        let results = store.search(&self.scope.scope(), &query)?;
        if self.json {
            return print_json(&results);
        }

        for found in &results.matches {
            let location = format!("{}/{}/{}", found.category, found.unit, found.path);
            match (&found.kind, &found.value) {
                (Some(kind), Some(value)) => {
                    println!("{location} [{}] = {}", kind.dimmed(), value.green())
                }
                (Some(kind), None) => println!("{location} [{}]", kind.dimmed()),
                _ => println!("{location}"),
            }
        }
        println!(
            "{}",
            format!(
                "{} matches in {} units{}",
                results.matches.len(),
                results.units_searched,
                if results.truncated { ", more were cut off" } else { "" }
            )
            .dimmed()
        );
        Ok(())
    }
}
