use clap::{Args, ValueEnum};
use itertools::Itertools;
use miette::Result;
use owo_colors::OwoColorize;
use similar::{ChangeTag, TextDiff};
use wz_node::{Difference, DifferenceKind, UnitPath};

use super::{parse_location, print_json, ArchiveArgs};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Mode {
    /// One line per difference
    #[default]
    Semantic,
    /// Also highlight the changed characters of differing values
    Full,
}

#[derive(Args)]
pub struct DiffArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    /// A node given as Category/Unit.img/path
    #[arg(short, long, value_parser = parse_location)]
    left: UnitPath,

    /// A node given as Category/Unit.img/path
    #[arg(short, long, value_parser = parse_location)]
    right: UnitPath,

    /// Levels below the nodes to compare
    #[arg(short, long, default_value_t = 10)]
    depth: usize,

    /// Comparison mode
    #[arg(short, long, value_enum, default_value_t = Mode::Semantic)]
    mode: Mode,

    /// Print JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn inline(old: &str, new: &str) -> String {
    let diff = TextDiff::from_chars(old, new);
    let mut context = String::new();
    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            for (emphasized, value) in change.iter_strings_lossy() {
                let styled = match (emphasized, change.tag()) {
                    (true, ChangeTag::Insert) => format!("{}", value.green().underline()),
                    (true, _) => format!("{}", value.red().underline()),
                    (false, ChangeTag::Equal) => format!("{}", value.dimmed()),
                    (false, ChangeTag::Insert) => format!("{}", value.green()),
                    (false, ChangeTag::Delete) => format!("{}", value.red()),
                };
                context.push_str(&styled);
            }
        }
    }
    context
}

impl DiffArgs {
    fn describe(&self, difference: &Difference) -> String {
        let path = if difference.path.is_empty() {
            "."
        } else {
            difference.path.as_str()
        };
        let first = difference.first.as_deref().unwrap_or_default();
        let second = difference.second.as_deref().unwrap_or_default();

        match difference.kind {
            DifferenceKind::OnlyInFirst => format!("❌ {}: {}", path.red(), first),
            DifferenceKind::OnlyInSecond => format!("✅ {}: {}", path.green(), second),
            DifferenceKind::TypeMismatch => {
                format!("* {}: {} vs {}", path, first.red(), second.green())
            }
            DifferenceKind::ValueDifference if self.mode == Mode::Full => {
                format!("* {}: {}", path, inline(first, second))
            }
            DifferenceKind::ValueDifference => {
                format!("* {}: {} vs {}", path, first.red(), second.green())
            }
        }
    }

    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;
        let differences = store.diff_nodes(&self.left, &self.right, self.depth)?;
        if self.json {
            return print_json(&differences);
        }

        if differences.is_empty() {
            println!("{}", "no differences".dimmed());
            return Ok(());
        }

        println!("🔃 {} vs {}", self.left.blue(), self.right.blue());
        println!(
            "{}",
            differences
                .iter()
                .map(|d| format!("  {}", self.describe(d)))
                .join("\n")
        );
        Ok(())
    }
}
