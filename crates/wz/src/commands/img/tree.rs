use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use wz_node::UnitPath;
use wz_store::query::TreeNode;

use super::{parse_location, print_json, ArchiveArgs};

#[derive(Args)]
pub struct TreeArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    /// A node given as Category/Unit.img/path
    #[arg(value_parser = parse_location)]
    location: UnitPath,

    /// Levels below the node to show
    #[arg(short, long, default_value_t = 2)]
    depth: usize,

    /// Children shown per node
    #[arg(short, long, default_value_t = 50)]
    max_children: usize,

    /// Print JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn print_node(node: &TreeNode, indent: usize) {
    let pad = "  ".repeat(indent);
    match &node.value {
        Some(value) => println!("{pad}{} [{}] = {value}", node.name, node.kind.dimmed()),
        None => println!("{pad}{} [{}]", node.name.blue(), node.kind.dimmed()),
    }
    for child in &node.children {
        print_node(child, indent + 1);
    }
    if node.truncated > 0 {
        println!("{pad}  {}", format!("... {} more", node.truncated).dimmed());
    }
}

impl TreeArgs {
    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;
        let view = store.tree(&self.location, self.depth, self.max_children)?;
        if self.json {
            return print_json(&view);
        }

        print_node(&view.root, 0);
        if view.capped {
            println!(
                "{}",
                format!("stopped after {} nodes", view.node_count).yellow()
            );
        }
        Ok(())
    }
}
