use clap::{Args, ValueEnum};
use miette::Result;
use owo_colors::OwoColorize;
use wz_node::UnitPath;

use super::{parse_location, print_json, ArchiveArgs};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ReadAs {
    /// Kind, value and child names
    #[default]
    Info,
    String,
    Int,
    Float,
    Vector,
    /// Where a link points
    Link,
    /// Dimensions, origin and links of a canvas
    Canvas,
    /// Length and frequency of a sound
    Sound,
}

#[derive(Args)]
pub struct GetArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    /// A node given as Category/Unit.img/path
    #[arg(value_parser = parse_location)]
    location: UnitPath,

    /// How to read the node
    #[arg(short = 'a', long = "as", value_enum, default_value_t = ReadAs::Info)]
    read: ReadAs,
}

impl GetArgs {
    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;
        let at = &self.location;

        match self.read {
            ReadAs::Info => {
                let info = store.node_info(at)?;
                match &info.value {
                    Some(value) => println!("{} [{}] = {value}", info.name, info.kind.dimmed()),
                    None => println!("{} [{}]", info.name.blue(), info.kind.dimmed()),
                }
                for child in &info.children {
                    println!("  {child}");
                }
            }
            ReadAs::String => println!("{}", store.get_string(at)?),
            ReadAs::Int => println!("{}", store.get_int(at)?),
            ReadAs::Float => println!("{}", store.get_float(at)?),
            ReadAs::Vector => {
                let vector = store.get_vector(at)?;
                println!("({}, {})", vector.x, vector.y);
            }
            ReadAs::Link => {
                let fault_in = store.options().follow_cross_unit_links;
                print_json(&store.follow_link(at, fault_in)?)?
            }
            ReadAs::Canvas => print_json(&store.canvas_info(at)?)?,
            ReadAs::Sound => print_json(&store.sound_info(at)?)?,
        }
        Ok(())
    }
}
