use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use tracing::info;
use wz_node::UnitPath;

use super::{parse_location, ArchiveArgs};

#[derive(Args)]
pub struct SetArgs {
    #[command(flatten)]
    archive: ArchiveArgs,

    /// A node given as Category/Unit.img/path
    #[arg(value_parser = parse_location)]
    location: UnitPath,

    /// The new value, written the way `get` prints it
    value: String,

    /// Change the node without saving the unit
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

impl SetArgs {
    pub fn handle(&self) -> Result<()> {
        let store = self.archive.open()?;
        let old = store.set_value(&self.location, &self.value)?;
        let new = store.node_info(&self.location)?;
        println!(
            "{}: {} -> {}",
            self.location,
            old.value_text().unwrap_or_default().red(),
            new.value.unwrap_or_default().green()
        );

        if self.dry_run {
            info!("dry run, {} left unchanged", self.location.unit);
            return Ok(());
        }
        let unit = store.get_unit(&self.location.category, &self.location.unit)?;
        store.save(&unit)?;
        Ok(())
    }
}
