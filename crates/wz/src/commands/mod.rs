pub mod img;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Browse and check an extracted WZ archive
    Img {
        #[command(subcommand)]
        command: img::ImgCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Img { command } => command.handle(),
        }
    }
}
