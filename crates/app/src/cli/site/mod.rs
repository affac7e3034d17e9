use clap::{Args, Subcommand};

mod list;

#[derive(Debug, Args)]
pub(crate) struct SiteCommand {
    #[command(subcommand)]
    command: SiteSubcommand,
}

#[derive(Debug, Subcommand)]
enum SiteSubcommand {
    List(list::ListSitesArgs),
}

pub(crate) async fn run(command: SiteCommand) -> Result<(), String> {
    match command.command {
        SiteSubcommand::List(args) => list::run(args).await,
    }
}
