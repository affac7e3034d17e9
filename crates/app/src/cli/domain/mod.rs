use clap::{Args, Subcommand};

mod check;

#[derive(Debug, Args)]
pub(crate) struct DomainCommand {
    #[command(subcommand)]
    command: DomainSubcommand,
}

#[derive(Debug, Subcommand)]
enum DomainSubcommand {
    /// Run the ownership handshake against a domain and show every attempt
    Check(check::CheckDomainArgs),
}

pub(crate) async fn run(command: DomainCommand) -> Result<(), String> {
    match command.command {
        DomainSubcommand::Check(args) => check::run(args).await,
    }
}
