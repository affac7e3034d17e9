use clap::{Args, Subcommand};

mod create;

#[derive(Debug, Args)]
pub(crate) struct RoleCommand {
    #[command(subcommand)]
    command: RoleSubcommand,
}

#[derive(Debug, Subcommand)]
enum RoleSubcommand {
    Create(create::CreateRoleArgs),
}

pub(crate) async fn run(command: RoleCommand) -> Result<(), String> {
    match command.command {
        RoleSubcommand::Create(args) => create::run(args).await,
    }
}
