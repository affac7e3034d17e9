use clap::{Args, Subcommand};
use sitebind_app::signing::generate_secret_hex;

#[derive(Debug, Args)]
pub(crate) struct SecretCommand {
    #[command(subcommand)]
    command: SecretSubcommand,
}

#[derive(Debug, Subcommand)]
enum SecretSubcommand {
    /// Print a fresh random value for `SIGNING_SECRET`
    Generate,
}

pub(crate) fn run(command: &SecretCommand) {
    match command.command {
        SecretSubcommand::Generate => println!("{}", generate_secret_hex()),
    }
}
