use clap::{Parser, Subcommand};

mod db;
mod domain;
mod role;
mod secret;
mod site;

#[derive(Debug, Parser)]
#[command(name = "sitebind-app", about = "Sitebind CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Domain(domain::DomainCommand),
    Role(role::RoleCommand),
    Secret(secret::SecretCommand),
    Site(site::SiteCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Domain(command) => domain::run(command).await,
            Commands::Role(command) => role::run(command).await,
            Commands::Secret(command) => {
                secret::run(&command);

                Ok(())
            }
            Commands::Site(command) => site::run(command).await,
        }
    }
}
