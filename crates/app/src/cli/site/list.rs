use clap::Args;
use sitebind_app::{
    database::{self, Db},
    domain::sites::{PgSitesService, SitesService},
};

#[derive(Debug, Args)]
pub(crate) struct ListSitesArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: ListSitesArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let sites = PgSitesService::new(Db::new(pool))
        .list_sites()
        .await
        .map_err(|error| format!("failed to list sites: {error}"))?;

    if sites.is_empty() {
        println!("no sites found");

        return Ok(());
    }

    for site in sites {
        println!(
            "site_uuid: {}\tdomain: {}\tname: {}\tlogin_url: {}\tcreated_at: {}",
            site.uuid,
            site.domain,
            site.name,
            site.login_url(),
            site.created_at,
        );
    }

    Ok(())
}
