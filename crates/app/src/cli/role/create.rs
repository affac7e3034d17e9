use clap::Args;
use sitebind_app::{
    database::{self, Db},
    domain::roles::{PgRolesService, RolesService, data::NewRole, records::RoleUuid},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateRoleArgs {
    /// Role name
    #[arg(long)]
    name: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Optional role UUID; generated when omitted
    #[arg(long)]
    role_uuid: Option<Uuid>,
}

pub(crate) async fn run(args: CreateRoleArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgRolesService::new(Db::new(pool));

    let role = service
        .create_role(NewRole {
            uuid: args.role_uuid.map_or_else(RoleUuid::new, RoleUuid::from_uuid),
            name: args.name,
        })
        .await
        .map_err(|error| format!("failed to create role: {error}"))?;

    println!("role_uuid: {}", role.uuid);
    println!("role_name: {}", role.name);
    println!("set REGISTRATION_DEFAULT_ROLE_UUID={} to use it for new sites", role.uuid);

    Ok(())
}
