//! Admin Users Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::domain::{
    admins::{
        data::NewAdminUser,
        records::{AdminUserRecord, AdminUserUuid},
    },
    roles::records::RoleUuid,
    sites::records::SiteUuid,
};

const CREATE_ADMIN_USER_SQL: &str = include_str!("sql/create_admin_user.sql");
const ATTACH_ROLE_SQL: &str = include_str!("sql/attach_role.sql");
const LIST_ADMIN_USERS_BY_SITE_SQL: &str = include_str!("sql/list_admin_users_by_site.sql");
const LIST_ROLE_NAMES_SQL: &str = include_str!("sql/list_role_names.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAdminUsersRepository;

impl PgAdminUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    #[tracing::instrument(
        name = "admins.repository.create_admin_user",
        skip(self, tx, admin),
        fields(admin_uuid = %admin.uuid, site_uuid = %admin.site_uuid),
        err
    )]
    pub(crate) async fn create_admin_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        admin: NewAdminUser,
    ) -> Result<AdminUserRecord, sqlx::Error> {
        query_as::<Postgres, AdminUserRecord>(CREATE_ADMIN_USER_SQL)
            .bind(admin.uuid.into_uuid())
            .bind(admin.site_uuid.into_uuid())
            .bind(admin.username)
            .bind(admin.password_hash)
            .bind(admin.real_name)
            .bind(admin.mobile)
            .bind(admin.email)
            .fetch_one(&mut **tx)
            .await
    }

    #[tracing::instrument(name = "admins.repository.attach_role", skip(self, tx), err)]
    pub(crate) async fn attach_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        admin: AdminUserUuid,
        role: RoleUuid,
    ) -> Result<(), sqlx::Error> {
        query(ATTACH_ROLE_SQL)
            .bind(admin.into_uuid())
            .bind(role.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn list_admin_users_by_site(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        site: SiteUuid,
    ) -> Result<Vec<AdminUserRecord>, sqlx::Error> {
        query_as::<Postgres, AdminUserRecord>(LIST_ADMIN_USERS_BY_SITE_SQL)
            .bind(site.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_role_names(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        admin: AdminUserUuid,
    ) -> Result<Vec<String>, sqlx::Error> {
        query_scalar::<Postgres, String>(LIST_ROLE_NAMES_SQL)
            .bind(admin.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for AdminUserRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: AdminUserUuid::from_uuid(row.try_get("uuid")?),
            site_uuid: SiteUuid::from_uuid(row.try_get("site_uuid")?),
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            real_name: row.try_get("real_name")?,
            mobile: row.try_get("mobile")?,
            email: row.try_get("email")?,
            is_super: row.try_get("is_super")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
