//! Roles Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::roles::{
    data::NewRole,
    records::{RoleRecord, RoleUuid},
};

const CREATE_ROLE_SQL: &str = include_str!("sql/create_role.sql");
const FIND_ROLE_SQL: &str = include_str!("sql/find_role.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgRolesRepository;

impl PgRolesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: NewRole,
    ) -> Result<RoleRecord, sqlx::Error> {
        query_as::<Postgres, RoleRecord>(CREATE_ROLE_SQL)
            .bind(role.uuid.into_uuid())
            .bind(role.name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: RoleUuid,
    ) -> Result<Option<RoleRecord>, sqlx::Error> {
        query_as::<Postgres, RoleRecord>(FIND_ROLE_SQL)
            .bind(role.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for RoleRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: RoleUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
