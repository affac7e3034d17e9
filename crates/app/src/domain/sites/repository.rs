//! Sites Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};

use crate::domain::{
    admins::records::AdminUserUuid,
    sites::{
        data::NewSite,
        records::{SiteRecord, SiteUuid},
    },
};

const CREATE_SITE_SQL: &str = include_str!("sql/create_site.sql");
const DOMAIN_EXISTS_SQL: &str = include_str!("sql/domain_exists.sql");
const FIND_SITE_BY_DOMAIN_SQL: &str = include_str!("sql/find_site_by_domain.sql");
const LIST_SITES_SQL: &str = include_str!("sql/list_sites.sql");

/// Name of the unique constraint binding one site per domain.
pub(crate) const SITES_DOMAIN_CONSTRAINT: &str = "sites_domain_key";

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSitesRepository;

impl PgSitesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn domain_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        domain: &str,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(DOMAIN_EXISTS_SQL)
            .bind(domain)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_site_by_domain(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        domain: &str,
    ) -> Result<Option<SiteRecord>, sqlx::Error> {
        query_as::<Postgres, SiteRecord>(FIND_SITE_BY_DOMAIN_SQL)
            .bind(domain)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_sites(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<SiteRecord>, sqlx::Error> {
        query_as::<Postgres, SiteRecord>(LIST_SITES_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    #[tracing::instrument(
        name = "sites.repository.create_site",
        skip(self, tx, site),
        fields(site_uuid = %site.uuid, domain = %site.domain),
        err
    )]
    pub(crate) async fn create_site(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        site: NewSite,
    ) -> Result<SiteRecord, sqlx::Error> {
        query_as::<Postgres, SiteRecord>(CREATE_SITE_SQL)
            .bind(site.uuid.into_uuid())
            .bind(site.domain)
            .bind(site.name)
            .bind(site.admin_entry_path)
            .bind(site.owner_admin_uuid.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for SiteRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: SiteUuid::from_uuid(row.try_get("uuid")?),
            domain: row.try_get("domain")?,
            name: row.try_get("name")?,
            admin_entry_path: row.try_get("admin_entry_path")?,
            owner_admin_uuid: AdminUserUuid::from_uuid(row.try_get("owner_admin_uuid")?),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
