//! Sites service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::sites::{
        errors::SitesServiceError, records::SiteRecord, repository::PgSitesRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgSitesService {
    db: Db,
    repository: PgSitesRepository,
}

impl PgSitesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgSitesRepository::new(),
        }
    }
}

#[async_trait]
impl SitesService for PgSitesService {
    async fn list_sites(&self) -> Result<Vec<SiteRecord>, SitesServiceError> {
        let mut tx = self.db.begin().await?;

        let sites = self.repository.list_sites(&mut tx).await?;

        tx.commit().await?;

        Ok(sites)
    }

    async fn get_site_by_domain(&self, domain: &str) -> Result<SiteRecord, SitesServiceError> {
        let mut tx = self.db.begin().await?;

        let site = self
            .repository
            .find_site_by_domain(&mut tx, &domain.to_ascii_lowercase())
            .await?
            .ok_or(SitesServiceError::NotFound)?;

        tx.commit().await?;

        Ok(site)
    }
}

#[automock]
#[async_trait]
/// Read access to provisioned sites.
pub trait SitesService: Send + Sync {
    /// Retrieves all sites, oldest first.
    async fn list_sites(&self) -> Result<Vec<SiteRecord>, SitesServiceError>;

    /// Retrieve the site bound to a domain.
    async fn get_site_by_domain(&self, domain: &str) -> Result<SiteRecord, SitesServiceError>;
}
