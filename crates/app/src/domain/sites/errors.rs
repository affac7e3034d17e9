//! Sites service errors.

use sqlx::Error;
use thiserror::Error;

/// Site service error variants.
#[derive(Debug, Error)]
pub enum SitesServiceError {
    /// Site was not found.
    #[error("site not found")]
    NotFound,

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for SitesServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}
