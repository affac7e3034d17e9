//! Roles service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::roles::{
        data::NewRole,
        errors::RolesServiceError,
        records::{RoleRecord, RoleUuid},
        repository::PgRolesRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgRolesService {
    db: Db,
    repository: PgRolesRepository,
}

impl PgRolesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgRolesRepository::new(),
        }
    }
}

#[async_trait]
impl RolesService for PgRolesService {
    async fn create_role(&self, role: NewRole) -> Result<RoleRecord, RolesServiceError> {
        if role.name.trim().is_empty() {
            return Err(RolesServiceError::InvalidData);
        }

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_role(&mut tx, role).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_role(&self, role: RoleUuid) -> Result<RoleRecord, RolesServiceError> {
        let mut tx = self.db.begin().await?;

        let found = self
            .repository
            .find_role(&mut tx, role)
            .await?
            .ok_or(RolesServiceError::NotFound)?;

        tx.commit().await?;

        Ok(found)
    }
}

#[automock]
#[async_trait]
/// Role persistence operations.
pub trait RolesService: Send + Sync {
    /// Creates a new role.
    async fn create_role(&self, role: NewRole) -> Result<RoleRecord, RolesServiceError>;

    /// Retrieve a single role.
    async fn get_role(&self, role: RoleUuid) -> Result<RoleRecord, RolesServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn create_role_returns_uuid_and_name() -> TestResult {
        let ctx = TestContext::new().await;
        let uuid = RoleUuid::new();

        let role = ctx
            .roles
            .create_role(NewRole {
                uuid,
                name: "editor".to_string(),
            })
            .await?;

        assert_eq!(role.uuid, uuid);
        assert_eq!(role.name, "editor");

        Ok(())
    }

    #[tokio::test]
    async fn create_role_duplicate_name_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx
            .roles
            .create_role(NewRole {
                uuid: RoleUuid::new(),
                name: ctx.default_role.name.clone(),
            })
            .await;

        assert!(
            matches!(result, Err(RolesServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn create_role_blank_name_is_invalid() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx
            .roles
            .create_role(NewRole {
                uuid: RoleUuid::new(),
                name: "  ".to_string(),
            })
            .await;

        assert!(matches!(result, Err(RolesServiceError::InvalidData)));

        Ok(())
    }

    #[tokio::test]
    async fn get_role_missing_returns_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx.roles.get_role(RoleUuid::new()).await;

        assert!(matches!(result, Err(RolesServiceError::NotFound)));

        Ok(())
    }
}
