use sqlx::Row;

use frontdesk_core::domain::calendar::UserId;
use frontdesk_core::domain::call::OrganizationId;

use super::{OrganizationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrganizationRepository {
    pool: DbPool,
}

impl SqlOrganizationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrganizationRepository for SqlOrganizationRepository {
    async fn find_owner(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<UserId>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id FROM organization_member
             WHERE organization_id = ? AND role = 'owner'
             ORDER BY created_at ASC, id ASC
             LIMIT 1",
        )
        .bind(&organization_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            row.try_get::<String, _>("user_id")
                .map(UserId)
                .map_err(|e| RepositoryError::Decode(e.to_string()))
        })
        .transpose()
    }
}
