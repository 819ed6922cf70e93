use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use sqlx::Row;

use frontdesk_core::domain::call::OrganizationId;
use frontdesk_core::domain::provider_settings::ExternalCalendarSettings;

use super::{encode_timestamp, ProviderSettingsRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProviderSettingsRepository {
    pool: DbPool,
}

impl SqlProviderSettingsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProviderSettingsRepository for SqlProviderSettingsRepository {
    async fn find_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<ExternalCalendarSettings>, RepositoryError> {
        let row = sqlx::query(
            "SELECT organization_id, api_key, default_event_type_id
             FROM calendar_provider_settings WHERE organization_id = ?",
        )
        .bind(&organization_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let api_key: Option<String> =
            row.try_get("api_key").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let default_event_type_id: Option<String> = row
            .try_get("default_event_type_id")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        Ok(Some(ExternalCalendarSettings {
            organization_id: organization_id.clone(),
            api_key: api_key.map(SecretString::from),
            default_event_type_id,
        }))
    }

    async fn save(&self, settings: ExternalCalendarSettings) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO calendar_provider_settings (organization_id, api_key,
                                                     default_event_type_id, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(organization_id) DO UPDATE SET
                 api_key = excluded.api_key,
                 default_event_type_id = excluded.default_event_type_id,
                 updated_at = excluded.updated_at",
        )
        .bind(&settings.organization_id.0)
        .bind(settings.api_key.as_ref().map(|key| key.expose_secret().to_string()))
        .bind(&settings.default_event_type_id)
        .bind(encode_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
