use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::connection::DbPool;
use crate::repositories::{encode_timestamp, RepositoryError};

pub const DEMO_ORGANIZATION_ID: &str = "org-demo";
pub const DEMO_OWNER_USER_ID: &str = "user-demo-owner";
pub const DEMO_CALL_RECORD_ID: &str = "call-demo";
pub const DEMO_EXTERNAL_CALL_ID: &str = "demo-call-1";
pub const DEMO_CALLER_PHONE: &str = "+14165550100";

/// Optional external calendar credentials to attach to the demo tenant.
#[derive(Clone, Debug, Default)]
pub struct DemoProviderSettings {
    pub api_key: Option<SecretString>,
    pub event_type_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub organization_id: String,
    pub owner_user_id: String,
    pub external_call_id: String,
    pub provider_configured: bool,
}

/// A single tenant with an owner and one unlinked inbound call, enough to drive every tool call
/// by hand. Loading twice is a no-op.
pub struct DemoTenantSeed;

impl DemoTenantSeed {
    pub async fn load(
        pool: &DbPool,
        provider: &DemoProviderSettings,
    ) -> Result<SeedResult, RepositoryError> {
        let now = encode_timestamp(Utc::now());
        let mut tx = pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO organization (id, name, created_at) VALUES (?, ?, ?)")
            .bind(DEMO_ORGANIZATION_ID)
            .bind("Demo Front Desk")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT OR IGNORE INTO organization_member (id, organization_id, user_id, role, created_at)
             VALUES (?, ?, ?, 'owner', ?)",
        )
        .bind("member-demo-owner")
        .bind(DEMO_ORGANIZATION_ID)
        .bind(DEMO_OWNER_USER_ID)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT OR IGNORE INTO call_record (id, organization_id, external_call_id, customer_id,
                                                customer_phone, created_at)
             VALUES (?, ?, ?, NULL, ?, ?)",
        )
        .bind(DEMO_CALL_RECORD_ID)
        .bind(DEMO_ORGANIZATION_ID)
        .bind(DEMO_EXTERNAL_CALL_ID)
        .bind(DEMO_CALLER_PHONE)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let provider_configured = provider.api_key.is_some() && provider.event_type_id.is_some();
        if provider_configured {
            sqlx::query(
                "INSERT INTO calendar_provider_settings (organization_id, api_key,
                                                         default_event_type_id, updated_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(organization_id) DO UPDATE SET
                     api_key = excluded.api_key,
                     default_event_type_id = excluded.default_event_type_id,
                     updated_at = excluded.updated_at",
            )
            .bind(DEMO_ORGANIZATION_ID)
            .bind(provider.api_key.as_ref().map(|key| key.expose_secret().to_string()))
            .bind(&provider.event_type_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(SeedResult {
            organization_id: DEMO_ORGANIZATION_ID.to_string(),
            owner_user_id: DEMO_OWNER_USER_ID.to_string(),
            external_call_id: DEMO_EXTERNAL_CALL_ID.to_string(),
            provider_configured,
        })
    }
}

#[cfg(test)]
mod tests {
    use frontdesk_core::domain::call::{ExternalCallId, OrganizationId};

    use super::{DemoProviderSettings, DemoTenantSeed, DEMO_EXTERNAL_CALL_ID, DEMO_OWNER_USER_ID};
    use crate::repositories::test_support::setup;
    use crate::repositories::{
        CallRecordRepository, OrganizationRepository, ProviderSettingsRepository,
        SqlCallRecordRepository, SqlOrganizationRepository, SqlProviderSettingsRepository,
    };

    #[tokio::test]
    async fn demo_seed_is_idempotent_and_resolvable() {
        let pool = setup().await;

        let first = DemoTenantSeed::load(&pool, &DemoProviderSettings::default()).await.expect("seed");
        let second =
            DemoTenantSeed::load(&pool, &DemoProviderSettings::default()).await.expect("reseed");
        assert_eq!(first, second);
        assert!(!first.provider_configured);

        let call = SqlCallRecordRepository::new(pool.clone())
            .find_by_external_id(&ExternalCallId(DEMO_EXTERNAL_CALL_ID.to_string()))
            .await
            .expect("lookup")
            .expect("seeded call");
        assert!(!call.is_linked());

        let org = OrganizationId(first.organization_id.clone());
        let owner = SqlOrganizationRepository::new(pool.clone()).find_owner(&org).await.expect("owner");
        assert_eq!(owner.map(|user| user.0), Some(DEMO_OWNER_USER_ID.to_string()));

        let settings = SqlProviderSettingsRepository::new(pool)
            .find_for_organization(&org)
            .await
            .expect("settings lookup");
        assert!(settings.is_none());
    }
}
