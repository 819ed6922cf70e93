use std::sync::Arc;

use frontdesk_core::config::AppConfig;
use frontdesk_core::scheduling::ProviderError;
use frontdesk_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::calcom::CalcomClient;
use crate::voice::VoiceState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub voice: VoiceState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("calendar provider client failed to initialize: {0}")]
    Provider(#[source] ProviderError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let provider =
        CalcomClient::new(&config.calendar_provider).map_err(BootstrapError::Provider)?;
    info!(
        event_name = "system.bootstrap.provider_ready",
        correlation_id = "bootstrap",
        base_url = %config.calendar_provider.base_url,
        timeout_secs = config.calendar_provider.timeout_secs,
        "calendar provider client ready"
    );

    let voice = VoiceState::from_pool(db_pool.clone(), Arc::new(provider), &config);
    Ok(Application { config, db_pool, voice })
}

#[cfg(test)]
mod tests {
    use frontdesk_core::config::AppConfig;
    use frontdesk_core::domain::call::ExternalCallId;
    use frontdesk_db::{DemoProviderSettings, DemoTenantSeed};

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};
    use crate::voice::{dispatch, ToolInvocation};

    fn config(database_url: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = database_url.to_string();
        config.database.timeout_secs = 1;
        config
    }

    #[tokio::test]
    async fn bootstrap_reports_unreachable_database() {
        let result =
            bootstrap_with_config(config("sqlite:///nonexistent-frontdesk-dir/nested/db.sqlite"))
                .await;

        assert!(matches!(result, Err(BootstrapError::DatabaseConnect(_))));
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_serves_a_seeded_call() {
        let app = bootstrap_with_config(config("sqlite::memory:"))
            .await
            .expect("bootstrap should succeed on an in-memory database");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('call_record', 'customer', 'task', 'calendar_event')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected tables after bootstrap");
        assert_eq!(table_count, 4);

        let seed = DemoTenantSeed::load(&app.db_pool, &DemoProviderSettings::default())
            .await
            .expect("seed");
        let invocation = ToolInvocation::decode(
            "create_task",
            serde_json::json!({ "title": "Call back about estimate", "due_date": "2025-06-10" }),
        )
        .expect("decode");

        let result =
            dispatch(&app.voice, &ExternalCallId(seed.external_call_id), invocation).await;
        assert_eq!(result, "Done. I've created a follow up task for Tuesday, June 10th.");

        app.db_pool.close().await;
    }
}
