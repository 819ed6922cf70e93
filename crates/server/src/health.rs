//! `GET /health`: the service is ready to take tool calls once its schema is current.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use frontdesk_core::config::CalendarProviderConfig;
use frontdesk_db::{migrations, DbPool};
use serde::Serialize;
use tracing::warn;

use crate::voice::TOOL_CALL_PATH;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    calendar_provider: CalendarProviderSummary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    pub readiness: Readiness,
    pub pending_migrations: Vec<i64>,
    pub detail: String,
}

/// Where availability and bookings go for tenants with credentials. Credentials are per tenant,
/// so this is informational and never affects readiness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CalendarProviderSummary {
    pub base_url: String,
    pub timeout_secs: u64,
    pub booking_timezone: String,
}

impl From<&CalendarProviderConfig> for CalendarProviderSummary {
    fn from(config: &CalendarProviderConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
            booking_timezone: config.booking_timezone.name().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub readiness: Readiness,
    pub tool_call_path: &'static str,
    pub schema: SchemaStatus,
    pub calendar_provider: CalendarProviderSummary,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, calendar_provider: &CalendarProviderConfig) -> Router {
    let state = HealthState { db_pool, calendar_provider: calendar_provider.into() };
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let schema = schema_status(&state.db_pool).await;
    let readiness = schema.readiness;
    if readiness == Readiness::Degraded {
        warn!(
            event_name = "system.health.degraded",
            correlation_id = "health",
            detail = %schema.detail,
            "health check reports degraded schema"
        );
    }

    let payload = HealthResponse {
        readiness,
        tool_call_path: TOOL_CALL_PATH,
        schema,
        calendar_provider: state.calendar_provider.clone(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = match readiness {
        Readiness::Ready => StatusCode::OK,
        Readiness::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(payload))
}

async fn schema_status(pool: &DbPool) -> SchemaStatus {
    match migrations::pending_versions(pool).await {
        Ok(pending) if pending.is_empty() => SchemaStatus {
            readiness: Readiness::Ready,
            pending_migrations: pending,
            detail: "schema current".to_string(),
        },
        Ok(pending) => SchemaStatus {
            readiness: Readiness::Degraded,
            detail: format!("{} migration(s) not applied", pending.len()),
            pending_migrations: pending,
        },
        Err(error) => SchemaStatus {
            readiness: Readiness::Degraded,
            pending_migrations: Vec::new(),
            detail: format!("database unreachable: {error}"),
        },
    }
}
