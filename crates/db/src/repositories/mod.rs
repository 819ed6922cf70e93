use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use frontdesk_core::domain::calendar::{CalendarEvent, NewCalendarEvent, UserId};
use frontdesk_core::domain::call::{CallRecord, CallRecordId, ExternalCallId, OrganizationId};
use frontdesk_core::domain::customer::{Customer, CustomerId, CustomerPatch, NewCustomer};
use frontdesk_core::domain::provider_settings::ExternalCalendarSettings;
use frontdesk_core::domain::task::{NewTask, Task};

pub mod calendar_event;
pub mod call_record;
pub mod customer;
pub mod memory;
pub mod organization;
pub mod provider_settings;
pub mod task;

pub use calendar_event::SqlCalendarEventRepository;
pub use call_record::SqlCallRecordRepository;
pub use customer::SqlCustomerRepository;
pub use memory::{
    InMemoryCalendarEventRepository, InMemoryCallRecordRepository, InMemoryCustomerRepository,
    InMemoryOrganizationRepository, InMemoryProviderSettingsRepository, InMemoryTaskRepository,
};
pub use organization::SqlOrganizationRepository;
pub use provider_settings::SqlProviderSettingsRepository;
pub use task::SqlTaskRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait CallRecordRepository: Send + Sync {
    async fn find_by_external_id(
        &self,
        external_call_id: &ExternalCallId,
    ) -> Result<Option<CallRecord>, RepositoryError>;

    /// Links an unlinked call to `customer_id`. Returns `false` when the call already carries a
    /// customer, in which case the existing link is kept.
    async fn link_customer(
        &self,
        id: &CallRecordId,
        customer_id: &CustomerId,
    ) -> Result<bool, RepositoryError>;

    async fn save(&self, record: CallRecord) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;
    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError>;

    /// Writes only the fields present in `patch`.
    async fn apply_patch(
        &self,
        id: &CustomerId,
        patch: &CustomerPatch,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: NewTask) -> Result<Task, RepositoryError>;
    async fn list_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Task>, RepositoryError>;
}

#[async_trait]
pub trait CalendarEventRepository: Send + Sync {
    async fn create(&self, event: NewCalendarEvent) -> Result<CalendarEvent, RepositoryError>;

    /// Non-cancelled events of the organization overlapping `[from, to]`, ascending by start.
    async fn list_active_between(
        &self,
        organization_id: &OrganizationId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, RepositoryError>;

    async fn list_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<CalendarEvent>, RepositoryError>;
}

#[async_trait]
pub trait ProviderSettingsRepository: Send + Sync {
    async fn find_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<ExternalCalendarSettings>, RepositoryError>;

    async fn save(&self, settings: ExternalCalendarSettings) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// The member holding the `owner` role, if any.
    async fn find_owner(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<UserId>, RepositoryError>;
}

pub(crate) fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// Fixed-width UTC text so that SQL string comparison orders instants correctly.
pub(crate) fn encode_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn decode_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    column: &str,
    value: &str,
) -> Result<T, RepositoryError> {
    serde_json::from_str(value).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

pub(crate) fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{connect_with_settings, migrations, DbPool};

    pub async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    pub async fn insert_organization(pool: &DbPool, id: &str) {
        sqlx::query("INSERT INTO organization (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(format!("{id} Clinic"))
            .bind("2025-06-01T00:00:00Z")
            .execute(pool)
            .await
            .expect("insert organization");
    }
}
