use chrono::Utc;
use sqlx::Row;

use frontdesk_core::domain::call::{CallRecord, CallRecordId, ExternalCallId, OrganizationId};
use frontdesk_core::domain::customer::CustomerId;

use super::{encode_timestamp, CallRecordRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCallRecordRepository {
    pool: DbPool,
}

impl SqlCallRecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_call_record(row: &sqlx::sqlite::SqliteRow) -> Result<CallRecord, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let organization_id: String =
        row.try_get("organization_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let external_call_id: String =
        row.try_get("external_call_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_id: Option<String> =
        row.try_get("customer_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_phone: Option<String> =
        row.try_get("customer_phone").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(CallRecord {
        id: CallRecordId(id),
        organization_id: OrganizationId(organization_id),
        external_call_id: ExternalCallId(external_call_id),
        customer_id: customer_id.map(CustomerId),
        customer_phone,
    })
}

#[async_trait::async_trait]
impl CallRecordRepository for SqlCallRecordRepository {
    async fn find_by_external_id(
        &self,
        external_call_id: &ExternalCallId,
    ) -> Result<Option<CallRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, organization_id, external_call_id, customer_id, customer_phone
             FROM call_record WHERE external_call_id = ?",
        )
        .bind(&external_call_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_call_record).transpose()
    }

    async fn link_customer(
        &self,
        id: &CallRecordId,
        customer_id: &CustomerId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE call_record SET customer_id = ? WHERE id = ? AND customer_id IS NULL",
        )
        .bind(&customer_id.0)
        .bind(&id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn save(&self, record: CallRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO call_record (id, organization_id, external_call_id, customer_id,
                                      customer_phone, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 customer_id = COALESCE(call_record.customer_id, excluded.customer_id),
                 customer_phone = excluded.customer_phone",
        )
        .bind(&record.id.0)
        .bind(&record.organization_id.0)
        .bind(&record.external_call_id.0)
        .bind(record.customer_id.as_ref().map(|id| id.0.as_str()))
        .bind(&record.customer_phone)
        .bind(encode_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
