use chrono::Utc;
use sqlx::Row;

use frontdesk_core::domain::call::OrganizationId;
use frontdesk_core::domain::customer::{Customer, CustomerId, CustomerPatch, NewCustomer};

use super::{
    decode_json, decode_timestamp, encode_json, encode_timestamp, new_id, CustomerRepository,
    RepositoryError,
};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let organization_id: String =
        row.try_get("organization_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let first_name: Option<String> =
        row.try_get("first_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let last_name: Option<String> =
        row.try_get("last_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: Option<String> =
        row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let phone: Option<String> =
        row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let priority: String =
        row.try_get("priority").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let country: String =
        row.try_get("country").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tags_json: String =
        row.try_get("tags_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Customer {
        id: CustomerId(id),
        organization_id: OrganizationId(organization_id),
        name,
        first_name,
        last_name,
        email,
        phone,
        status,
        priority,
        country,
        tags: decode_json("tags_json", &tags_json)?,
        created_at: decode_timestamp("created_at", &created_at)?,
        updated_at: decode_timestamp("updated_at", &updated_at)?,
    })
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, organization_id, name, first_name, last_name, email, phone, status,
                    priority, country, tags_json, created_at, updated_at
             FROM customer WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_customer).transpose()
    }

    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let now = Utc::now();
        let id = CustomerId(new_id("CUS"));

        sqlx::query(
            "INSERT INTO customer (id, organization_id, name, first_name, last_name, email, phone,
                                   status, priority, country, tags_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id.0)
        .bind(&customer.organization_id.0)
        .bind(&customer.name)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.status)
        .bind(&customer.priority)
        .bind(&customer.country)
        .bind(encode_json(&customer.tags)?)
        .bind(encode_timestamp(now))
        .bind(encode_timestamp(now))
        .execute(&self.pool)
        .await?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("customer {id} after insert")))
    }

    async fn apply_patch(
        &self,
        id: &CustomerId,
        patch: &CustomerPatch,
    ) -> Result<(), RepositoryError> {
        if patch.is_empty() {
            return Ok(());
        }

        let name = patch.name.as_ref();
        let result = sqlx::query(
            "UPDATE customer SET
                 name = COALESCE(?, name),
                 first_name = COALESCE(?, first_name),
                 last_name = CASE WHEN ? THEN ? ELSE last_name END,
                 email = COALESCE(?, email),
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(name.map(|name| name.full.as_str()))
        .bind(name.map(|name| name.first.as_str()))
        .bind(name.is_some())
        .bind(name.map(|name| name.last.as_str()).filter(|last| !last.is_empty()))
        .bind(&patch.email)
        .bind(encode_timestamp(Utc::now()))
        .bind(&id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("customer {id}")));
        }
        Ok(())
    }
}
