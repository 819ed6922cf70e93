use chrono::{NaiveDate, Utc};
use sqlx::Row;

use frontdesk_core::domain::call::{CallRecordId, OrganizationId};
use frontdesk_core::domain::customer::CustomerId;
use frontdesk_core::domain::task::{NewTask, Task, TaskId, TaskPriority, TaskStatus, TaskType};

use super::{decode_timestamp, encode_timestamp, new_id, RepositoryError, TaskRepository};
use crate::DbPool;

const TASK_COLUMNS: &str = "id, organization_id, customer_id, call_record_id, title, description,
    task_type, priority, status, due_date, duration_minutes, show_on_calendar, created_at";

pub struct SqlTaskRepository {
    pool: DbPool,
}

impl SqlTaskRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let organization_id: String =
        row.try_get("organization_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_id: Option<String> =
        row.try_get("customer_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let call_record_id: Option<String> =
        row.try_get("call_record_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let title: String = row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: String =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let task_type: String =
        row.try_get("task_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let priority: String =
        row.try_get("priority").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let due_date: String =
        row.try_get("due_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let duration_minutes: i64 =
        row.try_get("duration_minutes").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let show_on_calendar: bool =
        row.try_get("show_on_calendar").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Task {
        id: TaskId(id),
        organization_id: OrganizationId(organization_id),
        customer_id: customer_id.map(CustomerId),
        call_record_id: call_record_id.map(CallRecordId),
        title,
        description,
        task_type: TaskType::parse(&task_type)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown task_type `{task_type}`")))?,
        priority: TaskPriority::parse(&priority)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown priority `{priority}`")))?,
        status: TaskStatus::parse(&status)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown status `{status}`")))?,
        due_date: NaiveDate::parse_from_str(&due_date, "%Y-%m-%d")
            .map_err(|e| RepositoryError::Decode(format!("due_date: {e}")))?,
        duration_minutes: u32::try_from(duration_minutes)
            .map_err(|e| RepositoryError::Decode(format!("duration_minutes: {e}")))?,
        show_on_calendar,
        created_at: decode_timestamp("created_at", &created_at)?,
    })
}

#[async_trait::async_trait]
impl TaskRepository for SqlTaskRepository {
    async fn create(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let id = TaskId(new_id("TSK"));
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO task (id, organization_id, customer_id, call_record_id, title, description,
                               task_type, priority, status, due_date, duration_minutes,
                               show_on_calendar, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id.0)
        .bind(&task.organization_id.0)
        .bind(task.customer_id.as_ref().map(|id| id.0.as_str()))
        .bind(task.call_record_id.as_ref().map(|id| id.0.as_str()))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.task_type.as_str())
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(task.due_date.format("%Y-%m-%d").to_string())
        .bind(i64::from(task.duration_minutes))
        .bind(task.show_on_calendar)
        .bind(encode_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM task WHERE id = ?"))
            .bind(&id.0)
            .fetch_one(&self.pool)
            .await?;
        row_to_task(&row)
    }

    async fn list_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Task>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE organization_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(&organization_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_task).collect::<Result<Vec<_>, _>>()
    }
}
