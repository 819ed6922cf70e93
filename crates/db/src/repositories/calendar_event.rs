use chrono::{DateTime, Utc};
use sqlx::Row;

use frontdesk_core::domain::calendar::{
    CalendarEvent, CalendarEventId, EventStatus, NewCalendarEvent, UserId,
};
use frontdesk_core::domain::call::OrganizationId;
use frontdesk_core::domain::customer::CustomerId;

use super::{
    decode_json, decode_timestamp, encode_json, encode_timestamp, new_id, CalendarEventRepository,
    RepositoryError,
};
use crate::DbPool;

const EVENT_COLUMNS: &str = "id, organization_id, user_id, customer_id, title, event_type,
    start_time, end_time, status, attendee_name, attendee_email, attendee_phone,
    external_booking_ref, color, is_recurring, attendees_json, reminders_json, metadata_json,
    created_at";

pub struct SqlCalendarEventRepository {
    pool: DbPool,
}

impl SqlCalendarEventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<CalendarEvent, RepositoryError> {
    let get_text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
    };
    let get_optional = |column: &str| -> Result<Option<String>, RepositoryError> {
        row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
    };

    let status = get_text("status")?;
    let is_recurring: bool =
        row.try_get("is_recurring").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(CalendarEvent {
        id: CalendarEventId(get_text("id")?),
        organization_id: OrganizationId(get_text("organization_id")?),
        user_id: get_optional("user_id")?.map(UserId),
        customer_id: get_optional("customer_id")?.map(CustomerId),
        title: get_text("title")?,
        event_type: get_text("event_type")?,
        start_time: decode_timestamp("start_time", &get_text("start_time")?)?,
        end_time: decode_timestamp("end_time", &get_text("end_time")?)?,
        status: EventStatus::parse(&status)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown event status `{status}`")))?,
        attendee_name: get_optional("attendee_name")?,
        attendee_email: get_optional("attendee_email")?,
        attendee_phone: get_optional("attendee_phone")?,
        external_booking_ref: get_optional("external_booking_ref")?,
        color: get_text("color")?,
        is_recurring,
        attendees: decode_json("attendees_json", &get_text("attendees_json")?)?,
        reminders: decode_json("reminders_json", &get_text("reminders_json")?)?,
        metadata: decode_json("metadata_json", &get_text("metadata_json")?)?,
        created_at: decode_timestamp("created_at", &get_text("created_at")?)?,
    })
}

#[async_trait::async_trait]
impl CalendarEventRepository for SqlCalendarEventRepository {
    async fn create(&self, event: NewCalendarEvent) -> Result<CalendarEvent, RepositoryError> {
        let id = CalendarEventId(new_id("EVT"));
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO calendar_event (id, organization_id, user_id, customer_id, title,
                                         event_type, start_time, end_time, status, attendee_name,
                                         attendee_email, attendee_phone, external_booking_ref,
                                         color, is_recurring, attendees_json, reminders_json,
                                         metadata_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id.0)
        .bind(&event.organization_id.0)
        .bind(event.user_id.as_ref().map(|id| id.0.as_str()))
        .bind(event.customer_id.as_ref().map(|id| id.0.as_str()))
        .bind(&event.title)
        .bind(&event.event_type)
        .bind(encode_timestamp(event.start_time))
        .bind(encode_timestamp(event.end_time))
        .bind(event.status.as_str())
        .bind(&event.attendee_name)
        .bind(&event.attendee_email)
        .bind(&event.attendee_phone)
        .bind(&event.external_booking_ref)
        .bind(&event.color)
        .bind(event.is_recurring)
        .bind(encode_json(&event.attendees)?)
        .bind(encode_json(&event.reminders)?)
        .bind(encode_json(&event.metadata)?)
        .bind(encode_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(CalendarEvent {
            id,
            organization_id: event.organization_id,
            user_id: event.user_id,
            customer_id: event.customer_id,
            title: event.title,
            event_type: event.event_type,
            start_time: event.start_time,
            end_time: event.end_time,
            status: event.status,
            attendee_name: event.attendee_name,
            attendee_email: event.attendee_email,
            attendee_phone: event.attendee_phone,
            external_booking_ref: event.external_booking_ref,
            color: event.color,
            is_recurring: event.is_recurring,
            attendees: event.attendees,
            reminders: event.reminders,
            metadata: event.metadata,
            created_at,
        })
    }

    async fn list_active_between(
        &self,
        organization_id: &OrganizationId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM calendar_event
             WHERE organization_id = ?
               AND status != 'cancelled'
               AND start_time <= ?
               AND end_time > ?
             ORDER BY start_time ASC, id ASC"
        ))
        .bind(&organization_id.0)
        .bind(encode_timestamp(to))
        .bind(encode_timestamp(from))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect::<Result<Vec<_>, _>>()
    }

    async fn list_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<CalendarEvent>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM calendar_event WHERE organization_id = ?
             ORDER BY start_time ASC, id ASC"
        ))
        .bind(&organization_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect::<Result<Vec<_>, _>>()
    }
}
