use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::call::{ExternalCallId, OrganizationId};
use crate::domain::customer::CustomerId;
use crate::errors::DomainError;

pub const DEFAULT_BOOKING_TITLE: &str = "Phone Booking";
pub const APPOINTMENT_EVENT_TYPE: &str = "appointment";
pub const VOICE_AGENT_SOURCE: &str = "voice_agent";
pub const DEFAULT_EVENT_COLOR: &str = "#6366f1";
pub const DEFAULT_REMINDER_MINUTES: u32 = 30;
/// Last year an RFC3339 timestamp can carry.
const LATEST_STORABLE_YEAR: i32 = 9999;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarEventId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Some(Self::Scheduled),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub minutes: u32,
    pub method: String,
}

impl Default for Reminder {
    fn default() -> Self {
        Self { minutes: DEFAULT_REMINDER_MINUTES, method: "email".to_string() }
    }
}

/// Provenance stored with every event this service creates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub created_by: String,
    pub call_id: String,
}

impl EventMetadata {
    pub fn voice_agent(call_id: &ExternalCallId) -> Self {
        Self { created_by: VOICE_AGENT_SOURCE.to_string(), call_id: call_id.0.clone() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: CalendarEventId,
    pub organization_id: OrganizationId,
    pub user_id: Option<UserId>,
    pub customer_id: Option<CustomerId>,
    pub title: String,
    pub event_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: EventStatus,
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
    pub attendee_phone: Option<String>,
    pub external_booking_ref: Option<String>,
    pub color: String,
    pub is_recurring: bool,
    pub attendees: Vec<Attendee>,
    pub reminders: Vec<Reminder>,
    pub metadata: EventMetadata,
    pub created_at: DateTime<Utc>,
}

impl CalendarEvent {
    pub fn busy_period(&self) -> BusyPeriod {
        BusyPeriod { start: self.start_time, end: self.end_time }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCalendarEvent {
    pub organization_id: OrganizationId,
    pub user_id: Option<UserId>,
    pub customer_id: Option<CustomerId>,
    pub title: String,
    pub event_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: EventStatus,
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
    pub attendee_phone: Option<String>,
    pub external_booking_ref: Option<String>,
    pub color: String,
    pub is_recurring: bool,
    pub attendees: Vec<Attendee>,
    pub reminders: Vec<Reminder>,
    pub metadata: EventMetadata,
}

/// A booking request after defaults are applied and the end time is derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppointmentDraft {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
    pub attendee_phone: Option<String>,
}

impl AppointmentDraft {
    pub fn new(
        title: Option<&str>,
        start: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<Self, DomainError> {
        let end = start
            .checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
            .unwrap_or(start);
        if end <= start || !storable(start) || !storable(end) {
            return Err(DomainError::InvalidTimeRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        Ok(Self {
            title: non_blank(title).unwrap_or(DEFAULT_BOOKING_TITLE).to_string(),
            start,
            end,
            attendee_name: None,
            attendee_email: None,
            attendee_phone: None,
        })
    }

    pub fn with_attendee(
        mut self,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Self {
        self.attendee_name = non_blank(name).map(str::to_string);
        self.attendee_email = non_blank(email).map(str::to_string);
        self.attendee_phone = non_blank(phone).map(str::to_string);
        self
    }

    pub fn into_event(
        self,
        organization_id: OrganizationId,
        user_id: Option<UserId>,
        customer_id: Option<CustomerId>,
        call_id: &ExternalCallId,
        external_booking_ref: Option<String>,
    ) -> NewCalendarEvent {
        let attendee = Attendee {
            name: self.attendee_name.clone().unwrap_or_default(),
            email: self.attendee_email.clone().unwrap_or_default(),
            status: "pending".to_string(),
        };

        NewCalendarEvent {
            organization_id,
            user_id,
            customer_id,
            title: self.title,
            event_type: APPOINTMENT_EVENT_TYPE.to_string(),
            start_time: self.start,
            end_time: self.end,
            status: EventStatus::Scheduled,
            attendee_name: self.attendee_name,
            attendee_email: self.attendee_email,
            attendee_phone: self.attendee_phone,
            external_booking_ref,
            color: DEFAULT_EVENT_COLOR.to_string(),
            is_recurring: false,
            attendees: vec![attendee],
            reminders: vec![Reminder::default()],
            metadata: EventMetadata::voice_agent(call_id),
        }
    }
}

fn storable(instant: DateTime<Utc>) -> bool {
    (0..=LATEST_STORABLE_YEAR).contains(&instant.year())
}

/// A half-open interval `[start, end)` during which no meeting may be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusyPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyPeriod {
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && self.start < end
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
