use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::call::{CallRecordId, OrganizationId};
use crate::domain::customer::CustomerId;

pub const DEFAULT_TASK_TITLE: &str = "Follow-up from phone call";
pub const DEFAULT_TASK_DESCRIPTION: &str = "Created by voice agent during call";
pub const DEFAULT_TASK_DURATION_MINUTES: u32 = 30;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Call,
    Email,
    Sms,
    FollowUp,
    Meeting,
    Other,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Sms => "sms",
            Self::FollowUp => "follow_up",
            Self::Meeting => "meeting",
            Self::Other => "other",
        }
    }

    /// Exact match only; spoken variants are not guessed at.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "call" => Some(Self::Call),
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            "follow_up" => Some(Self::FollowUp),
            "meeting" => Some(Self::Meeting),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn spoken(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub organization_id: OrganizationId,
    pub customer_id: Option<CustomerId>,
    pub call_record_id: Option<CallRecordId>,
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: NaiveDate,
    pub duration_minutes: u32,
    pub show_on_calendar: bool,
    pub created_at: DateTime<Utc>,
}

/// Raw task fields as the voice agent supplied them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTask {
    pub organization_id: OrganizationId,
    pub customer_id: Option<CustomerId>,
    pub call_record_id: Option<CallRecordId>,
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: NaiveDate,
    pub duration_minutes: u32,
    pub show_on_calendar: bool,
}

/// Date portion (UTC) of `now + 24h`.
pub fn tomorrow(now: DateTime<Utc>) -> NaiveDate {
    (now + Duration::hours(24)).date_naive()
}

impl TaskRequest {
    pub fn normalize(
        &self,
        organization_id: OrganizationId,
        customer_id: Option<CustomerId>,
        call_record_id: Option<CallRecordId>,
        now: DateTime<Utc>,
    ) -> NewTask {
        let due_date = non_blank(self.due_date.as_deref())
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
            .unwrap_or_else(|| tomorrow(now));

        NewTask {
            organization_id,
            customer_id,
            call_record_id,
            title: non_blank(self.title.as_deref()).unwrap_or(DEFAULT_TASK_TITLE).to_string(),
            description: non_blank(self.description.as_deref())
                .unwrap_or(DEFAULT_TASK_DESCRIPTION)
                .to_string(),
            task_type: self.task_type.as_deref().and_then(TaskType::parse).unwrap_or(TaskType::FollowUp),
            priority: self.priority.as_deref().and_then(TaskPriority::parse).unwrap_or_default(),
            status: TaskStatus::Pending,
            due_date,
            duration_minutes: DEFAULT_TASK_DURATION_MINUTES,
            show_on_calendar: true,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
