use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use thiserror::Error;

use crate::domain::provider_settings::ProviderCredentials;
use crate::scheduling::{AvailabilitySlot, SlotSpec};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("calendar provider is not configured for this organization")]
    NotConfigured,
    #[error("calendar provider transport failure: {0}")]
    Transport(String),
    #[error("calendar provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("calendar provider response could not be decoded: {0}")]
    Decode(String),
}

/// An open interval reported by the provider, inside which meetings may start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Availability as reported by the external provider for one day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderAvailability {
    /// Explicit bookable start times.
    Slots(Vec<DateTime<Utc>>),
    /// Open ranges to be cut into slots locally.
    Ranges(Vec<OpenRange>),
    /// Neither shape was present.
    Unavailable,
}

impl ProviderAvailability {
    /// Reads the provider's JSON body. Individual entries that fail to parse are skipped; only a
    /// body that is not a JSON object is an error.
    pub fn from_json(body: &Value) -> Result<Self, ProviderError> {
        let object = body
            .as_object()
            .ok_or_else(|| ProviderError::Decode("availability body is not an object".to_string()))?;

        match object.get("slots") {
            Some(Value::Array(entries)) => {
                return Ok(Self::Slots(entries.iter().filter_map(slot_start).collect()));
            }
            Some(Value::Object(by_date)) => {
                let starts = by_date
                    .values()
                    .filter_map(Value::as_array)
                    .flatten()
                    .filter_map(slot_start)
                    .collect();
                return Ok(Self::Slots(starts));
            }
            _ => {}
        }

        if let Some(Value::Array(ranges)) = object.get("dateRanges") {
            let ranges = ranges
                .iter()
                .filter_map(|range| {
                    let start = parse_timestamp(range.get("start")?.as_str()?)?;
                    let end = parse_timestamp(range.get("end")?.as_str()?)?;
                    Some(OpenRange { start, end })
                })
                .collect();
            return Ok(Self::Ranges(ranges));
        }

        Ok(Self::Unavailable)
    }

    /// Ordered, de-duplicated slots. Ranges are stepped by `slot_spec.granularity` while the meeting
    /// still ends inside the range.
    pub fn into_slots(self, slot_spec: SlotSpec) -> Vec<AvailabilitySlot> {
        let mut starts = match self {
            Self::Slots(starts) => starts,
            Self::Ranges(ranges) => {
                if slot_spec.granularity <= chrono::Duration::zero() {
                    return Vec::new();
                }
                let mut starts = Vec::new();
                for range in ranges {
                    let mut cursor = range.start;
                    while cursor + slot_spec.duration <= range.end {
                        starts.push(cursor);
                        cursor += slot_spec.granularity;
                    }
                }
                starts
            }
            Self::Unavailable => Vec::new(),
        };

        starts.sort();
        starts.dedup();
        starts.into_iter().map(|start| AvailabilitySlot { start }).collect()
    }
}

fn slot_start(entry: &Value) -> Option<DateTime<Utc>> {
    let raw = match entry {
        Value::String(raw) => raw.as_str(),
        Value::Object(fields) => {
            fields.get("time").or_else(|| fields.get("start")).and_then(Value::as_str)?
        }
        _ => return None,
    };
    parse_timestamp(raw)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok().map(|instant| instant.with_timezone(&Utc))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderBooking {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendee_name: String,
    pub attendee_email: String,
    pub time_zone: Tz,
}

/// The external calendar provider as seen by the availability and booking handlers.
///
/// Implementations must bound every request with a timeout; callers treat any `Err` as "no
/// external answer" and continue with internal data.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn availability(
        &self,
        credentials: &ProviderCredentials,
        date: NaiveDate,
    ) -> Result<ProviderAvailability, ProviderError>;

    /// Returns the provider's booking reference.
    async fn create_booking(
        &self,
        credentials: &ProviderCredentials,
        booking: &ProviderBooking,
    ) -> Result<String, ProviderError>;
}
