//! Slot computation for `check_availability` and timestamp handling for `book_appointment`.
//!
//! All instants are carried as UTC. The business window is anchored in the configured operating
//! timezone and converted once, so DST transitions are handled by `chrono-tz`.

pub mod gaps;
pub mod provider;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::SchedulingConfig;
use crate::errors::DomainError;

pub use gaps::find_gaps;
pub use provider::{
    CalendarProvider, OpenRange, ProviderAvailability, ProviderBooking, ProviderError,
};

/// A candidate meeting start. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AvailabilitySlot {
    pub start: DateTime<Utc>,
}

/// The bookable span of one calendar day, `[open, close]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusinessWindow {
    pub open: DateTime<Utc>,
    pub close: DateTime<Utc>,
}

impl BusinessWindow {
    pub fn for_date(date: NaiveDate, config: &SchedulingConfig) -> Result<Self, DomainError> {
        let open = local_instant(config.timezone, date.and_time(config.business_start))?;
        let close = local_instant(config.timezone, date.and_time(config.business_end))?;
        if close <= open {
            return Err(DomainError::InvalidTimeRange {
                start: open.to_rfc3339(),
                end: close.to_rfc3339(),
            });
        }
        Ok(Self { open, close })
    }

    pub fn contains(&self, start: DateTime<Utc>, duration: Duration) -> bool {
        start >= self.open && start + duration <= self.close
    }
}

/// Meeting length and cursor step used by gap-finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotSpec {
    pub duration: Duration,
    pub granularity: Duration,
}

impl SlotSpec {
    pub fn new(duration_minutes: u32, granularity_minutes: u32) -> Self {
        Self {
            duration: Duration::minutes(i64::from(duration_minutes)),
            granularity: Duration::minutes(i64::from(granularity_minutes)),
        }
    }
}

pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::UnparseableTimestamp(raw.to_string()))
}

/// Parses an ISO-8601 start time. Values without an offset are read as wall-clock time in `tz`.
pub fn parse_instant(raw: &str, tz: Tz) -> Result<DateTime<Utc>, DomainError> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] =
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| DomainError::UnparseableTimestamp(raw.to_string()))
        .and_then(|naive| local_instant(tz, naive))
}

fn local_instant(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Utc>, DomainError> {
    // Gap hours (spring forward) have no local representation; shift past them.
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| DomainError::UnparseableTimestamp(naive.to_string()))
}
