//! Every string the voice agent reads aloud.
//!
//! Handlers never build sentences themselves; they pick a [`FallbackPhrase`] or call one of the
//! renderers below, so wording stays consistent across tools.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::domain::task::TaskType;

/// Degraded responses. Each is a complete sentence that keeps the conversation moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackPhrase {
    CustomerNoted,
    TaskNoted,
    TaskNotSaved,
    CalendarUnavailable,
    AvailabilityNeedsDate,
    BookingUnavailable,
    BookingNotSaved,
    BookingNeedsStartTime,
    Acknowledged,
    Unhandled,
}

impl FallbackPhrase {
    pub fn text(&self) -> &'static str {
        match self {
            Self::CustomerNoted => "Thank you, I've noted that down.",
            Self::TaskNoted => "I've made a note of that for the team.",
            Self::TaskNotSaved => "I'll make sure the team follows up on that.",
            Self::CalendarUnavailable => {
                "Let me check... I'm having trouble accessing the calendar right now. Can I take your preferred time and have someone confirm?"
            }
            Self::AvailabilityNeedsDate => {
                "Which day would you like me to check? Please give me the date you have in mind."
            }
            Self::BookingUnavailable => {
                "I apologize, I'm having trouble booking that. Can I take your details and have someone call you back to confirm?"
            }
            Self::BookingNotSaved => {
                "I'm sorry, I had trouble booking that. Let me take your preferred time and someone will confirm with you shortly."
            }
            Self::BookingNeedsStartTime => {
                "What day and time would you like to book? I want to make sure I get it right."
            }
            Self::Acknowledged => "I'll make a note of that.",
            Self::Unhandled => "I'm having a moment, let me continue.",
        }
    }
}

impl std::fmt::Display for FallbackPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// `Tuesday, June 10th`.
pub fn spoken_date(date: NaiveDate) -> String {
    format!("{}, {} {}", date.format("%A"), date.format("%B"), ordinal(date.day()))
}

/// `2:30 PM`, in `tz`.
pub fn spoken_time(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%-I:%M %p").to_string()
}

pub fn spoken_date_of(instant: DateTime<Utc>, tz: Tz) -> String {
    spoken_date(instant.with_timezone(&tz).date_naive())
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

pub fn customer_updated(first_name: Option<&str>) -> String {
    match first_name {
        Some(first) => format!("Thank you, {first}. I've updated your information on file."),
        None => "Thank you, I've updated your information.".to_string(),
    }
}

pub fn customer_created(first_name: Option<&str>) -> String {
    match first_name {
        Some(first) => format!("Thank you, {first}. I've created your profile in our system."),
        None => "Thank you, I've added you to our system.".to_string(),
    }
}

pub fn task_created(task_type: TaskType, due_date: NaiveDate) -> String {
    format!("Done. I've created a {} task for {}.", task_type.spoken(), spoken_date(due_date))
}

pub fn slots_available(date: NaiveDate, slots: &[DateTime<Utc>], tz: Tz) -> String {
    let times = slots.iter().map(|slot| spoken_time(*slot, tz)).collect::<Vec<_>>().join(", ");
    format!(
        "On {}, I have these times available: {times}. Which works best for you?",
        spoken_date(date)
    )
}

pub fn no_slots(duration_minutes: u32, date: NaiveDate) -> String {
    format!(
        "I don't see any available {duration_minutes}-minute slots on {}. Would you like to try a different date?",
        spoken_date(date)
    )
}

pub fn appointment_booked(
    title: &str,
    start: DateTime<Utc>,
    tz: Tz,
    confirmation_email: bool,
) -> String {
    let closing = if confirmation_email {
        "You'll receive a confirmation email."
    } else {
        "Is there anything else I can help with?"
    };
    format!(
        "Your appointment \"{title}\" is booked for {} at {}. {closing}",
        spoken_date_of(start, tz),
        spoken_time(start, tz)
    )
}
