use chrono::Duration;

use crate::domain::calendar::BusyPeriod;
use crate::scheduling::{AvailabilitySlot, BusinessWindow, SlotSpec};

/// Walks a cursor across `window` and returns every start at which a meeting of
/// `slot_spec.duration` fits without touching a busy period.
///
/// The cursor advances by `slot_spec.granularity` inside a gap and jumps to the end of each busy
/// period it reaches, so a gap at least `slot_spec.duration` long always yields its first slot at
/// the gap's opening edge. Busy periods may arrive unsorted or overlapping; empty or inverted
/// periods are ignored.
pub fn find_gaps(
    busy: &[BusyPeriod],
    window: &BusinessWindow,
    slot_spec: SlotSpec,
) -> Vec<AvailabilitySlot> {
    if slot_spec.duration <= Duration::zero() || slot_spec.granularity <= Duration::zero() {
        return Vec::new();
    }

    let mut periods: Vec<BusyPeriod> =
        busy.iter().copied().filter(|period| period.end > period.start).collect();
    periods.sort_by_key(|period| period.start);

    let mut slots = Vec::new();
    let mut cursor = window.open;

    for period in &periods {
        while cursor + slot_spec.duration <= period.start && cursor + slot_spec.duration <= window.close {
            slots.push(AvailabilitySlot { start: cursor });
            cursor += slot_spec.granularity;
        }
        if period.end > cursor {
            cursor = period.end;
        }
    }

    while cursor + slot_spec.duration <= window.close {
        slots.push(AvailabilitySlot { start: cursor });
        cursor += slot_spec.granularity;
    }

    slots
}
