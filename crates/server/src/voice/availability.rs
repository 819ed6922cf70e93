//! `check_availability`: external provider first, internal gap-finding when it yields nothing.

use chrono::NaiveDate;
use tracing::{info, warn};

use frontdesk_core::domain::call::{CallRecord, ExternalCallId};
use frontdesk_core::scheduling::{
    find_gaps, parse_calendar_date, AvailabilitySlot, BusinessWindow, SlotSpec,
};
use frontdesk_core::speech::{self, FallbackPhrase};

use super::args::CheckAvailabilityArgs;
use super::context::require_call;
use super::VoiceState;

pub async fn check_availability(
    state: &VoiceState,
    call_id: &ExternalCallId,
    args: CheckAvailabilityArgs,
) -> Result<String, FallbackPhrase> {
    let call = require_call(state, call_id, FallbackPhrase::CalendarUnavailable).await?;
    let date = args
        .date
        .as_deref()
        .and_then(|raw| parse_calendar_date(raw).ok())
        .ok_or(FallbackPhrase::AvailabilityNeedsDate)?;
    let duration = args.duration_minutes.unwrap_or(state.scheduling.default_duration_minutes);
    let slot_spec = SlotSpec::new(duration, state.scheduling.slot_granularity_minutes);

    let mut slots = provider_slots(state, &call, date, slot_spec).await;
    let source = if slots.is_empty() {
        slots = internal_slots(state, &call, date, slot_spec).await?;
        "internal"
    } else {
        "provider"
    };

    info!(
        event_name = "voice.availability.computed",
        call_id = %call_id,
        organization_id = %call.organization_id,
        date = %date,
        duration_minutes = duration,
        slot_count = slots.len(),
        source,
        "availability computed"
    );

    if slots.is_empty() {
        return Ok(speech::no_slots(duration, date));
    }
    let spoken: Vec<_> =
        slots.iter().take(state.scheduling.max_spoken_slots).map(|slot| slot.start).collect();
    Ok(speech::slots_available(date, &spoken, state.display_timezone()))
}

/// Slots from the tenant's external calendar. Every failure is logged and reads as "no slots".
async fn provider_slots(
    state: &VoiceState,
    call: &CallRecord,
    date: NaiveDate,
    slot_spec: SlotSpec,
) -> Vec<AvailabilitySlot> {
    let settings = match state.provider_settings.find_for_organization(&call.organization_id).await
    {
        Ok(settings) => settings,
        Err(error) => {
            warn!(
                event_name = "voice.availability.settings_failed",
                organization_id = %call.organization_id,
                error = %error,
                "provider settings lookup failed"
            );
            return Vec::new();
        }
    };
    let Some(credentials) = settings.and_then(|settings| settings.credentials()) else {
        return Vec::new();
    };

    match state.provider.availability(&credentials, date).await {
        Ok(availability) => availability.into_slots(slot_spec),
        Err(error) => {
            warn!(
                event_name = "voice.availability.provider_failed",
                organization_id = %call.organization_id,
                date = %date,
                error = %error,
                "external availability failed; using internal calendar"
            );
            Vec::new()
        }
    }
}

async fn internal_slots(
    state: &VoiceState,
    call: &CallRecord,
    date: NaiveDate,
    slot_spec: SlotSpec,
) -> Result<Vec<AvailabilitySlot>, FallbackPhrase> {
    let window = BusinessWindow::for_date(date, &state.scheduling).map_err(|error| {
        warn!(
            event_name = "voice.availability.window_invalid",
            date = %date,
            error = %error,
            "business window could not be built"
        );
        FallbackPhrase::CalendarUnavailable
    })?;

    let events = state
        .events
        .list_active_between(&call.organization_id, window.open, window.close)
        .await
        .map_err(|error| {
            warn!(
                event_name = "voice.availability.events_failed",
                organization_id = %call.organization_id,
                error = %error,
                "calendar event lookup failed"
            );
            FallbackPhrase::CalendarUnavailable
        })?;

    let busy: Vec<_> = events.iter().map(|event| event.busy_period()).collect();
    Ok(find_gaps(&busy, &window, slot_spec))
}
