//! `book_appointment`: an internal calendar event is always written; the external booking is a
//! best-effort extra when the caller gave an email and the tenant has provider credentials.

use tracing::{info, warn};

use frontdesk_core::domain::calendar::{AppointmentDraft, UserId};
use frontdesk_core::domain::call::{CallRecord, ExternalCallId};
use frontdesk_core::scheduling::{parse_instant, ProviderBooking};
use frontdesk_core::speech::{self, FallbackPhrase};

use super::args::BookAppointmentArgs;
use super::context::require_call;
use super::VoiceState;

pub async fn book_appointment(
    state: &VoiceState,
    call_id: &ExternalCallId,
    args: BookAppointmentArgs,
) -> Result<String, FallbackPhrase> {
    let call = require_call(state, call_id, FallbackPhrase::BookingUnavailable).await?;
    let start = args
        .start_time
        .as_deref()
        .and_then(|raw| parse_instant(raw, state.display_timezone()).ok())
        .ok_or(FallbackPhrase::BookingNeedsStartTime)?;
    let duration = args.duration_minutes.unwrap_or(state.scheduling.default_duration_minutes);

    let phone = args
        .attendee_phone
        .as_deref()
        .filter(|phone| !phone.trim().is_empty())
        .or_else(|| call.caller_phone());
    let draft = AppointmentDraft::new(args.title.as_deref(), start, duration)
        .map_err(|error| {
            warn!(
                event_name = "voice.booking.invalid_range",
                call_id = %call_id,
                error = %error,
                "appointment range rejected"
            );
            FallbackPhrase::BookingNeedsStartTime
        })?
        .with_attendee(args.attendee_name.as_deref(), args.attendee_email.as_deref(), phone);

    let external_ref = match draft.attendee_email.as_deref() {
        Some(email) => external_booking(state, &call, &draft, email).await,
        None => None,
    };
    let owner = tenant_owner(state, &call).await;
    let title = draft.title.clone();
    let confirmation_email = draft.attendee_email.is_some();

    let event = draft.into_event(
        call.organization_id.clone(),
        owner,
        call.customer_id.clone(),
        call_id,
        external_ref,
    );
    let created = state.events.create(event).await.map_err(|error| {
        warn!(
            event_name = "voice.booking.create_failed",
            call_id = %call_id,
            organization_id = %call.organization_id,
            error = %error,
            "calendar event insert failed"
        );
        FallbackPhrase::BookingNotSaved
    })?;

    info!(
        event_name = "voice.booking.created",
        call_id = %call_id,
        organization_id = %call.organization_id,
        event_id = %created.id.0,
        external = created.external_booking_ref.is_some(),
        "appointment booked"
    );
    Ok(speech::appointment_booked(&title, start, state.display_timezone(), confirmation_email))
}

/// Books with the tenant's external calendar, returning its reference. Failures are logged and
/// yield `None`.
async fn external_booking(
    state: &VoiceState,
    call: &CallRecord,
    draft: &AppointmentDraft,
    email: &str,
) -> Option<String> {
    let settings = match state.provider_settings.find_for_organization(&call.organization_id).await
    {
        Ok(settings) => settings,
        Err(error) => {
            warn!(
                event_name = "voice.booking.settings_failed",
                organization_id = %call.organization_id,
                error = %error,
                "provider settings lookup failed"
            );
            return None;
        }
    };
    let credentials = settings.and_then(|settings| settings.credentials())?;

    let booking = ProviderBooking {
        start: draft.start,
        end: draft.end,
        attendee_name: draft.attendee_name.clone().unwrap_or_default(),
        attendee_email: email.to_string(),
        time_zone: state.booking_timezone,
    };
    match state.provider.create_booking(&credentials, &booking).await {
        Ok(reference) => Some(reference),
        Err(error) => {
            warn!(
                event_name = "voice.booking.provider_failed",
                organization_id = %call.organization_id,
                error = %error,
                "external booking failed; keeping internal event only"
            );
            None
        }
    }
}

async fn tenant_owner(state: &VoiceState, call: &CallRecord) -> Option<UserId> {
    state.organizations.find_owner(&call.organization_id).await.unwrap_or_else(|error| {
        warn!(
            event_name = "voice.booking.owner_lookup_failed",
            organization_id = %call.organization_id,
            error = %error,
            "organization owner lookup failed"
        );
        None
    })
}
