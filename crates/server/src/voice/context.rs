use tracing::{debug, warn};

use frontdesk_core::domain::call::{CallRecord, ExternalCallId};
use frontdesk_core::speech::FallbackPhrase;

use super::VoiceState;

/// Looks up the call record for `call_id`. Store failures are logged and reported as a miss.
pub async fn resolve_call(state: &VoiceState, call_id: &ExternalCallId) -> Option<CallRecord> {
    match state.calls.find_by_external_id(call_id).await {
        Ok(Some(record)) => Some(record),
        Ok(None) => {
            debug!(
                event_name = "voice.context.miss",
                call_id = %call_id,
                "no call record for tool call"
            );
            None
        }
        Err(error) => {
            warn!(
                event_name = "voice.context.lookup_failed",
                call_id = %call_id,
                error = %error,
                "call record lookup failed; treating as miss"
            );
            None
        }
    }
}

/// [`resolve_call`] with the handler's phrase for a miss.
pub async fn require_call(
    state: &VoiceState,
    call_id: &ExternalCallId,
    on_miss: FallbackPhrase,
) -> Result<CallRecord, FallbackPhrase> {
    resolve_call(state, call_id).await.ok_or(on_miss)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use frontdesk_core::speech::FallbackPhrase;

    use super::{require_call, resolve_call};
    use crate::voice::test_support::{call, FailingCalls, Harness, KNOWN_CALL, UNKNOWN_CALL};

    #[tokio::test]
    async fn known_call_resolves_to_its_tenant() {
        let harness = Harness::new().await;
        let record = resolve_call(&harness.state(), &call(KNOWN_CALL)).await.expect("record");
        assert_eq!(record.organization_id.0, "ORG-1");
        assert!(!record.is_linked());
    }

    #[tokio::test]
    async fn unknown_call_is_a_miss_with_the_handler_phrase() {
        let harness = Harness::new().await;
        let miss =
            require_call(&harness.state(), &call(UNKNOWN_CALL), FallbackPhrase::TaskNoted).await;
        assert_eq!(miss.err(), Some(FallbackPhrase::TaskNoted));
    }

    #[tokio::test]
    async fn store_failure_is_treated_as_a_miss() {
        let harness = Harness::new().await;
        let mut state = harness.state();
        state.calls = Arc::new(FailingCalls);

        assert!(resolve_call(&state, &call(KNOWN_CALL)).await.is_none());
    }
}
