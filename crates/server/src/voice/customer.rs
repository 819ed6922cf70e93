use tracing::{info, warn};

use frontdesk_core::domain::call::ExternalCallId;
use frontdesk_core::domain::customer::{CustomerPatch, NewCustomer};
use frontdesk_core::speech::{self, FallbackPhrase};

use super::args::SaveCustomerInfoArgs;
use super::context::require_call;
use super::VoiceState;

/// Updates the caller's linked customer, or creates one and links the call to it.
pub async fn save_customer_info(
    state: &VoiceState,
    call_id: &ExternalCallId,
    args: SaveCustomerInfoArgs,
) -> Result<String, FallbackPhrase> {
    let call = require_call(state, call_id, FallbackPhrase::CustomerNoted).await?;
    let patch =
        CustomerPatch::from_spoken(args.customer_name.as_deref(), args.customer_email.as_deref());

    if let Some(customer_id) = &call.customer_id {
        if !patch.is_empty() {
            state.customers.apply_patch(customer_id, &patch).await.map_err(|error| {
                warn!(
                    event_name = "voice.customer.update_failed",
                    call_id = %call_id,
                    customer_id = %customer_id,
                    error = %error,
                    "customer update failed"
                );
                FallbackPhrase::CustomerNoted
            })?;
        }
        info!(
            event_name = "voice.customer.updated",
            call_id = %call_id,
            organization_id = %call.organization_id,
            customer_id = %customer_id,
            "customer updated from call"
        );
        return Ok(speech::customer_updated(patch.first_name()));
    }

    let customer = NewCustomer::from_phone_call(
        call.organization_id.clone(),
        &patch,
        call.caller_phone(),
    );
    let created = state.customers.create(customer).await.map_err(|error| {
        warn!(
            event_name = "voice.customer.create_failed",
            call_id = %call_id,
            organization_id = %call.organization_id,
            error = %error,
            "customer creation failed"
        );
        FallbackPhrase::CustomerNoted
    })?;

    match state.calls.link_customer(&call.id, &created.id).await {
        Ok(true) => {}
        Ok(false) => warn!(
            event_name = "voice.customer.link_skipped",
            call_id = %call_id,
            customer_id = %created.id,
            "call was linked concurrently; keeping the existing link"
        ),
        Err(error) => warn!(
            event_name = "voice.customer.link_failed",
            call_id = %call_id,
            customer_id = %created.id,
            error = %error,
            "customer created but call link failed"
        ),
    }

    info!(
        event_name = "voice.customer.created",
        call_id = %call_id,
        organization_id = %call.organization_id,
        customer_id = %created.id,
        "customer created from call"
    );
    Ok(speech::customer_created(patch.first_name()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use frontdesk_core::domain::customer::{DEFAULT_CUSTOMER_NAME, PHONE_LEAD_TAG};
    use frontdesk_core::speech::FallbackPhrase;
    use frontdesk_db::repositories::{CallRecordRepository, CustomerRepository};

    use super::save_customer_info;
    use crate::voice::args::SaveCustomerInfoArgs;
    use crate::voice::test_support::{
        call, FailingCustomers, Harness, CALLER_PHONE, KNOWN_CALL, LINKED_CALL, UNKNOWN_CALL,
    };

    fn args(name: Option<&str>, email: Option<&str>) -> SaveCustomerInfoArgs {
        SaveCustomerInfoArgs {
            customer_name: name.map(str::to_string),
            customer_email: email.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn unlinked_call_creates_phone_lead_and_links_it() {
        let harness = Harness::new().await;

        let result = save_customer_info(
            &harness.state(),
            &call(KNOWN_CALL),
            args(Some("Ana Maria Silva"), Some("ana@example.com")),
        )
        .await
        .expect("created");

        assert_eq!(result, "Thank you, Ana. I've created your profile in our system.");
        let record =
            harness.calls.find_by_external_id(&call(KNOWN_CALL)).await.expect("lookup").expect("call");
        let customer_id = record.customer_id.expect("linked");
        let customer =
            harness.customers.find_by_id(&customer_id).await.expect("lookup").expect("customer");
        assert_eq!(customer.name, "Ana Maria Silva");
        assert_eq!(customer.first_name.as_deref(), Some("Ana"));
        assert_eq!(customer.last_name.as_deref(), Some("Maria Silva"));
        assert_eq!(customer.phone.as_deref(), Some(CALLER_PHONE));
        assert_eq!(customer.status, "Active");
        assert_eq!(customer.priority, "Medium");
        assert_eq!(customer.country, "CA");
        assert_eq!(customer.tags, vec![PHONE_LEAD_TAG.to_string()]);
    }

    #[tokio::test]
    async fn nameless_caller_gets_default_name_and_generic_thanks() {
        let harness = Harness::new().await;

        let result = save_customer_info(&harness.state(), &call(KNOWN_CALL), args(Some("  "), None))
            .await
            .expect("created");

        assert_eq!(result, "Thank you, I've added you to our system.");
        let record =
            harness.calls.find_by_external_id(&call(KNOWN_CALL)).await.expect("lookup").expect("call");
        let customer = harness
            .customers
            .find_by_id(&record.customer_id.expect("linked"))
            .await
            .expect("lookup")
            .expect("customer");
        assert_eq!(customer.name, DEFAULT_CUSTOMER_NAME);
        assert_eq!(customer.email, None);
    }

    #[tokio::test]
    async fn email_only_update_keeps_the_existing_name() {
        let harness = Harness::new().await;
        let state = harness.state();

        let first = save_customer_info(&state, &call(LINKED_CALL), args(Some("Maria Lopez"), None))
            .await
            .expect("first update");
        assert_eq!(first, "Thank you, Maria. I've updated your information on file.");

        let second =
            save_customer_info(&state, &call(LINKED_CALL), args(None, Some("maria.l@example.com")))
                .await
                .expect("second update");
        assert_eq!(second, "Thank you, I've updated your information.");

        let customer = harness
            .customers
            .find_by_id(&harness.linked_customer)
            .await
            .expect("lookup")
            .expect("customer");
        assert_eq!(customer.name, "Maria Lopez");
        assert_eq!(customer.first_name.as_deref(), Some("Maria"));
        assert_eq!(customer.email.as_deref(), Some("maria.l@example.com"));
    }

    #[tokio::test]
    async fn unknown_call_is_noted() {
        let harness = Harness::new().await;
        let outcome =
            save_customer_info(&harness.state(), &call(UNKNOWN_CALL), args(Some("Ana"), None)).await;
        assert_eq!(outcome, Err(FallbackPhrase::CustomerNoted));
    }

    #[tokio::test]
    async fn persistence_failure_degrades_to_noted() {
        let harness = Harness::new().await;
        let mut state = harness.state();
        state.customers = Arc::new(FailingCustomers);

        let created = save_customer_info(&state, &call(KNOWN_CALL), args(Some("Ana"), None)).await;
        let updated = save_customer_info(&state, &call(LINKED_CALL), args(Some("Ana"), None)).await;

        assert_eq!(created, Err(FallbackPhrase::CustomerNoted));
        assert_eq!(updated, Err(FallbackPhrase::CustomerNoted));
        let record =
            harness.calls.find_by_external_id(&call(KNOWN_CALL)).await.expect("lookup").expect("call");
        assert!(!record.is_linked());
    }
}
