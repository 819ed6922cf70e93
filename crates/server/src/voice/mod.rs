//! Inbound tool-call webhook for the voice agent.
//!
//! One endpoint receives `{ call_id, agent_id, name, args }` and answers `{ result }`. Only a
//! structurally broken request (400) or a panic (500) escapes as a non-200 status; every other
//! outcome is a sentence the agent can read aloud.

pub mod args;
mod availability;
mod booking;
mod context;
mod customer;
mod task;

use std::any::Any;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info, warn};

use frontdesk_core::config::{AppConfig, SchedulingConfig};
use frontdesk_core::domain::call::ExternalCallId;
use frontdesk_core::errors::InterfaceError;
use frontdesk_core::scheduling::CalendarProvider;
use frontdesk_core::speech::FallbackPhrase;
use frontdesk_db::repositories::{
    CalendarEventRepository, CallRecordRepository, CustomerRepository, OrganizationRepository,
    ProviderSettingsRepository, SqlCalendarEventRepository, SqlCallRecordRepository,
    SqlCustomerRepository, SqlOrganizationRepository, SqlProviderSettingsRepository,
    SqlTaskRepository, TaskRepository,
};
use frontdesk_db::DbPool;

pub use args::ToolInvocation;

pub const TOOL_CALL_PATH: &str = "/api/v1/voice/tool-call";

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Client-Info, Apikey";

/// Everything a handler may touch. Cloned per request; holds no per-call state.
#[derive(Clone)]
pub struct VoiceState {
    pub calls: Arc<dyn CallRecordRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub events: Arc<dyn CalendarEventRepository>,
    pub provider_settings: Arc<dyn ProviderSettingsRepository>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub provider: Arc<dyn CalendarProvider>,
    pub scheduling: SchedulingConfig,
    pub booking_timezone: Tz,
}

impl VoiceState {
    pub fn from_pool(pool: DbPool, provider: Arc<dyn CalendarProvider>, config: &AppConfig) -> Self {
        Self {
            calls: Arc::new(SqlCallRecordRepository::new(pool.clone())),
            customers: Arc::new(SqlCustomerRepository::new(pool.clone())),
            tasks: Arc::new(SqlTaskRepository::new(pool.clone())),
            events: Arc::new(SqlCalendarEventRepository::new(pool.clone())),
            provider_settings: Arc::new(SqlProviderSettingsRepository::new(pool.clone())),
            organizations: Arc::new(SqlOrganizationRepository::new(pool)),
            provider,
            scheduling: config.scheduling.clone(),
            booking_timezone: config.calendar_provider.booking_timezone,
        }
    }

    /// Timezone used for every spoken date and time.
    pub fn display_timezone(&self) -> Tz {
        self.scheduling.timezone
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ToolCallRequest {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub args: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub result: String,
}

pub fn router(state: VoiceState) -> Router {
    Router::new().route(TOOL_CALL_PATH, post(tool_call).options(preflight)).with_state(state)
}

/// Wraps `router` so that every response, including a caught panic, carries the CORS headers.
pub fn with_envelope(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn tool_call(State(state): State<VoiceState>, body: Bytes) -> Response {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    let request = match serde_json::from_slice::<ToolCallRequest>(&body) {
        Ok(request) => request,
        Err(error) => {
            warn!(
                event_name = "voice.tool.invalid_body",
                correlation_id = %correlation_id,
                error = %error,
                "tool call body is not a valid request object"
            );
            return interface_error_response(&InterfaceError::bad_request(
                error.to_string(),
                correlation_id,
            ));
        }
    };

    let (Some(call_id), Some(name)) = (non_blank(request.call_id), non_blank(request.name)) else {
        warn!(
            event_name = "voice.tool.missing_fields",
            correlation_id = %correlation_id,
            "tool call without call_id or function name"
        );
        return interface_error_response(&InterfaceError::bad_request(
            "missing call_id or name",
            correlation_id,
        ));
    };

    info!(
        event_name = "voice.tool.dispatch",
        correlation_id = %correlation_id,
        call_id = %call_id,
        agent_id = request.agent_id.as_deref().unwrap_or("unknown"),
        function = %name,
        "dispatching tool call"
    );

    let call_id = ExternalCallId(call_id);
    let result = match ToolInvocation::decode(&name, request.args) {
        Ok(invocation) => dispatch(&state, &call_id, invocation).await,
        Err(error) => {
            warn!(
                event_name = "voice.tool.invalid_args",
                correlation_id = %correlation_id,
                call_id = %call_id,
                function = %name,
                error = %error,
                "tool call arguments could not be decoded"
            );
            FallbackPhrase::Acknowledged.text().to_string()
        }
    };

    (StatusCode::OK, Json(ToolCallResponse { result })).into_response()
}

/// Runs one tool call and renders its outcome. Never fails: a degraded path yields its phrase.
pub async fn dispatch(
    state: &VoiceState,
    call_id: &ExternalCallId,
    invocation: ToolInvocation,
) -> String {
    let outcome = match invocation {
        ToolInvocation::SaveCustomerInfo(args) => {
            customer::save_customer_info(state, call_id, args).await
        }
        ToolInvocation::CreateTask(args) => task::create_task(state, call_id, args).await,
        ToolInvocation::CheckAvailability(args) => {
            availability::check_availability(state, call_id, args).await
        }
        ToolInvocation::BookAppointment(args) => {
            booking::book_appointment(state, call_id, args).await
        }
        ToolInvocation::Unknown(name) => {
            warn!(
                event_name = "voice.tool.unknown_function",
                call_id = %call_id,
                function = %name,
                "unknown tool function"
            );
            Err(FallbackPhrase::Acknowledged)
        }
    };

    outcome.unwrap_or_else(|phrase| phrase.text().to_string())
}

fn interface_error_response(error: &InterfaceError) -> Response {
    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ToolCallResponse { result: error.user_message().to_string() })).into_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    let failure = InterfaceError::internal(detail, uuid::Uuid::new_v4().to_string());

    error!(
        event_name = "voice.tool.panic",
        correlation_id = failure.correlation_id(),
        error = %failure,
        "tool call handler panicked"
    );
    interface_error_response(&failure)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use secrecy::SecretString;

    use frontdesk_core::config::AppConfig;
    use frontdesk_core::domain::calendar::{CalendarEvent, NewCalendarEvent, UserId};
    use frontdesk_core::domain::call::{CallRecord, CallRecordId, ExternalCallId, OrganizationId};
    use frontdesk_core::domain::customer::{Customer, CustomerId, CustomerPatch, NewCustomer};
    use frontdesk_core::domain::provider_settings::{
        ExternalCalendarSettings, ProviderCredentials,
    };
    use frontdesk_core::domain::task::{NewTask, Task};
    use frontdesk_core::scheduling::{
        CalendarProvider, ProviderAvailability, ProviderBooking, ProviderError,
    };
    use frontdesk_db::repositories::{
        CalendarEventRepository, CallRecordRepository, CustomerRepository,
        InMemoryCalendarEventRepository, InMemoryCallRecordRepository, InMemoryCustomerRepository,
        InMemoryOrganizationRepository, InMemoryProviderSettingsRepository,
        InMemoryTaskRepository, ProviderSettingsRepository, RepositoryError, TaskRepository,
    };

    use super::VoiceState;

    pub const ORG: &str = "ORG-1";
    pub const KNOWN_CALL: &str = "retell-known";
    pub const LINKED_CALL: &str = "retell-linked";
    pub const UNKNOWN_CALL: &str = "retell-missing";
    pub const CALLER_PHONE: &str = "+14165550199";

    pub fn org() -> OrganizationId {
        OrganizationId(ORG.to_string())
    }

    pub fn call(id: &str) -> ExternalCallId {
        ExternalCallId(id.to_string())
    }

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("date")
    }

    /// Wall-clock time in Toronto on 2025-06-10 (EDT, UTC-4).
    pub fn toronto(hour: u32, minute: u32) -> DateTime<Utc> {
        chrono_tz::America::Toronto
            .with_ymd_and_hms(2025, 6, 10, hour, minute, 0)
            .single()
            .expect("local time")
            .with_timezone(&Utc)
    }

    #[derive(Clone)]
    pub enum AvailabilityReply {
        Open(ProviderAvailability),
        Fail(ProviderError),
    }

    /// Scripted calendar provider that records what it was asked.
    pub struct StubProvider {
        availability: AvailabilityReply,
        booking: Result<String, ProviderError>,
        pub availability_requests: Mutex<Vec<NaiveDate>>,
        pub bookings: Mutex<Vec<ProviderBooking>>,
    }

    impl StubProvider {
        pub fn new(availability: AvailabilityReply, booking: Result<String, ProviderError>) -> Self {
            Self {
                availability,
                booking,
                availability_requests: Mutex::new(Vec::new()),
                bookings: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self::new(
                AvailabilityReply::Fail(ProviderError::Transport("connection reset".to_string())),
                Err(ProviderError::Status { status: 500, body: "upstream down".to_string() }),
            )
        }

        pub fn with_slots(slots: Vec<DateTime<Utc>>) -> Self {
            Self::new(
                AvailabilityReply::Open(ProviderAvailability::Slots(slots)),
                Ok("bk_stub".to_string()),
            )
        }

        pub fn availability_calls(&self) -> usize {
            self.availability_requests.lock().expect("lock").len()
        }

        pub fn booking_calls(&self) -> Vec<ProviderBooking> {
            self.bookings.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl CalendarProvider for StubProvider {
        async fn availability(
            &self,
            _credentials: &ProviderCredentials,
            date: NaiveDate,
        ) -> Result<ProviderAvailability, ProviderError> {
            self.availability_requests.lock().expect("lock").push(date);
            match &self.availability {
                AvailabilityReply::Open(availability) => Ok(availability.clone()),
                AvailabilityReply::Fail(error) => Err(error.clone()),
            }
        }

        async fn create_booking(
            &self,
            _credentials: &ProviderCredentials,
            booking: &ProviderBooking,
        ) -> Result<String, ProviderError> {
            self.bookings.lock().expect("lock").push(booking.clone());
            self.booking.clone()
        }
    }

    fn injected() -> RepositoryError {
        RepositoryError::Decode("injected failure".to_string())
    }

    pub struct FailingCalls;

    #[async_trait]
    impl CallRecordRepository for FailingCalls {
        async fn find_by_external_id(
            &self,
            _external_call_id: &ExternalCallId,
        ) -> Result<Option<CallRecord>, RepositoryError> {
            Err(injected())
        }

        async fn link_customer(
            &self,
            _id: &CallRecordId,
            _customer_id: &CustomerId,
        ) -> Result<bool, RepositoryError> {
            Err(injected())
        }

        async fn save(&self, _record: CallRecord) -> Result<(), RepositoryError> {
            Err(injected())
        }
    }

    pub struct FailingCustomers;

    #[async_trait]
    impl CustomerRepository for FailingCustomers {
        async fn find_by_id(&self, _id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
            Err(injected())
        }

        async fn create(&self, _customer: NewCustomer) -> Result<Customer, RepositoryError> {
            Err(injected())
        }

        async fn apply_patch(
            &self,
            _id: &CustomerId,
            _patch: &CustomerPatch,
        ) -> Result<(), RepositoryError> {
            Err(injected())
        }
    }

    pub struct FailingTasks;

    #[async_trait]
    impl TaskRepository for FailingTasks {
        async fn create(&self, _task: NewTask) -> Result<Task, RepositoryError> {
            Err(injected())
        }

        async fn list_for_organization(
            &self,
            _organization_id: &OrganizationId,
        ) -> Result<Vec<Task>, RepositoryError> {
            Err(injected())
        }
    }

    pub struct FailingEvents;

    #[async_trait]
    impl CalendarEventRepository for FailingEvents {
        async fn create(&self, _event: NewCalendarEvent) -> Result<CalendarEvent, RepositoryError> {
            Err(injected())
        }

        async fn list_active_between(
            &self,
            _organization_id: &OrganizationId,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>, RepositoryError> {
            Err(injected())
        }

        async fn list_for_organization(
            &self,
            _organization_id: &OrganizationId,
        ) -> Result<Vec<CalendarEvent>, RepositoryError> {
            Err(injected())
        }
    }

    /// In-memory tenant `ORG-1` with one unlinked call (`KNOWN_CALL`) and one call already linked
    /// to a customer (`LINKED_CALL`).
    pub struct Harness {
        pub calls: Arc<InMemoryCallRecordRepository>,
        pub customers: Arc<InMemoryCustomerRepository>,
        pub tasks: Arc<InMemoryTaskRepository>,
        pub events: Arc<InMemoryCalendarEventRepository>,
        pub provider_settings: Arc<InMemoryProviderSettingsRepository>,
        pub organizations: Arc<InMemoryOrganizationRepository>,
        pub provider: Arc<StubProvider>,
        pub linked_customer: CustomerId,
    }

    impl Harness {
        pub async fn new() -> Self {
            Self::with_provider(StubProvider::failing()).await
        }

        pub async fn with_provider(provider: StubProvider) -> Self {
            let calls = Arc::new(InMemoryCallRecordRepository::default());
            let customers = Arc::new(InMemoryCustomerRepository::default());

            let existing = customers
                .create(NewCustomer::from_phone_call(
                    org(),
                    &CustomerPatch::from_spoken(Some("Maria Lopez"), Some("maria@example.com")),
                    Some(CALLER_PHONE),
                ))
                .await
                .expect("existing customer");

            calls
                .save(CallRecord {
                    id: CallRecordId("CALL-KNOWN".to_string()),
                    organization_id: org(),
                    external_call_id: call(KNOWN_CALL),
                    customer_id: None,
                    customer_phone: Some(CALLER_PHONE.to_string()),
                })
                .await
                .expect("known call");
            calls
                .save(CallRecord {
                    id: CallRecordId("CALL-LINKED".to_string()),
                    organization_id: org(),
                    external_call_id: call(LINKED_CALL),
                    customer_id: Some(existing.id.clone()),
                    customer_phone: Some(CALLER_PHONE.to_string()),
                })
                .await
                .expect("linked call");

            Self {
                calls,
                customers,
                tasks: Arc::new(InMemoryTaskRepository::default()),
                events: Arc::new(InMemoryCalendarEventRepository::default()),
                provider_settings: Arc::new(InMemoryProviderSettingsRepository::default()),
                organizations: Arc::new(InMemoryOrganizationRepository::default()),
                provider: Arc::new(provider),
                linked_customer: existing.id,
            }
        }

        pub async fn configure_provider(&self) {
            self.provider_settings
                .save(ExternalCalendarSettings {
                    organization_id: org(),
                    api_key: Some(SecretString::from("cal_live_test".to_string())),
                    default_event_type_id: Some("42".to_string()),
                })
                .await
                .expect("provider settings");
        }

        pub async fn set_owner(&self, user_id: &str) {
            self.organizations.set_owner(&org(), UserId(user_id.to_string())).await;
        }

        pub fn state(&self) -> VoiceState {
            let config = AppConfig::default();
            VoiceState {
                calls: self.calls.clone(),
                customers: self.customers.clone(),
                tasks: self.tasks.clone(),
                events: self.events.clone(),
                provider_settings: self.provider_settings.clone(),
                organizations: self.organizations.clone(),
                provider: self.provider.clone(),
                scheduling: config.scheduling,
                booking_timezone: config.calendar_provider.booking_timezone,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use frontdesk_core::config::AppConfig;
    use frontdesk_core::domain::call::{ExternalCallId, OrganizationId};
    use frontdesk_core::speech::FallbackPhrase;
    use frontdesk_db::fixtures::{DemoProviderSettings, DemoTenantSeed, DEMO_EXTERNAL_CALL_ID};
    use frontdesk_db::repositories::{
        CallRecordRepository, CustomerRepository, SqlCallRecordRepository, SqlCustomerRepository,
    };
    use frontdesk_db::{connect_with_settings, migrations};

    use super::test_support::{Harness, StubProvider, KNOWN_CALL, UNKNOWN_CALL};
    use super::{router, with_envelope, ToolCallResponse, VoiceState, TOOL_CALL_PATH};

    fn app(state: VoiceState) -> Router {
        with_envelope(router(state))
    }

    async fn post_json(app: Router, body: Value) -> (StatusCode, axum::http::HeaderMap, Value) {
        post_raw(app, body.to_string()).await
    }

    async fn post_raw(app: Router, body: String) -> (StatusCode, axum::http::HeaderMap, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(TOOL_CALL_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, payload)
    }

    fn assert_cors(headers: &axum::http::HeaderMap) {
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).expect("origin"), "*");
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).expect("methods"),
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).expect("headers"),
            "Content-Type, Authorization, X-Client-Info, Apikey"
        );
    }

    #[tokio::test]
    async fn preflight_returns_ok_with_cors_and_no_body() {
        let harness = Harness::new().await;
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(TOOL_CALL_PATH)
            .body(Body::empty())
            .expect("request");

        let response = app(harness.state()).oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(response.headers());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn missing_call_id_or_name_is_a_bad_request() {
        let harness = Harness::new().await;

        for body in [
            json!({ "name": "create_task", "args": {} }),
            json!({ "call_id": KNOWN_CALL, "args": {} }),
            json!({ "call_id": "  ", "name": "create_task" }),
        ] {
            let (status, headers, payload) = post_json(app(harness.state()), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_cors(&headers);
            assert_eq!(payload, json!({ "result": "Missing call_id or function name" }));
        }
    }

    #[tokio::test]
    async fn unparseable_body_is_a_bad_request() {
        let harness = Harness::new().await;
        let (status, headers, payload) =
            post_raw(app(harness.state()), "{ not json".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_cors(&headers);
        assert!(payload["result"].is_string());
    }

    #[tokio::test]
    async fn unknown_function_is_acknowledged() {
        let harness = Harness::new().await;
        let (status, headers, payload) = post_json(
            app(harness.state()),
            json!({ "call_id": KNOWN_CALL, "agent_id": "agent-1", "name": "transfer_call", "args": {} }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_cors(&headers);
        assert_eq!(payload, json!({ "result": "I'll make a note of that." }));
    }

    #[tokio::test]
    async fn undecodable_args_for_known_function_are_acknowledged() {
        let harness = Harness::new().await;
        let (status, _headers, payload) = post_json(
            app(harness.state()),
            json!({ "call_id": KNOWN_CALL, "name": "save_customer_info", "args": { "customer_name": ["x"] } }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["result"], "I'll make a note of that.");
        assert!(harness.calls.find_by_external_id(&ExternalCallId(KNOWN_CALL.to_string())).await
            .expect("lookup")
            .expect("call")
            .customer_id
            .is_none());
    }

    #[tokio::test]
    async fn unknown_call_id_never_fails_any_function() {
        let harness = Harness::new().await;

        for (name, args) in [
            ("save_customer_info", json!({ "customer_name": "Ana Silva" })),
            ("create_task", json!({ "title": "Call back" })),
            ("check_availability", json!({ "date": "2025-06-10" })),
            ("book_appointment", json!({ "start_time": "2025-06-10T14:00:00-04:00" })),
        ] {
            let (status, _headers, payload) = post_json(
                app(harness.state()),
                json!({ "call_id": UNKNOWN_CALL, "agent_id": "agent-1", "name": name, "args": args }),
            )
            .await;

            assert_eq!(status, StatusCode::OK, "{name}");
            let result = payload["result"].as_str().expect("result string");
            assert!(!result.is_empty(), "{name}");
        }
    }

    async fn explode() -> Json<ToolCallResponse> {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn panics_become_internal_errors_with_cors() {
        let app = with_envelope(Router::new().route(TOOL_CALL_PATH, post(explode)));
        let (status, headers, payload) = post_json(app, json!({})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&headers);
        assert_eq!(payload, json!({ "result": "I'm having a moment, let me continue." }));
    }

    #[tokio::test]
    async fn sqlite_backed_webhook_creates_and_links_a_customer() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        DemoTenantSeed::load(&pool, &DemoProviderSettings::default()).await.expect("seed");

        let config = AppConfig::default();
        let state =
            VoiceState::from_pool(pool.clone(), Arc::new(StubProvider::failing()), &config);

        let (status, _headers, payload) = post_json(
            app(state),
            json!({
                "call_id": DEMO_EXTERNAL_CALL_ID,
                "agent_id": "agent-1",
                "name": "save_customer_info",
                "args": { "customer_name": "Ana Silva", "customer_email": "ana@example.com" }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["result"], "Thank you, Ana. I've created your profile in our system.");

        let call = SqlCallRecordRepository::new(pool.clone())
            .find_by_external_id(&ExternalCallId(DEMO_EXTERNAL_CALL_ID.to_string()))
            .await
            .expect("lookup")
            .expect("call");
        let customer_id = call.customer_id.expect("linked");
        let customer = SqlCustomerRepository::new(pool)
            .find_by_id(&customer_id)
            .await
            .expect("customer lookup")
            .expect("customer");
        assert_eq!(customer.organization_id, OrganizationId("org-demo".to_string()));
        assert_eq!(customer.email.as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn sqlite_backed_booking_past_year_9999_is_refused_without_a_row() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        DemoTenantSeed::load(&pool, &DemoProviderSettings::default()).await.expect("seed");

        let config = AppConfig::default();
        let state =
            VoiceState::from_pool(pool.clone(), Arc::new(StubProvider::failing()), &config);

        let (status, _headers, payload) = post_json(
            app(state),
            json!({
                "call_id": DEMO_EXTERNAL_CALL_ID,
                "agent_id": "agent-1",
                "name": "book_appointment",
                "args": { "start_time": "9999-12-31T23:45:00Z" }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["result"], FallbackPhrase::BookingNeedsStartTime.text());

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM calendar_event")
            .fetch_one(&pool)
            .await
            .expect("count events");
        assert_eq!(rows, 0);
    }
}
