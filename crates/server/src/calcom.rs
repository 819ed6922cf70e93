//! Cal.com v1 REST client.
//!
//! The API key travels as a query parameter, so request URLs are stripped from every error
//! before it is logged.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, SecondsFormat};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;

use frontdesk_core::config::CalendarProviderConfig;
use frontdesk_core::domain::customer::DEFAULT_CUSTOMER_NAME;
use frontdesk_core::domain::provider_settings::ProviderCredentials;
use frontdesk_core::scheduling::{
    CalendarProvider, ProviderAvailability, ProviderBooking, ProviderError,
};

#[derive(Clone)]
pub struct CalcomClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingBody<'a> {
    event_type_id: Value,
    start: String,
    end: String,
    name: &'a str,
    email: &'a str,
    time_zone: &'a str,
}

impl CalcomClient {
    pub fn new(config: &CalendarProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ProviderError::Transport(error.without_url().to_string()))?;

        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

/// Cal.com expects a numeric event type id; anything else is passed through verbatim.
fn event_type_value(raw: &str) -> Value {
    raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(raw))
}

fn transport(error: reqwest::Error) -> ProviderError {
    ProviderError::Transport(error.without_url().to_string())
}

async fn read_json(response: reqwest::Response) -> Result<Value, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status { status: status.as_u16(), body });
    }
    response.json::<Value>().await.map_err(|error| ProviderError::Decode(error.without_url().to_string()))
}

#[async_trait]
impl CalendarProvider for CalcomClient {
    async fn availability(
        &self,
        credentials: &ProviderCredentials,
        date: NaiveDate,
    ) -> Result<ProviderAvailability, ProviderError> {
        let day = date.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(self.endpoint("availability"))
            .query(&[
                ("apiKey", credentials.api_key.expose_secret()),
                ("eventTypeId", credentials.event_type_id.as_str()),
                ("dateFrom", day.as_str()),
                ("dateTo", day.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?;

        let body = read_json(response).await?;
        ProviderAvailability::from_json(&body)
    }

    async fn create_booking(
        &self,
        credentials: &ProviderCredentials,
        booking: &ProviderBooking,
    ) -> Result<String, ProviderError> {
        let name = if booking.attendee_name.trim().is_empty() {
            DEFAULT_CUSTOMER_NAME
        } else {
            booking.attendee_name.as_str()
        };
        let body = BookingBody {
            event_type_id: event_type_value(&credentials.event_type_id),
            start: booking.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end: booking.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            name,
            email: &booking.attendee_email,
            time_zone: booking.time_zone.name(),
        };

        let response = self
            .client
            .post(self.endpoint("bookings"))
            .query(&[("apiKey", credentials.api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let payload = read_json(response).await?;
        booking_reference(&payload)
            .ok_or_else(|| ProviderError::Decode("booking response has neither uid nor id".to_string()))
    }
}

fn booking_reference(payload: &Value) -> Option<String> {
    ["uid", "id"].iter().find_map(|field| match payload.get(*field)? {
        Value::String(value) if !value.is_empty() => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    })
}
