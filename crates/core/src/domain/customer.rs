use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::call::OrganizationId;

pub const PHONE_LEAD_TAG: &str = "phone-lead";
pub const DEFAULT_CUSTOMER_NAME: &str = "Phone Caller";
pub const DEFAULT_CUSTOMER_STATUS: &str = "Active";
pub const DEFAULT_CUSTOMER_PRIORITY: &str = "Medium";
pub const DEFAULT_CUSTOMER_COUNTRY: &str = "CA";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub priority: String,
    pub country: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A spoken name split into first and last parts.
///
/// The first whitespace-separated token is the first name; every remaining token, joined by a
/// single space, is the last name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonName {
    pub full: String,
    pub first: String,
    pub last: String,
}

impl PersonName {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut tokens = raw.split_whitespace();
        let first = tokens.next()?.to_string();
        let last = tokens.collect::<Vec<_>>().join(" ");
        Some(Self { full: raw.trim().to_string(), first, last })
    }
}

/// Fields captured during one conversational turn. Absent fields are left untouched on update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomerPatch {
    pub name: Option<PersonName>,
    pub email: Option<String>,
}

impl CustomerPatch {
    pub fn from_spoken(name: Option<&str>, email: Option<&str>) -> Self {
        Self {
            name: name.and_then(PersonName::parse),
            email: email.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.name.as_ref().map(|name| name.first.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCustomer {
    pub organization_id: OrganizationId,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub priority: String,
    pub country: String,
    pub tags: Vec<String>,
}

impl NewCustomer {
    /// A customer first met on an inbound phone call.
    pub fn from_phone_call(
        organization_id: OrganizationId,
        patch: &CustomerPatch,
        phone: Option<&str>,
    ) -> Self {
        let name = patch.name.as_ref();
        Self {
            organization_id,
            name: name.map(|name| name.full.clone()).unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
            first_name: name.map(|name| name.first.clone()),
            last_name: name.map(|name| name.last.clone()).filter(|last| !last.is_empty()),
            email: patch.email.clone(),
            phone: phone.map(str::to_string),
            status: DEFAULT_CUSTOMER_STATUS.to_string(),
            priority: DEFAULT_CUSTOMER_PRIORITY.to_string(),
            country: DEFAULT_CUSTOMER_COUNTRY.to_string(),
            tags: vec![PHONE_LEAD_TAG.to_string()],
        }
    }
}
