use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallRecordId(pub String);

/// Opaque identifier issued by the telephony/voice provider for one live call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalCallId(pub String);

impl std::fmt::Display for ExternalCallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live phone call as recorded by the telephony integration.
///
/// The customer link is the only field this service writes, and it is never cleared once set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: CallRecordId,
    pub organization_id: OrganizationId,
    pub external_call_id: ExternalCallId,
    pub customer_id: Option<CustomerId>,
    pub customer_phone: Option<String>,
}

impl CallRecord {
    pub fn is_linked(&self) -> bool {
        self.customer_id.is_some()
    }

    pub fn caller_phone(&self) -> Option<&str> {
        self.customer_phone.as_deref().map(str::trim).filter(|phone| !phone.is_empty())
    }
}
