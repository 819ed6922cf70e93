use secrecy::{ExposeSecret, SecretString};

use crate::domain::call::OrganizationId;

/// Per-tenant external calendar settings. Either field may be missing; only a complete pair
/// enables the external provider.
#[derive(Clone, Debug)]
pub struct ExternalCalendarSettings {
    pub organization_id: OrganizationId,
    pub api_key: Option<SecretString>,
    pub default_event_type_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ProviderCredentials {
    pub api_key: SecretString,
    pub event_type_id: String,
}

impl ExternalCalendarSettings {
    pub fn credentials(&self) -> Option<ProviderCredentials> {
        let api_key = self.api_key.as_ref().filter(|key| !key.expose_secret().trim().is_empty())?;
        let event_type_id = self
            .default_event_type_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())?;

        Some(ProviderCredentials { api_key: api_key.clone(), event_type_id: event_type_id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::{ExposeSecret, SecretString};

    use super::ExternalCalendarSettings;
    use crate::domain::call::OrganizationId;

    fn settings(api_key: Option<&str>, event_type: Option<&str>) -> ExternalCalendarSettings {
        ExternalCalendarSettings {
            organization_id: OrganizationId("ORG-1".to_string()),
            api_key: api_key.map(|key| SecretString::from(key.to_string())),
            default_event_type_id: event_type.map(str::to_string),
        }
    }

    #[test]
    fn complete_settings_yield_credentials() {
        let credentials = settings(Some("cal_live_123"), Some(" 42 ")).credentials().expect("creds");
        assert_eq!(credentials.api_key.expose_secret(), "cal_live_123");
        assert_eq!(credentials.event_type_id, "42");
    }

    #[test]
    fn partial_settings_disable_the_provider() {
        assert!(settings(Some("cal_live_123"), None).credentials().is_none());
        assert!(settings(None, Some("42")).credentials().is_none());
        assert!(settings(Some("  "), Some("42")).credentials().is_none());
        assert!(settings(Some("cal_live_123"), Some("")).credentials().is_none());
    }
}
