use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use frontdesk_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in effective_values(&config) {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<ConfigEntry> {
    vec![
        entry("database.url", redact_url(&config.database.url), &["FRONTDESK_DATABASE_URL"]),
        entry(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["FRONTDESK_DATABASE_MAX_CONNECTIONS"],
        ),
        entry(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["FRONTDESK_DATABASE_TIMEOUT_SECS"],
        ),
        entry(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["FRONTDESK_SERVER_BIND_ADDRESS"],
        ),
        entry("server.port", config.server.port.to_string(), &["FRONTDESK_SERVER_PORT"]),
        entry(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["FRONTDESK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        entry(
            "calendar_provider.base_url",
            redact_url(&config.calendar_provider.base_url),
            &["FRONTDESK_CALENDAR_PROVIDER_BASE_URL"],
        ),
        entry(
            "calendar_provider.timeout_secs",
            config.calendar_provider.timeout_secs.to_string(),
            &["FRONTDESK_CALENDAR_PROVIDER_TIMEOUT_SECS"],
        ),
        entry(
            "calendar_provider.booking_timezone",
            config.calendar_provider.booking_timezone.name().to_string(),
            &["FRONTDESK_CALENDAR_PROVIDER_BOOKING_TIMEZONE"],
        ),
        entry(
            "scheduling.timezone",
            config.scheduling.timezone.name().to_string(),
            &["FRONTDESK_SCHEDULING_TIMEZONE"],
        ),
        entry(
            "scheduling.business_start",
            config.scheduling.business_start.format("%H:%M").to_string(),
            &["FRONTDESK_SCHEDULING_BUSINESS_START"],
        ),
        entry(
            "scheduling.business_end",
            config.scheduling.business_end.format("%H:%M").to_string(),
            &["FRONTDESK_SCHEDULING_BUSINESS_END"],
        ),
        entry(
            "scheduling.slot_granularity_minutes",
            config.scheduling.slot_granularity_minutes.to_string(),
            &["FRONTDESK_SCHEDULING_SLOT_GRANULARITY_MINUTES"],
        ),
        entry(
            "scheduling.default_duration_minutes",
            config.scheduling.default_duration_minutes.to_string(),
            &["FRONTDESK_SCHEDULING_DEFAULT_DURATION_MINUTES"],
        ),
        entry(
            "scheduling.max_spoken_slots",
            config.scheduling.max_spoken_slots.to_string(),
            &["FRONTDESK_SCHEDULING_MAX_SPOKEN_SLOTS"],
        ),
        entry(
            "logging.level",
            config.logging.level.clone(),
            &["FRONTDESK_LOGGING_LEVEL", "FRONTDESK_LOG_LEVEL"],
        ),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["FRONTDESK_LOGGING_FORMAT", "FRONTDESK_LOG_FORMAT"],
        ),
    ]
}

type ConfigEntry = (&'static str, String, &'static [&'static str]);

fn entry(key: &'static str, value: String, env_keys: &'static [&'static str]) -> ConfigEntry {
    (key, value, env_keys)
}

fn detect_config_path() -> Option<PathBuf> {
    ["frontdesk.toml", "config/frontdesk.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Masks userinfo and query strings, where credentials tend to hide in URLs.
fn redact_url(url: &str) -> String {
    let (base, query) = match url.split_once('?') {
        Some((base, _)) => (base, "?<redacted>"),
        None => (url, ""),
    };
    let base = match base.split_once("://") {
        Some((scheme, rest)) => match rest.split_once('@') {
            Some((_, host)) => format!("{scheme}://<redacted>@{host}"),
            None => base.to_string(),
        },
        None => base.to_string(),
    };
    format!("{base}{query}")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_url};

    #[test]
    fn url_credentials_are_redacted() {
        assert_eq!(redact_url("https://api.cal.com/v1"), "https://api.cal.com/v1");
        assert_eq!(
            redact_url("https://user:pw@cal.internal/v1?apiKey=cal_live"),
            "https://<redacted>@cal.internal/v1?<redacted>"
        );
        assert_eq!(redact_url("sqlite::memory:"), "sqlite::memory:");
    }

    #[test]
    fn nested_keys_are_found_in_config_file() {
        let doc = "[scheduling]\ntimezone = \"America/Vancouver\"\n"
            .parse::<Value>()
            .expect("toml");
        assert!(contains_path(&doc, "scheduling.timezone"));
        assert!(!contains_path(&doc, "scheduling.business_start"));
    }
}
