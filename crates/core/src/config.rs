use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub calendar_provider: CalendarProviderConfig,
    pub scheduling: SchedulingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Process-wide settings for the external calendar provider. Per-tenant credentials live in the
/// database; this only controls where and how long we talk to the provider.
#[derive(Clone, Debug)]
pub struct CalendarProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub booking_timezone: Tz,
}

#[derive(Clone, Debug)]
pub struct SchedulingConfig {
    /// Timezone of the business window and of every spoken date/time.
    pub timezone: Tz,
    pub business_start: NaiveTime,
    pub business_end: NaiveTime,
    pub slot_granularity_minutes: u32,
    pub default_duration_minutes: u32,
    pub max_spoken_slots: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub calendar_provider_base_url: Option<String>,
    pub calendar_provider_timeout_secs: Option<u64>,
    pub scheduling_timezone: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Toronto;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://frontdesk.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            calendar_provider: CalendarProviderConfig {
                base_url: "https://api.cal.com/v1".to_string(),
                timeout_secs: 5,
                booking_timezone: DEFAULT_TIMEZONE,
            },
            scheduling: SchedulingConfig {
                timezone: DEFAULT_TIMEZONE,
                business_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
                business_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
                slot_granularity_minutes: 30,
                default_duration_minutes: 30,
                max_spoken_slots: 4,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("frontdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(provider) = patch.calendar_provider {
            if let Some(base_url) = provider.base_url {
                self.calendar_provider.base_url = base_url;
            }
            if let Some(timeout_secs) = provider.timeout_secs {
                self.calendar_provider.timeout_secs = timeout_secs;
            }
            if let Some(booking_timezone) = provider.booking_timezone {
                self.calendar_provider.booking_timezone =
                    parse_timezone("calendar_provider.booking_timezone", &booking_timezone)?;
            }
        }

        if let Some(scheduling) = patch.scheduling {
            if let Some(timezone) = scheduling.timezone {
                self.scheduling.timezone = parse_timezone("scheduling.timezone", &timezone)?;
            }
            if let Some(business_start) = scheduling.business_start {
                self.scheduling.business_start =
                    parse_clock_time("scheduling.business_start", &business_start)?;
            }
            if let Some(business_end) = scheduling.business_end {
                self.scheduling.business_end =
                    parse_clock_time("scheduling.business_end", &business_end)?;
            }
            if let Some(granularity) = scheduling.slot_granularity_minutes {
                self.scheduling.slot_granularity_minutes = granularity;
            }
            if let Some(duration) = scheduling.default_duration_minutes {
                self.scheduling.default_duration_minutes = duration;
            }
            if let Some(max_spoken_slots) = scheduling.max_spoken_slots {
                self.scheduling.max_spoken_slots = max_spoken_slots;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FRONTDESK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("FRONTDESK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("FRONTDESK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("FRONTDESK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("FRONTDESK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FRONTDESK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FRONTDESK_SERVER_PORT") {
            self.server.port = parse_u16("FRONTDESK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("FRONTDESK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("FRONTDESK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("FRONTDESK_CALENDAR_PROVIDER_BASE_URL") {
            self.calendar_provider.base_url = value;
        }
        if let Some(value) = read_env("FRONTDESK_CALENDAR_PROVIDER_TIMEOUT_SECS") {
            self.calendar_provider.timeout_secs =
                parse_u64("FRONTDESK_CALENDAR_PROVIDER_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("FRONTDESK_CALENDAR_PROVIDER_BOOKING_TIMEZONE") {
            self.calendar_provider.booking_timezone =
                parse_env_timezone("FRONTDESK_CALENDAR_PROVIDER_BOOKING_TIMEZONE", &value)?;
        }

        if let Some(value) = read_env("FRONTDESK_SCHEDULING_TIMEZONE") {
            self.scheduling.timezone = parse_env_timezone("FRONTDESK_SCHEDULING_TIMEZONE", &value)?;
        }
        if let Some(value) = read_env("FRONTDESK_SCHEDULING_BUSINESS_START") {
            self.scheduling.business_start =
                parse_env_clock_time("FRONTDESK_SCHEDULING_BUSINESS_START", &value)?;
        }
        if let Some(value) = read_env("FRONTDESK_SCHEDULING_BUSINESS_END") {
            self.scheduling.business_end =
                parse_env_clock_time("FRONTDESK_SCHEDULING_BUSINESS_END", &value)?;
        }
        if let Some(value) = read_env("FRONTDESK_SCHEDULING_SLOT_GRANULARITY_MINUTES") {
            self.scheduling.slot_granularity_minutes =
                parse_u32("FRONTDESK_SCHEDULING_SLOT_GRANULARITY_MINUTES", &value)?;
        }
        if let Some(value) = read_env("FRONTDESK_SCHEDULING_DEFAULT_DURATION_MINUTES") {
            self.scheduling.default_duration_minutes =
                parse_u32("FRONTDESK_SCHEDULING_DEFAULT_DURATION_MINUTES", &value)?;
        }
        if let Some(value) = read_env("FRONTDESK_SCHEDULING_MAX_SPOKEN_SLOTS") {
            self.scheduling.max_spoken_slots =
                parse_u32("FRONTDESK_SCHEDULING_MAX_SPOKEN_SLOTS", &value)? as usize;
        }

        let log_level =
            read_env("FRONTDESK_LOGGING_LEVEL").or_else(|| read_env("FRONTDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FRONTDESK_LOGGING_FORMAT").or_else(|| read_env("FRONTDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(base_url) = overrides.calendar_provider_base_url {
            self.calendar_provider.base_url = base_url;
        }
        if let Some(timeout_secs) = overrides.calendar_provider_timeout_secs {
            self.calendar_provider.timeout_secs = timeout_secs;
        }
        if let Some(timezone) = overrides.scheduling_timezone {
            self.scheduling.timezone = parse_timezone("scheduling.timezone", &timezone)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_calendar_provider(&self.calendar_provider)?;
        validate_scheduling(&self.scheduling)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("frontdesk.toml"), PathBuf::from("config/frontdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_calendar_provider(provider: &CalendarProviderConfig) -> Result<(), ConfigError> {
    let base_url = provider.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "calendar_provider.base_url must start with http:// or https://".to_string(),
        ));
    }

    // The provider is consulted mid-call; a slow provider must not hold the caller on the line.
    if provider.timeout_secs == 0 || provider.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "calendar_provider.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_scheduling(scheduling: &SchedulingConfig) -> Result<(), ConfigError> {
    if scheduling.business_start >= scheduling.business_end {
        return Err(ConfigError::Validation(format!(
            "scheduling.business_start ({}) must be earlier than scheduling.business_end ({})",
            scheduling.business_start.format("%H:%M"),
            scheduling.business_end.format("%H:%M"),
        )));
    }

    if scheduling.slot_granularity_minutes == 0 {
        return Err(ConfigError::Validation(
            "scheduling.slot_granularity_minutes must be greater than zero".to_string(),
        ));
    }

    if scheduling.default_duration_minutes == 0 {
        return Err(ConfigError::Validation(
            "scheduling.default_duration_minutes must be greater than zero".to_string(),
        ));
    }

    if scheduling.max_spoken_slots == 0 {
        return Err(ConfigError::Validation(
            "scheduling.max_spoken_slots must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn parse_timezone(key: &str, value: &str) -> Result<Tz, ConfigError> {
    value.trim().parse::<Tz>().map_err(|_| {
        ConfigError::Validation(format!(
            "{key} must be an IANA timezone name such as `America/Toronto`, got `{value}`"
        ))
    })
}

fn parse_clock_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        ConfigError::Validation(format!("{key} must use 24-hour `HH:MM` format, got `{value}`"))
    })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_timezone(key: &str, value: &str) -> Result<Tz, ConfigError> {
    value.trim().parse::<Tz>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_env_clock_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
    })
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    calendar_provider: Option<CalendarProviderPatch>,
    scheduling: Option<SchedulingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarProviderPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    booking_timezone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulingPatch {
    timezone: Option<String>,
    business_start: Option<String>,
    business_end: Option<String>,
    slot_granularity_minutes: Option<u32>,
    default_duration_minutes: Option<u32>,
    max_spoken_slots: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
