use std::env;
use std::sync::{Mutex, OnceLock};

use frontdesk_cli::commands::{doctor, migrate, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("FRONTDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_unknown_timezone() {
    with_env(
        &[
            ("FRONTDESK_DATABASE_URL", "sqlite::memory:"),
            ("FRONTDESK_SCHEDULING_TIMEZONE", "Mars/Olympus_Mons"),
        ],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 2, "expected config validation failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "migrate");
            assert_eq!(payload["status"], "error");
            assert_eq!(payload["error_class"], "config_validation");
        },
    );
}

#[test]
fn seed_reports_demo_call_without_provider_credentials() {
    with_env(&[("FRONTDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("call_id `demo-call-1`"), "unexpected message: {message}");
        assert!(message.contains("external calendar not configured"));
    });
}

#[test]
fn seed_marks_provider_configured_when_credentials_are_present() {
    with_env(
        &[
            ("FRONTDESK_DATABASE_URL", "sqlite::memory:"),
            ("FRONTDESK_SEED_CALCOM_API_KEY", "cal_test_key"),
            ("FRONTDESK_SEED_CALCOM_EVENT_TYPE_ID", "42"),
        ],
        || {
            let result = seed::run();
            assert_eq!(result.exit_code, 0, "expected seed success");

            let payload = parse_payload(&result.output);
            let message = payload["message"].as_str().unwrap_or_default();
            assert!(message.ends_with("external calendar configured"), "unexpected: {message}");
            assert!(!message.contains("cal_test_key"));
        },
    );
}

#[test]
fn seed_is_idempotent_on_a_file_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("seed.db").display());

    with_env(&[("FRONTDESK_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);

        assert_eq!(second_payload["status"], "ok");
        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn doctor_json_passes_with_valid_env() {
    with_env(&[("FRONTDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "expected doctor pass: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");

        let names: Vec<&str> = payload["checks"]
            .as_array()
            .expect("checks array")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(names, ["config_validation", "scheduling_window", "database_connectivity"]);
        assert!(payload["checks"][2]["details"]
            .as_str()
            .unwrap_or_default()
            .contains("run `frontdesk migrate`"));
    });
}

#[test]
fn doctor_fails_and_skips_dependent_checks_on_invalid_config() {
    with_env(
        &[
            ("FRONTDESK_DATABASE_URL", "sqlite::memory:"),
            ("FRONTDESK_SCHEDULING_BUSINESS_START", "18:00"),
            ("FRONTDESK_SCHEDULING_BUSINESS_END", "09:00"),
        ],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 1);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["overall_status"], "fail");
            assert_eq!(payload["checks"][0]["status"], "fail");
            assert_eq!(payload["checks"][1]["status"], "skipped");
            assert_eq!(payload["checks"][2]["status"], "skipped");
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "FRONTDESK_DATABASE_URL",
        "FRONTDESK_DB_URL",
        "FRONTDESK_DATABASE_MAX_CONNECTIONS",
        "FRONTDESK_DATABASE_TIMEOUT_SECS",
        "FRONTDESK_SERVER_BIND_ADDRESS",
        "FRONTDESK_SERVER_PORT",
        "FRONTDESK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "FRONTDESK_CALENDAR_PROVIDER_BASE_URL",
        "FRONTDESK_CALENDAR_PROVIDER_TIMEOUT_SECS",
        "FRONTDESK_CALENDAR_PROVIDER_BOOKING_TIMEZONE",
        "FRONTDESK_SCHEDULING_TIMEZONE",
        "FRONTDESK_SCHEDULING_BUSINESS_START",
        "FRONTDESK_SCHEDULING_BUSINESS_END",
        "FRONTDESK_SCHEDULING_SLOT_GRANULARITY_MINUTES",
        "FRONTDESK_SCHEDULING_DEFAULT_DURATION_MINUTES",
        "FRONTDESK_SCHEDULING_MAX_SPOKEN_SLOTS",
        "FRONTDESK_LOGGING_LEVEL",
        "FRONTDESK_LOGGING_FORMAT",
        "FRONTDESK_LOG_LEVEL",
        "FRONTDESK_LOG_FORMAT",
        "FRONTDESK_SEED_CALCOM_API_KEY",
        "FRONTDESK_SEED_CALCOM_EVENT_TYPE_ID",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
