use std::env;

use frontdesk_db::{DemoProviderSettings, DemoTenantSeed, SeedResult};
use secrecy::SecretString;

use crate::commands::{load_config, migrated_pool, runtime, CommandResult};

pub const SEED_API_KEY_ENV: &str = "FRONTDESK_SEED_CALCOM_API_KEY";
pub const SEED_EVENT_TYPE_ENV: &str = "FRONTDESK_SEED_CALCOM_EVENT_TYPE_ID";

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };
    let provider = provider_from_env();

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;
        let seeded = DemoTenantSeed::load(&pool, &provider)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8));
        pool.close().await;
        seeded
    });

    match result {
        Ok(seed) => CommandResult::success("seed", summary(&seed)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn provider_from_env() -> DemoProviderSettings {
    let non_blank = |key: &str| env::var(key).ok().filter(|value| !value.trim().is_empty());
    DemoProviderSettings {
        api_key: non_blank(SEED_API_KEY_ENV).map(SecretString::from),
        event_type_id: non_blank(SEED_EVENT_TYPE_ENV),
    }
}

fn summary(seed: &SeedResult) -> String {
    let provider = if seed.provider_configured {
        "external calendar configured"
    } else {
        "external calendar not configured; availability uses the internal calendar"
    };
    format!(
        "demo tenant `{}` ready (owner `{}`); send tool calls with call_id `{}`; {provider}",
        seed.organization_id, seed.owner_user_id, seed.external_call_id
    )
}
