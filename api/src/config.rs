use std::time::Duration;

use crate::utils::split_list;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Env {
    Dev,
    Staging,
    Production,
}

impl Env {
    /// Read before the tracing subscriber exists, so it must not log.
    pub fn from_env() -> Self {
        match std::env::var("ENVIRONMENT").as_deref() {
            Ok("staging") => Env::Staging,
            Ok("production") => Env::Production,
            _ => Env::Dev,
        }
    }
}

pub struct ServerConfig {
    pub env: Env,
    pub database_url: String,
    pub port: u16,
    pub site_url: String,
    pub owner_identity_id: i32,
    pub cors_origins: Vec<String>,
    pub telegram: Option<TelegramConfig>,
    pub vk: Option<VkConfig>,
    pub smartcaptcha_server_key: Option<String>,
    pub notify_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub channel_id: String,
}

#[derive(Clone, Debug)]
pub struct VkConfig {
    pub access_token: String,
    pub group_id: String,
}

const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

fn var(key: &str) -> Result<Option<String>, String> {
    match std::env::var(key) {
        Ok(env) if env.trim().is_empty() => Ok(None),
        Ok(env) => Ok(Some(env)),
        Err(e) => match e {
            std::env::VarError::NotPresent => {
                tracing::debug!("Missing environment variable `{key}`");
                Ok(None)
            }
            std::env::VarError::NotUnicode(_) => Err(format!(
                "Could not get the environment variable `{key}` due to unicode error"
            )),
        },
    }
}

fn required_var(key: &str) -> String {
    match var(key) {
        Ok(Some(val)) => val,
        Ok(None) => {
            tracing::error!("Environment variable `{key}` is required");
            std::process::exit(1)
        }
        Err(e) => {
            tracing::error!("Environment variable `{key}` is required, but could not retrieve: {e}");
            std::process::exit(1)
        }
    }
}

fn parsed_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match var(key) {
        Ok(Some(val)) => val.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Environment variable `{key}` has an invalid value `{val}`, using default");
            default
        }),
        _ => default,
    }
}

/// Either all or none variables are set
fn all_or_none_vars(keys: Vec<&str>) -> Option<Vec<String>> {
    let values: Vec<Option<String>> = keys.iter().map(|k| var(k).ok().flatten()).collect();

    if values.iter().all(Option::is_some) {
        return Some(values.into_iter().flatten().collect());
    }

    if values.iter().any(Option::is_some) {
        tracing::error!(
            "Environment variables {keys:?} must be set together, ignoring the partial configuration"
        );
    }

    None
}

impl ServerConfig {
    pub fn new_from_env() -> Self {
        let telegram = all_or_none_vars(vec!["TELEGRAM_BOT_TOKEN", "TELEGRAM_CHANNEL_ID"]).map(
            |mut vars| TelegramConfig {
                bot_token: vars.remove(0),
                channel_id: vars.remove(0),
            },
        );

        let vk = all_or_none_vars(vec!["VK_ACCESS_TOKEN", "VK_GROUP_ID"]).map(|mut vars| {
            VkConfig {
                access_token: vars.remove(0),
                group_id: vars.remove(0),
            }
        });

        let cors_origins = var("CORS_ORIGINS")
            .ok()
            .flatten()
            .map(|origins| split_list(&origins, ','))
            .unwrap_or_default();

        ServerConfig {
            env: Env::from_env(),
            database_url: required_var("DATABASE_URL"),
            port: parsed_var("PORT", 3000),
            site_url: var("SITE_URL")
                .ok()
                .flatten()
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "http://localhost:4321".to_string()),
            owner_identity_id: parsed_var("OWNER_IDENTITY_ID", 1),
            cors_origins,
            telegram,
            vk,
            smartcaptcha_server_key: var("SMARTCAPTCHA_SERVER_KEY").ok().flatten(),
            notify_timeout: Duration::from_secs(parsed_var(
                "NOTIFY_TIMEOUT_SECS",
                DEFAULT_NOTIFY_TIMEOUT.as_secs(),
            )),
        }
    }
}
