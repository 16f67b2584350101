use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::relay::DEFAULT_QUEUE_CAPACITY;

/// Environment variable that carries the shared access token. Setting it also
/// switches the access gate on.
pub const TOKEN_ENV_VAR: &str = "LITESHARE_TOKEN";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub heartbeat_interval_secs: u64,
    pub public_dir: String,
    pub peer_queue_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub enabled: bool,
    pub token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

fn with_defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("environment", environment)?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("relay.heartbeat_interval_secs", 30)?
        .set_default("relay.public_dir", "public")?
        .set_default("relay.peer_queue_capacity", DEFAULT_QUEUE_CAPACITY as i64)?
        .set_default("auth.enabled", false)?
        .set_default("auth.token", "secret-token")?
        .set_default("cors.enabled", true)?
        .set_default("cors.allow_any_origin", true)?
        .set_default("cors.max_age", 3600)
}

fn app_environment() -> Environment {
    Environment::with_prefix("app")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = with_defaults("development")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
            .add_source(app_environment())
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        Ok(settings.with_token_override(env::var(TOKEN_ENV_VAR).ok()))
    }

    /// Applies the `LITESHARE_TOKEN` override on top of the layered config.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.auth.token = token;
            self.auth.enabled = true;
        }
        self
    }

    /// Token the access gate compares against, if the gate is on.
    pub fn access_token(&self) -> Option<&str> {
        self.auth.enabled.then_some(self.auth.token.as_str())
    }

    pub fn new_for_test() -> Result<Self, ConfigError> {
        with_defaults("test")?
            .set_override("relay.heartbeat_interval_secs", 5)?
            .build()?
            .try_deserialize()
    }
}
