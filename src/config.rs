//! Application configuration
//!
//! Sources, later ones winning: built-in defaults, `config/default.toml`,
//! `config/<CLINIC_ENV>.toml`, then `CLINIC_*` environment variables with
//! `__` between nested keys (e.g. `CLINIC_AUTH__SESSION_TIMEOUT_MS`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::guard::AuthTimeoutPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunEnvironment {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Rest,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: RunEnvironment,
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub local_state: LocalStateConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub session_timeout_ms: u64,
    /// Overrides the environment default when set.
    pub on_timeout: Option<AuthTimeoutPolicy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalStateConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    pub json: bool,
}

impl AppConfig {
    /// Timeout policy fixed for the life of the process.
    pub fn auth_timeout_policy(&self) -> AuthTimeoutPolicy {
        self.auth.on_timeout.unwrap_or(match self.environment {
            RunEnvironment::Development => AuthTimeoutPolicy::FailOpen,
            RunEnvironment::Production => AuthTimeoutPolicy::FailClosed,
        })
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.auth.session_timeout_ms)
    }
}

/// Load configuration from `./config` using `CLINIC_ENV` to pick the overlay.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let env = std::env::var("CLINIC_ENV").unwrap_or_else(|_| "development".into());
    load_config_from(Path::new("config"), &env)
}

pub fn load_config_from(dir: &Path, env: &str) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .set_default("environment", env)?
        .set_default("backend.kind", "memory")?
        .set_default("backend.url", "http://localhost:54321")?
        .set_default("backend.anon_key", "")?
        .set_default("auth.session_timeout_ms", 5000)?
        .set_default("local_state.path", ".clinic-desk/state.json")?
        .set_default("logging.filter", "info")?
        .set_default("logging.json", false)?
        .add_source(File::from(dir.join("default")).required(false))
        .add_source(File::from(dir.join(env)).required(false))
        .add_source(
            Environment::with_prefix("CLINIC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("clinic-desk-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn defaults_apply_without_files() {
        let dir = temp_dir();
        let config = load_config_from(&dir, "development").unwrap();
        assert_eq!(config.environment, RunEnvironment::Development);
        assert_eq!(config.session_timeout(), Duration::from_millis(5000));
        assert_eq!(config.auth_timeout_policy(), AuthTimeoutPolicy::FailOpen);
        assert_eq!(config.backend.kind, BackendKind::Memory);
    }

    #[test]
    fn production_overlay_fails_closed() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("production.toml"),
            "[backend]\nkind = \"rest\"\nurl = \"https://clinic.example.com\"\n",
        )
        .unwrap();
        let config = load_config_from(&dir, "production").unwrap();
        assert_eq!(config.environment, RunEnvironment::Production);
        assert_eq!(config.backend.kind, BackendKind::Rest);
        assert_eq!(config.auth_timeout_policy(), AuthTimeoutPolicy::FailClosed);
    }

    #[test]
    fn explicit_policy_overrides_environment_default() {
        let dir = temp_dir();
        std::fs::write(dir.join("default.toml"), "[auth]\non_timeout = \"fail-closed\"\n").unwrap();
        let config = load_config_from(&dir, "development").unwrap();
        assert_eq!(config.auth_timeout_policy(), AuthTimeoutPolicy::FailClosed);
    }
}
