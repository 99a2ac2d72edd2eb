//! Shared configuration for timetable tools.
//!
//! One TOML file, layered under `TIMETABLE_`-prefixed environment
//! variables, translated into `timetable_core::BackendConfig`. The CLI
//! applies its flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use timetable_core::{BackendConfig, PagerConfig, RefreshPolicy};

/// Environment prefix; nested keys use `__` (`TIMETABLE_PAGING__PAGE_SIZE`).
pub const ENV_PREFIX: &str = "TIMETABLE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub paging: PagingSettings,
}

/// Where the backend lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept self-signed certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Environment variable holding the bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_env: Option<String>,

    /// Bearer token (plaintext; prefer `access_token_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            insecure: false,
            access_token_env: None,
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PagingSettings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_prefetch_distance")]
    pub prefetch_distance: usize,

    /// "reset" (clear on invalidation) or "keep" (show stale rows until
    /// the reload lands).
    #[serde(default = "default_refresh_policy")]
    pub refresh_policy: String,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            prefetch_distance: default_prefetch_distance(),
            refresh_policy: default_refresh_policy(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api/".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> usize {
    10
}
fn default_prefetch_distance() -> usize {
    20
}
fn default_refresh_policy() -> String {
    RefreshPolicy::default().to_string()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "timetable", "timetable").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("timetable");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load defaults, then the config file, then the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Like [`load_config`] with an explicit file. A missing file is not an
/// error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Bearer token from `access_token_env`, falling back to the plaintext
/// `access_token`. `None` when neither is set.
pub fn resolve_access_token(api: &ApiSettings) -> Option<SecretString> {
    if let Some(ref env_name) = api.access_token_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.trim().is_empty() {
                return Some(SecretString::from(val));
            }
        }
    }

    api.access_token
        .as_ref()
        .filter(|token| !token.trim().is_empty())
        .map(|token| SecretString::from(token.clone()))
}

// ── Translation to runtime config ───────────────────────────────────

impl Config {
    /// Validate and build the runtime `BackendConfig`.
    pub fn to_backend_config(&self) -> Result<BackendConfig, ConfigError> {
        let url: url::Url = self
            .api
            .base_url
            .parse()
            .map_err(|e| ConfigError::invalid("api.base_url", format!("{e}: {}", self.api.base_url)))?;

        if self.api.timeout == 0 {
            return Err(ConfigError::invalid("api.timeout", "must be at least 1 second"));
        }
        if self.paging.page_size == 0 {
            return Err(ConfigError::invalid("paging.page_size", "must be positive"));
        }
        let refresh_policy: RefreshPolicy = self.paging.refresh_policy.parse().map_err(|_| {
            ConfigError::invalid(
                "paging.refresh_policy",
                format!("expected 'reset' or 'keep', got '{}'", self.paging.refresh_policy),
            )
        })?;

        let mut backend = BackendConfig::new(url);
        backend.access_token = resolve_access_token(&self.api);
        backend.timeout = Duration::from_secs(self.api.timeout);
        backend.accept_invalid_certs = self.api.insecure;
        backend.paging = PagerConfig::new(self.paging.page_size, self.paging.prefetch_distance)
            .with_refresh_policy(refresh_policy);
        Ok(backend)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("absent.toml")).unwrap();
            assert_eq!(cfg, Config::default());
            assert_eq!(cfg.paging.page_size, 10);
            assert_eq!(cfg.paging.prefetch_distance, 20);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [api]
                base_url = "https://school.example/api/"

                [paging]
                page_size = 25
                refresh_policy = "keep"
                "#,
            )?;
            jail.set_env("TIMETABLE_PAGING__PAGE_SIZE", "50");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.api.base_url, "https://school.example/api/");
            assert_eq!(cfg.paging.page_size, 50);

            let backend = cfg.to_backend_config().unwrap();
            assert_eq!(backend.paging.refresh_policy, RefreshPolicy::KeepUntilLoaded);
            assert_eq!(backend.paging.prefetch_distance, 20);
            Ok(())
        });
    }

    #[test]
    fn token_env_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("SCHOOL_TOKEN", "from-env");
            let api = ApiSettings {
                access_token_env: Some("SCHOOL_TOKEN".into()),
                access_token: Some("from-file".into()),
                ..ApiSettings::default()
            };
            assert_eq!(resolve_access_token(&api).unwrap().expose_secret(), "from-env");

            let api = ApiSettings {
                access_token_env: Some("UNSET_TOKEN".into()),
                ..api
            };
            assert_eq!(resolve_access_token(&api).unwrap().expose_secret(), "from-file");
            Ok(())
        });
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut cfg = Config::default();
        cfg.paging.refresh_policy = "sometimes".into();
        assert!(matches!(
            cfg.to_backend_config(),
            Err(ConfigError::Validation { ref field, .. }) if field == "paging.refresh_policy"
        ));

        let mut cfg = Config::default();
        cfg.paging.page_size = 0;
        assert!(cfg.to_backend_config().is_err());

        let mut cfg = Config::default();
        cfg.api.base_url = "not a url".into();
        assert!(cfg.to_backend_config().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.api.base_url = "http://10.0.0.5:8080/api/".into();
        cfg.paging.page_size = 15;
        save_config_to(&cfg, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("page_size = 15"));
        assert!(!text.contains("access_token"));

        let loaded: Config = toml::from_str(&text).unwrap();
        assert_eq!(loaded, cfg);
    }
}
