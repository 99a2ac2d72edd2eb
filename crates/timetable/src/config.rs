//! CLI configuration: thin layer over `timetable_config`.
//!
//! Loads the shared config and applies `GlobalOpts` flag overrides before
//! validation, so a bad `--url` is reported the same way as a bad file.

use secrecy::SecretString;

use timetable_core::BackendConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use timetable_config::{Config, config_path, load_config, save_config};

/// Effective file + environment config with command-line overrides applied.
pub fn effective_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config()?;

    if let Some(ref url) = global.url {
        cfg.api.base_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.api.timeout = timeout;
    }
    if let Some(page_size) = global.page_size {
        cfg.paging.page_size = page_size;
    }
    if global.insecure {
        cfg.api.insecure = true;
    }
    Ok(cfg)
}

/// Build the runtime `BackendConfig`. `--token` beats any configured token.
pub fn resolve_backend(global: &GlobalOpts) -> Result<BackendConfig, CliError> {
    let mut backend = effective_config(global)?.to_backend_config()?;

    if let Some(token) = global.token.as_deref().filter(|t| !t.trim().is_empty()) {
        backend.access_token = Some(SecretString::from(token.to_owned()));
    }
    Ok(backend)
}
