// ── Runtime backend configuration ──
//
// Describes how to reach the timetable backend and how lists page.
// Carries credential data but never touches disk: the CLI builds a
// `BackendConfig` (usually via `timetable-config`) and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::paging::PagerConfig;

/// Configuration for one backend connection.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API root, e.g. `http://localhost:8080/api/`.
    pub url: Url,
    /// Bearer token, when the backend requires one.
    pub access_token: Option<SecretString>,
    /// Request timeout.
    pub timeout: Duration,
    /// Skip TLS verification (self-signed dev servers).
    pub accept_invalid_certs: bool,
    /// Page size, prefetch distance and refresh policy for every list.
    pub paging: PagerConfig,
}

impl BackendConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            access_token: None,
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            paging: PagerConfig::default(),
        }
    }
}
