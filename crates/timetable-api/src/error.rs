use thiserror::Error;

/// Top-level error type for the `timetable-api` crate.
///
/// Covers every failure mode of the REST backend: transport, timeouts,
/// rejected requests and malformed payloads. `timetable-core` folds these
/// into its closed `ErrorKind` taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The backend rejected the access token (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The HTTP client could not be built (bad header, TLS backend, ...).
    #[error("Client configuration error: {0}")]
    ClientConfig(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-success status returned by the backend.
    #[error("Backend error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request never reached the backend or the
    /// connection dropped mid-flight.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_request() || e.is_body(),
            _ => false,
        }
    }

    /// Returns `true` if this error is a timeout, whichever layer raised it.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// HTTP status code, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Authentication { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
