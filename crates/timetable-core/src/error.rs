// ── Core error types ──
//
// Two layers. `ErrorKind` is the closed taxonomy the paging engine
// publishes in its load state; it is `Copy` so it can sit inside every
// snapshot. `CoreError` carries the detail for mutations (save/delete)
// and config validation. Consumers never see raw HTTP or JSON errors.

use thiserror::Error;

/// Closed classification of a failed page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    #[error("network failure")]
    NetworkFailure,

    #[error("request timed out")]
    TimeoutFailure,

    /// The paging source was invalidated before or during the fetch.
    #[error("paging source invalidated")]
    SourceInvalidated,

    #[error("unexpected failure")]
    UnexpectedFailure,
}

impl ErrorKind {
    /// Short text suitable for showing to an operator.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::NetworkFailure => "Could not reach the server. Check your connection and try again.",
            Self::TimeoutFailure => "The server took too long to respond. Try again later.",
            Self::SourceInvalidated => "The list changed while loading. Reloading.",
            Self::UnexpectedFailure => "Something went wrong. Try again later.",
        }
    }
}

impl From<&timetable_api::Error> for ErrorKind {
    fn from(err: &timetable_api::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutFailure
        } else if err.is_network() {
            Self::NetworkFailure
        } else {
            Self::UnexpectedFailure
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach server: {reason}")]
    Network { reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Classify this error in the paging taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::NetworkFailure,
            Self::Timeout { .. } => ErrorKind::TimeoutFailure,
            _ => ErrorKind::UnexpectedFailure,
        }
    }

    /// Message for the operator: validation and API messages are shown
    /// verbatim, everything else falls back to the generic kind text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } | Self::Api { message, .. } => message.clone(),
            Self::AuthenticationFailed { message } => format!("Authentication failed: {message}"),
            other => other.kind().user_message().to_owned(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<timetable_api::Error> for CoreError {
    fn from(err: timetable_api::Error) -> Self {
        match err {
            timetable_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            timetable_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            timetable_api::Error::Transport(ref e) if e.is_connect() || e.is_request() || e.is_body() => {
                CoreError::Network {
                    reason: e.to_string(),
                }
            }
            timetable_api::Error::Transport(e) => CoreError::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            timetable_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            timetable_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            timetable_api::Error::ClientConfig(message) => CoreError::Config { message },
            timetable_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
