//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `ConfigError` and failed page loads into user-facing
//! errors with actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use timetable_config::ConfigError;
use timetable_core::{CoreError, ErrorKind};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the backend: {reason}")]
    #[diagnostic(
        code(timetable::connection_failed),
        help(
            "Check that the backend is running and the URL is right.\n\
             Override it with --url or TIMETABLE_URL."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(timetable::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(timetable::auth_failed),
        help("Pass a valid token with --token, TIMETABLE_TOKEN, or api.access_token_env.")
    )]
    AuthFailed { message: String },

    // ── Loading ──────────────────────────────────────────────────────

    #[error("Failed to load {resource} list: {kind}")]
    #[diagnostic(code(timetable::load_failed), help("{hint}"))]
    LoadFailed {
        resource: String,
        kind: ErrorKind,
        hint: &'static str,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(timetable::not_found))]
    NotFound { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(timetable::api_error))]
    Api { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(timetable::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(timetable::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(timetable::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(timetable::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Render(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::LoadFailed { kind, .. } => match kind {
                ErrorKind::NetworkFailure => exit_code::CONNECTION,
                ErrorKind::TimeoutFailure => exit_code::TIMEOUT,
                ErrorKind::SourceInvalidated | ErrorKind::UnexpectedFailure => exit_code::GENERAL,
            },
            Self::Validation { .. }
            | Self::ConfigExists { .. }
            | Self::Config(ConfigError::Validation { .. })
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn load_failed(resource: &str, kind: ErrorKind) -> Self {
        Self::LoadFailed {
            resource: resource.to_owned(),
            kind,
            hint: kind.user_message(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network { reason } => CliError::ConnectionFailed { reason },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Api {
                message,
                status: Some(404),
            } => CliError::NotFound { message },
            CoreError::Api { message, .. } => CliError::Api { message },
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "url".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
