//! CLI error types and their process exit codes.

use std::process::ExitCode;

use sched_proto::ctl::error_codes;
use thiserror::Error;

/// Process exit codes. The exit code is the only machine-readable outcome.
pub mod exit_codes {
    /// Every step succeeded (including "not found" query results).
    pub const SUCCESS: u8 = 0;
    /// Local failure unrelated to the request (stdout closed, encoding).
    pub const GENERIC: u8 = 1;
    /// Malformed or conflicting arguments, bad configuration.
    pub const USAGE: u8 = 2;
    /// The remote call could not be completed.
    pub const TRANSPORT: u8 = 3;
    /// The daemon refused the request (mutation rejected, permission denied).
    pub const REJECTED: u8 = 4;
    /// The daemon returned an inconsistent query reply.
    pub const BACKEND: u8 = 5;
}

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid arguments, detected before any remote call.
    #[error("invalid argument: {0}")]
    Usage(String),

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection to the daemon failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The daemon did not answer in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Unexpected or undecodable message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The daemon answered with a protocol-level error.
    #[error("daemon error {code}: {message}")]
    Remote {
        /// Daemon error code.
        code: u32,
        /// Daemon error message.
        message: String,
    },

    /// The daemon rejected the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// A query reply reported failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// A multi-attribute modification stopped part way.
    #[error("{}", partial_message(.attribute, .applied, .source))]
    Modify {
        /// Attribute whose call failed.
        attribute: String,
        /// Attributes applied before the failure, in order.
        applied: Vec<String>,
        /// Underlying failure.
        source: Box<CliError>,
    },

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn partial_message(attribute: &str, applied: &[String], source: &CliError) -> String {
    if applied.is_empty() {
        format!("modifying {attribute} failed: {source}")
    } else {
        format!(
            "modifying {attribute} failed: {source} (already applied: {})",
            applied.join(", ")
        )
    }
}

impl CliError {
    /// Exit code for this error kind.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) | Self::Config(_) => exit_codes::USAGE,
            Self::Remote {
                code: error_codes::PERMISSION_DENIED,
                ..
            }
            | Self::Rejected(_) => exit_codes::REJECTED,
            Self::Connection(_) | Self::Timeout(_) | Self::Protocol(_) | Self::Remote { .. } => {
                exit_codes::TRANSPORT
            }
            Self::Backend(_) => exit_codes::BACKEND,
            Self::Modify { source, .. } => source.exit_code(),
            Self::Format(_) | Self::Io(_) => exit_codes::GENERIC,
        }
    }
}

impl From<&CliError> for ExitCode {
    fn from(err: &CliError) -> Self {
        Self::from(err.exit_code())
    }
}

impl From<sched_proto::ProtoError> for CliError {
    fn from(err: sched_proto::ProtoError) -> Self {
        match err {
            sched_proto::ProtoError::InvalidValue { .. } => Self::Usage(err.to_string()),
            other => Self::Protocol(other.to_string()),
        }
    }
}
