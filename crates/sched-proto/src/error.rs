//! Error types for the sched-proto crate.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode a message.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a message.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// A textual value could not be parsed into its typed form.
    #[error("invalid {what}: {value}")]
    InvalidValue {
        /// Kind of value being parsed.
        what: &'static str,
        /// The rejected input.
        value: String,
    },
}
