//! Error types for countersign
//!
//! One error enum for the whole crate plus a `Result` alias. Validation of
//! user-submitted form input is not represented here; see
//! [`crate::signing::form::FieldErrors`], which is re-rendered rather than
//! propagated.

use thiserror::Error;

/// Errors produced by countersign operations
#[derive(Error, Debug)]
pub enum CountersignError {
    /// MongoDB failure, with the operation that failed in the message
    #[error("Database error: {0}")]
    Database(String),

    /// A required identity field was absent from the session context.
    /// Fatal to the calling operation; never retried.
    #[error("missing session data: {0}")]
    MissingSession(&'static str),

    /// Non-2xx response from the document API. The body is preserved
    /// verbatim for diagnostics.
    #[error("expected 2xx response but got {status}: {body}")]
    RemoteDocument { status: u16, body: String },

    /// The remote document (or a redeemable access code) does not exist.
    /// The resolving service tolerates this; every other caller treats it
    /// as an error.
    #[error("not found")]
    NotFound,

    /// A document update was requested for a draft that has not yet
    /// recorded the data the update would carry
    #[error("draft is not ready to send: {0}")]
    NotReady(&'static str),

    /// Network-level failure talking to the document API
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A wire body failed to serialize or parse
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to mint a bearer token
    #[error("token error: {0}")]
    Token(String),

    /// Invalid configuration detected at startup
    #[error("configuration error: {0}")]
    Config(String),

    /// Listener or audit-file failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CountersignError {
    /// Whether this error is the tolerable not-found case
    pub fn is_not_found(&self) -> bool {
        matches!(self, CountersignError::NotFound)
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, CountersignError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_document_display_carries_status_and_body() {
        let err = CountersignError::RemoteDocument {
            status: 400,
            body: "{\"detail\":\"bad key\"}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "expected 2xx response but got 400: {\"detail\":\"bad key\"}"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(CountersignError::NotFound.is_not_found());
        assert!(!CountersignError::Database("x".into()).is_not_found());
    }
}
