//! Per-request actor session context
//!
//! Every store and signing operation receives an explicit [`ActorSession`]
//! rather than reading ambient state. Accessors return
//! [`CountersignError::MissingSession`] when a required field is absent, the
//! single failure mode for incomplete context.

use serde::{Deserialize, Serialize};

use crate::types::{CountersignError, Result};

/// Identity context for the acting session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorSession {
    /// Document this session is acting on
    #[serde(default)]
    pub lpa_id: String,

    /// Opaque session identifier for the acting user
    #[serde(default)]
    pub session_id: String,

    /// Organisation the session belongs to, when acting as a supporter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation_id: Option<String>,

    /// Email the actor authenticated with, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ActorSession {
    pub fn new(lpa_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            lpa_id: lpa_id.into(),
            session_id: session_id.into(),
            organisation_id: None,
            email: None,
        }
    }

    /// Document id, or the missing-session error
    pub fn require_lpa_id(&self) -> Result<&str> {
        if self.lpa_id.is_empty() {
            return Err(CountersignError::MissingSession("LpaID"));
        }
        Ok(&self.lpa_id)
    }

    /// Session id, or the missing-session error
    pub fn require_session_id(&self) -> Result<&str> {
        if self.session_id.is_empty() {
            return Err(CountersignError::MissingSession("SessionID"));
        }
        Ok(&self.session_id)
    }

    /// Both key components, in one call for store lookups
    pub fn require_keys(&self) -> Result<(&str, &str)> {
        Ok((self.require_lpa_id()?, self.require_session_id()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_keys() {
        let ctx = ActorSession::new("lpa-123", "session-456");
        assert_eq!(ctx.require_keys().unwrap(), ("lpa-123", "session-456"));
    }

    #[test]
    fn test_missing_lpa_id() {
        let ctx = ActorSession::new("", "session-456");
        let err = ctx.require_keys().unwrap_err();
        assert_eq!(err.to_string(), "missing session data: LpaID");
    }

    #[test]
    fn test_missing_session_id() {
        let ctx = ActorSession::new("lpa-123", "");
        let err = ctx.require_keys().unwrap_err();
        assert_eq!(err.to_string(), "missing session data: SessionID");
    }
}
