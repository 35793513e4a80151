//! Bearer token minting for the remote document service
//!
//! Every outbound request carries an HS256 token whose subject URN names the
//! acting party: a specific actor for signing events, the service identity
//! for system events. Tokens carry no expiry claim; the remote service
//! judges freshness from `iat`, so recently minted tokens are reused.
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - In production, DOCUMENT_API_SECRET should be a strong random value from
//!   environment

use dashmap::DashMap;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::CountersignError;

/// Issuer claim on every minted token
pub const ISSUER: &str = "countersign";

/// Fixed uid used as the subject for system actions
pub const SERVICE_UID: &str = "00000000-0000-4000-0000-000000000000";

/// How long a minted token may be reused before a fresh `iat` is required
const REUSE_WINDOW_SECS: u64 = 60;

/// Payload stored in JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuing system
    pub iss: String,
    /// URN of the acting party
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
}

#[derive(Clone)]
struct MintedToken {
    token: String,
    iat: u64,
}

/// Mints bearer tokens for outbound document-service requests
pub struct TokenSigner {
    secret: String,
    minted: DashMap<String, MintedToken>,
    now: fn() -> u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl TokenSigner {
    /// Create a new signer
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String) -> Result<Self, CountersignError> {
        if secret.is_empty() {
            return Err(CountersignError::Config(
                "DOCUMENT_API_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < 32 {
            return Err(CountersignError::Config(
                "DOCUMENT_API_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            minted: DashMap::new(),
            now: unix_now,
        })
    }

    /// Create a signer for dev mode (fixed secret)
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            minted: DashMap::new(),
            now: unix_now,
        }
    }

    /// Replace the clock, for deterministic tests
    pub fn with_clock(mut self, now: fn() -> u64) -> Self {
        self.now = now;
        self
    }

    /// Subject URN for an acting party
    pub fn subject_for(actor_uid: &str) -> String {
        format!("urn:{}:users:{}", ISSUER, actor_uid)
    }

    /// Bearer token acting as the given party
    pub fn bearer_for(&self, actor_uid: &str) -> Result<String, CountersignError> {
        let sub = Self::subject_for(actor_uid);
        let now = (self.now)();

        if let Some(hit) = self.minted.get(&sub) {
            if now.saturating_sub(hit.iat) < REUSE_WINDOW_SECS {
                return Ok(hit.token.clone());
            }
        }

        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: sub.clone(),
            iat: now,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CountersignError::Token(format!("Failed to generate token: {}", e)))?;

        self.minted.insert(
            sub,
            MintedToken {
                token: token.clone(),
                iat: now,
            },
        );

        Ok(token)
    }

    /// Bearer token acting as the service itself
    pub fn service_bearer(&self) -> Result<String, CountersignError> {
        self.bearer_for(SERVICE_UID)
    }
}
