//! Access code store
//!
//! Lookup is by digest; the clear code never reaches the database. An
//! expired code is indistinguishable from a missing one. Consumption happens
//! inside the draft-creation transaction, not here.

use bson::doc;
use chrono::Utc;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{hash_code, AccessCodeDoc, CodeKind, ACCESS_CODE_COLLECTION};
use crate::types::{CountersignError, Result};

/// MongoDB-backed access code store
#[derive(Clone)]
pub struct AccessCodeStore {
    codes: MongoCollection<AccessCodeDoc>,
    now: fn() -> chrono::DateTime<Utc>,
}

impl AccessCodeStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            codes: client.collection(ACCESS_CODE_COLLECTION).await?,
            now: Utc::now,
        })
    }

    /// Replace the clock, for deterministic tests
    pub fn with_clock(mut self, now: fn() -> chrono::DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Look up a clear code within a namespace. Returns `NotFound` for
    /// unknown and expired codes alike.
    pub async fn get(&self, kind: CodeKind, clear_code: &str) -> Result<AccessCodeDoc> {
        let filter = doc! {
            "actor_kind": kind.as_str(),
            "code_hash": hash_code(clear_code),
        };

        let code = self
            .codes
            .find_one(filter)
            .await?
            .ok_or(CountersignError::NotFound)?;

        if code.has_expired((self.now)()) {
            return Err(CountersignError::NotFound);
        }
        Ok(code)
    }

    /// Store a newly issued code record
    pub async fn put(&self, code: AccessCodeDoc) -> Result<()> {
        self.codes.insert_one(code).await?;
        Ok(())
    }
}
