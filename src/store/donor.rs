//! Donor draft store
//!
//! Attorneys act on documents they do not own, so reads are keyed by
//! document rather than by session.

use bson::{doc, DateTime};
use chrono::Utc;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{DonorDraftDoc, DONOR_DRAFT_COLLECTION};
use crate::store::DonorStorage;
use crate::types::{CountersignError, Result};

/// MongoDB-backed donor draft store
#[derive(Clone)]
pub struct DonorStore {
    donors: MongoCollection<DonorDraftDoc>,
    now: fn() -> chrono::DateTime<Utc>,
}

impl DonorStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            donors: client.collection(DONOR_DRAFT_COLLECTION).await?,
            now: Utc::now,
        })
    }

    /// Replace the clock, for deterministic tests
    pub fn with_clock(mut self, now: fn() -> chrono::DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

#[async_trait::async_trait]
impl DonorStorage for DonorStore {
    async fn get_any(&self, lpa_id: &str) -> Result<DonorDraftDoc> {
        self.donors
            .find_one(doc! { "lpa_id": lpa_id })
            .await?
            .ok_or(CountersignError::NotFound)
    }

    async fn put(&self, donor: &DonorDraftDoc) -> Result<()> {
        let mut item = donor.clone();
        let stamp = DateTime::from_chrono((self.now)());
        if item.metadata.created_at.is_none() {
            item.metadata.created_at = Some(stamp);
        }
        item.metadata.touch(stamp);

        self.donors
            .replace_one(doc! { "lpa_id": &item.lpa_id }, item)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running MongoDB instance
    // See docker-compose.dev.yml for local testing
}
