//! Signing audit trail
//!
//! Records signing-flow events in JSONL format for the audit file. Records
//! carry actor uids, never names or emails. Audit failures are logged and
//! swallowed; they must not fail the operation being audited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::db::schemas::ActorKind;

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// An individual attorney confirmed their signature
    AttorneySigned,
    /// A trust corporation signatory slot was confirmed
    SignatorySigned,
    /// A trust corporation decided on a second signatory
    SecondSignatoryDecided,
    /// An actor withdrew from the document
    OptedOut,
    /// Every named attorney has now confirmed
    AllAttorneysSigned,
}

/// One audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    /// Node that handled the request
    pub node_id: String,
    /// Remote document uid
    pub lpa_uid: String,
    /// Acting attorney or trust corporation, absent for document-level events
    pub actor_uid: Option<String>,
    pub actor_kind: Option<ActorKind>,
    /// Signatory slot for trust corporation events
    pub signatory_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AuditRecord {
    pub fn new(event_type: AuditEventType, node_id: String, lpa_uid: String) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            node_id,
            lpa_uid,
            actor_uid: None,
            actor_kind: None,
            signatory_index: None,
            metadata: None,
        }
    }

    pub fn with_actor(mut self, actor_uid: String, kind: ActorKind) -> Self {
        self.actor_uid = Some(actor_uid);
        self.actor_kind = Some(kind);
        self
    }

    pub fn with_signatory_index(mut self, index: usize) -> Self {
        self.signatory_index = Some(index);
        self
    }

    /// Convert to JSONL line
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Audit logger that appends records to a JSONL file
#[derive(Clone)]
pub struct AuditLogger {
    inner: Arc<Mutex<AuditLoggerInner>>,
    node_id: String,
}

struct AuditLoggerInner {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl AuditLogger {
    pub fn new(node_id: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AuditLoggerInner {
                writer: None,
                path: None,
            })),
            node_id,
        }
    }

    /// Initialize file logging to the specified path
    pub async fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let writer = BufWriter::new(file);

        let mut inner = self.inner.lock().await;
        inner.writer = Some(writer);
        inner.path = Some(path.clone());

        info!("Audit logging initialized to {}", path.display());
        Ok(())
    }

    /// Append an audit record
    pub async fn log(&self, record: AuditRecord) {
        let jsonl = match record.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize audit record: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;

        if let Some(ref mut writer) = inner.writer {
            if let Err(e) = writeln!(writer, "{}", jsonl) {
                error!("Failed to write audit record: {}", e);
            }
            // Flush per record; the audit trail must survive a crash
            if let Err(e) = writer.flush() {
                error!("Failed to flush audit log: {}", e);
            }
        }
    }

    pub async fn log_attorney_signed(&self, lpa_uid: &str, actor_uid: &str, kind: ActorKind) {
        let record = AuditRecord::new(
            AuditEventType::AttorneySigned,
            self.node_id.clone(),
            lpa_uid.to_string(),
        )
        .with_actor(actor_uid.to_string(), kind);

        self.log(record).await;
    }

    pub async fn log_signatory_signed(
        &self,
        lpa_uid: &str,
        actor_uid: &str,
        kind: ActorKind,
        index: usize,
    ) {
        let record = AuditRecord::new(
            AuditEventType::SignatorySigned,
            self.node_id.clone(),
            lpa_uid.to_string(),
        )
        .with_actor(actor_uid.to_string(), kind)
        .with_signatory_index(index);

        self.log(record).await;
    }

    pub async fn log_second_signatory_decided(
        &self,
        lpa_uid: &str,
        actor_uid: &str,
        kind: ActorKind,
        wants_second: bool,
    ) {
        let mut record = AuditRecord::new(
            AuditEventType::SecondSignatoryDecided,
            self.node_id.clone(),
            lpa_uid.to_string(),
        )
        .with_actor(actor_uid.to_string(), kind);

        record.metadata = Some(serde_json::json!({ "wants_second": wants_second }));

        self.log(record).await;
    }

    pub async fn log_opted_out(&self, lpa_uid: &str, actor_uid: &str, kind: ActorKind) {
        let record = AuditRecord::new(
            AuditEventType::OptedOut,
            self.node_id.clone(),
            lpa_uid.to_string(),
        )
        .with_actor(actor_uid.to_string(), kind);

        self.log(record).await;
    }

    pub async fn log_all_attorneys_signed(&self, lpa_uid: &str) {
        let record = AuditRecord::new(
            AuditEventType::AllAttorneysSigned,
            self.node_id.clone(),
            lpa_uid.to_string(),
        );

        self.log(record).await;
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization() {
        let record = AuditRecord::new(
            AuditEventType::AttorneySigned,
            "node-1".to_string(),
            "M-1111".to_string(),
        )
        .with_actor("a1".to_string(), ActorKind::Attorney);

        let jsonl = record.to_jsonl().unwrap();
        assert!(jsonl.contains("attorney_signed"));
        assert!(jsonl.contains("M-1111"));
        assert!(jsonl.contains("\"actor_kind\":\"attorney\""));
    }

    #[test]
    fn test_signatory_record_carries_slot() {
        let record = AuditRecord::new(
            AuditEventType::SignatorySigned,
            "node-1".to_string(),
            "M-1111".to_string(),
        )
        .with_actor("tc1".to_string(), ActorKind::TrustCorporation)
        .with_signatory_index(1);

        let jsonl = record.to_jsonl().unwrap();
        assert!(jsonl.contains("signatory_signed"));
        assert!(jsonl.contains("\"signatory_index\":1"));
    }

    #[test]
    fn test_document_level_record_has_no_actor() {
        let record = AuditRecord::new(
            AuditEventType::AllAttorneysSigned,
            "node-1".to_string(),
            "M-1111".to_string(),
        );

        let jsonl = record.to_jsonl().unwrap();
        assert!(jsonl.contains("all_attorneys_signed"));
        assert!(jsonl.contains("\"actor_uid\":null"));
    }
}
