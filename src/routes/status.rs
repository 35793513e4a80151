//! Status endpoint
//!
//! Reports the running configuration and store connectivity. The response
//! carries identifiers and settings only, never draft contents or actor
//! details.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

/// Draft store connectivity
#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub connected: bool,
    pub database: String,
}

/// Remote document store wiring
#[derive(Debug, Serialize)]
pub struct DocumentApiStatus {
    pub configured: bool,
    pub base_url: String,
    pub request_timeout_ms: u64,
}

/// Audit trail wiring
#[derive(Debug, Serialize)]
pub struct AuditStatus {
    /// Whether records are being written to disk
    pub file_backed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Full status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub node_id: String,
    pub mode: &'static str,
    pub uptime_seconds: u64,
    pub listen: String,
    pub store: StoreStatus,
    pub document_api: DocumentApiStatus,
    pub audit: AuditStatus,
}

/// Handle status endpoint (/status)
pub fn status_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let args = &state.args;

    let response = StatusResponse {
        service: "countersign",
        version: env!("CARGO_PKG_VERSION"),
        node_id: args.node_id.to_string(),
        mode: if args.dev_mode {
            "development"
        } else {
            "production"
        },
        uptime_seconds: state.uptime().as_secs(),
        listen: args.listen.to_string(),
        store: StoreStatus {
            connected: state.mongo.is_some(),
            database: args.mongodb_db.clone(),
        },
        document_api: DocumentApiStatus {
            configured: state.services.is_some(),
            base_url: args.document_api_url.clone(),
            request_timeout_ms: args.request_timeout_ms,
        },
        audit: AuditStatus {
            file_backed: args.audit_log_path.is_some(),
            path: args.audit_log_path.clone(),
        },
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"service":"countersign","error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
