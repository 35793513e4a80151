//! Health check endpoints
//!
//! Kubernetes-style health probes:
//! - /health, /healthz - liveness probe (is the service running?)
//! - /ready, /readyz - readiness probe (is the service ready for traffic?)
//!
//! Liveness always returns 200 while the process is up. Readiness returns
//! 200 only when MongoDB is connected, unless dev_mode is enabled; the
//! signing flows cannot do anything useful without their draft store.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

/// Health response body shared by the liveness and readiness probes
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall health status (true if service is running)
    pub healthy: bool,
    /// 'online' when fully operational, 'degraded' when MongoDB is down
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Seconds since process start
    pub uptime_seconds: u64,
    /// Current timestamp
    pub timestamp: String,
    /// Operating mode
    pub mode: String,
    /// Node identifier
    pub node_id: String,
    /// Draft store connection status
    pub mongo: MongoHealth,
    /// Remote document store configuration status
    pub document_api: DocumentApiHealth,
    /// Error message when degraded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// MongoDB connection details
#[derive(Serialize)]
pub struct MongoHealth {
    pub connected: bool,
    pub database: String,
}

/// Remote document store details
#[derive(Serialize)]
pub struct DocumentApiHealth {
    /// Whether the signing services are wired up
    pub configured: bool,
    pub base_url: String,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let args = &state.args;
    let mongo_connected = state.mongo.is_some();
    let services_configured = state.services.is_some();

    let error = if !mongo_connected {
        Some("MongoDB not connected - draft operations unavailable".to_string())
    } else {
        None
    };

    let status = if mongo_connected && services_configured {
        "online"
    } else {
        "degraded"
    };

    HealthResponse {
        healthy: true,
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
        node_id: args.node_id.to_string(),
        mongo: MongoHealth {
            connected: mongo_connected,
            database: args.mongodb_db.clone(),
        },
        document_api: DocumentApiHealth {
            configured: services_configured,
            base_url: args.document_api_url.clone(),
        },
        error,
    }
}

/// Handle liveness probe (/health, /healthz)
///
/// Returns 200 OK while the service is running; the body carries MongoDB
/// status for callers that want it.
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state);

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"healthy":true,"error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Handle readiness probe (/ready, /readyz)
///
/// Returns 200 OK only when the draft store is available. Dev mode reports
/// ready regardless so the service can run against a stub environment.
pub fn readiness_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state);

    let is_ready = state.services.is_some() || state.args.dev_mode;

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"healthy":false,"error":"Serialization failed"}"#.to_string());

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Git commit hash (full)
    pub commit_full: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<Full<Bytes>> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "countersign",
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"version":"unknown","commit":"unknown"}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
