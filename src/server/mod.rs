//! HTTP server for countersign
//!
//! Serves the supervisory surface: health and readiness probes, version
//! info, and a configuration status report. Signing flows are driven
//! through the service layer, not over HTTP.
//!
//! Uses hyper http1 with TokioIo for async handling.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Args;
use crate::db::MongoClient;
use crate::document::DocumentClient;
use crate::logging::AuditLogger;
use crate::resolve::ResolvingService;
use crate::routes;
use crate::signing::SigningService;
use crate::store::{AccessCodeStore, DonorStore, DraftStore};
use crate::types::CountersignError;

/// The stores and services the signing flows run on. Absent when MongoDB
/// is unavailable (dev mode only).
pub struct CoreServices {
    pub drafts: Arc<DraftStore>,
    pub donors: Arc<DonorStore>,
    pub access_codes: Arc<AccessCodeStore>,
    pub documents: Arc<DocumentClient>,
    pub resolver: Arc<ResolvingService>,
    pub signing: Arc<SigningService>,
}

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: Option<MongoClient>,
    pub services: Option<CoreServices>,
    pub audit: AuditLogger,
    started: Instant,
}

impl AppState {
    /// Create AppState without a store (dev mode, degraded)
    pub fn new(args: Args, audit: AuditLogger) -> Self {
        Self {
            args,
            mongo: None,
            services: None,
            audit,
            started: Instant::now(),
        }
    }

    /// Create AppState with the full service wiring
    pub fn with_services(
        args: Args,
        mongo: MongoClient,
        services: CoreServices,
        audit: AuditLogger,
    ) -> Self {
        Self {
            args,
            mongo: Some(mongo),
            services: Some(services),
            audit,
            started: Instant::now(),
        }
    }

    /// Time since this instance started
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

pub async fn run(state: Arc<AppState>) -> Result<(), CountersignError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Countersign listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - missing backends are tolerated");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, std::convert::Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe - 200 while the process is up
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Readiness probe - 200 only when the draft store is available
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // Configuration and connectivity report
        (Method::GET, "/status") => routes::status_check(Arc::clone(&state)),

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        _ => not_found_response(&path),
    };

    Ok(response)
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
