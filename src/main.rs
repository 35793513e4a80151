//! Countersign - attorney signing service for lasting power of attorney
//! documents

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use countersign::{
    auth::TokenSigner,
    config::Args,
    db::MongoClient,
    document::DocumentClient,
    logging::AuditLogger,
    resolve::ResolvingService,
    server::{self, AppState, CoreServices},
    signing::SigningService,
    store::{AccessCodeStore, DonorStore, DraftStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("countersign={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Countersign - LPA signing service");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("MongoDB: {} (db: {})", args.mongodb_uri, args.mongodb_db);
    info!("Document API: {}", args.document_api_url);
    info!("======================================");

    // Audit trail, file-backed when configured
    let audit = AuditLogger::new(args.node_id.to_string());
    if let Some(ref path) = args.audit_log_path {
        audit.init_file(path.into()).await?;
    }

    // Bearer token signer for the document store
    let signer = match args.document_api_secret.clone() {
        Some(secret) => match TokenSigner::new(secret) {
            Ok(s) => s,
            Err(e) => {
                error!("Token signer error: {}", e);
                std::process::exit(1);
            }
        },
        // validate() has already rejected this outside dev mode
        None => {
            warn!("No DOCUMENT_API_SECRET set - using the dev-mode signing secret");
            TokenSigner::new_dev()
        }
    };

    // Connect to MongoDB (optional in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, continuing without): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Wire the stores and services when a store is available
    let state = match mongo {
        Some(mongo) => {
            let drafts = Arc::new(DraftStore::new(&mongo).await?);
            let donors = Arc::new(DonorStore::new(&mongo).await?);
            let access_codes = Arc::new(AccessCodeStore::new(&mongo).await?);

            let documents = Arc::new(
                DocumentClient::new(&args.document_api_url, signer)
                    .with_timeout(Duration::from_millis(args.request_timeout_ms)),
            );

            let resolver = Arc::new(ResolvingService::new(
                donors.clone(),
                documents.clone(),
            ));
            let signing = Arc::new(SigningService::new(
                drafts.clone(),
                donors.clone(),
                documents.clone(),
                audit.clone(),
            ));

            info!("Draft, donor and access-code stores ready");

            let services = CoreServices {
                drafts,
                donors,
                access_codes,
                documents,
                resolver,
                signing,
            };
            AppState::with_services(args, mongo, services, audit)
        }
        None => AppState::new(args, audit),
    };

    // Run the server
    if let Err(e) = server::run(Arc::new(state)).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
