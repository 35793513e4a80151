//! Configuration for countersign
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Countersign - attorney signing service for lasting power of attorney
/// documents
#[derive(Parser, Debug, Clone)]
#[command(name = "countersign")]
#[command(about = "Attorney and trust corporation signing flows for LPA documents")]
pub struct Args {
    /// Unique node identifier for this service instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI. Draft creation uses a multi-document
    /// transaction, which needs a replica set (single-node is fine).
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "countersign")]
    pub mongodb_db: String,

    /// Base URL of the remote document store API
    #[arg(long, env = "DOCUMENT_API_URL", default_value = "http://localhost:8090")]
    pub document_api_url: String,

    /// Shared secret for document store bearer tokens (required in
    /// production)
    #[arg(long, env = "DOCUMENT_API_SECRET")]
    pub document_api_secret: Option<String>,

    /// Path for the JSONL audit trail; unset leaves auditing in-memory only
    #[arg(long, env = "AUDIT_LOG_PATH")]
    pub audit_log_path: Option<String>,

    /// Enable development mode (tolerates missing MongoDB and uses a fixed
    /// document store secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Document store request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.document_api_secret.is_none() {
            return Err("DOCUMENT_API_SECRET is required in production mode".to_string());
        }

        if !self.document_api_url.starts_with("http://")
            && !self.document_api_url.starts_with("https://")
        {
            return Err("DOCUMENT_API_URL must be an http(s) URL".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args::parse_from(["countersign", "--document-api-secret", "0123456789abcdef0123456789abcdef"])
    }

    #[test]
    fn test_defaults() {
        let args = args();
        assert_eq!(args.listen.port(), 8080);
        assert_eq!(args.mongodb_db, "countersign");
        assert_eq!(args.document_api_url, "http://localhost:8090");
        assert!(!args.dev_mode);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        let args = Args::parse_from(["countersign"]);
        assert!(args.validate().is_err());

        let dev = Args::parse_from(["countersign", "--dev-mode"]);
        assert!(dev.validate().is_ok());
    }

    #[test]
    fn test_document_api_url_must_be_http() {
        let mut args = args();
        args.document_api_url = "ws://localhost:8090".to_string();
        assert!(args.validate().is_err());
    }
}
