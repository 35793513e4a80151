//! Authentication for countersign
//!
//! Provides:
//! - HS256 bearer token minting for the remote document service
//! - URN subject construction for actor and service identities

pub mod token;

pub use token::{Claims, TokenSigner, ISSUER, SERVICE_UID};
