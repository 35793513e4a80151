//! HTTP client for the remote document store
//!
//! All calls carry a short-lived bearer token naming who acts: a real
//! actor uid for signing and opt-out events, the service identity for
//! system-originated ones. Non-2xx responses other than the documented
//! cases surface as [`CountersignError::RemoteDocument`] with the body
//! preserved.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::TokenSigner;
use crate::document::resolved::ResolvedDocument;
use crate::document::update::{CertificateProviderDetails, Update};
use crate::document::wire::{DocumentResponse, DocumentSnapshot};
use crate::types::{CountersignError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport seam for the document client (allows mocking in tests)
#[async_trait]
pub trait HttpSend: Send + Sync {
    async fn send(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, reqwest::Error>;
}

/// Production transport backed by a shared reqwest client
pub struct ReqwestSend {
    client: reqwest::Client,
}

impl ReqwestSend {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestSend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpSend for ReqwestSend {
    async fn send(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        self.client.execute(request).await
    }
}

/// Error body shape the store uses for problem responses
#[derive(Deserialize)]
struct ProblemDetail {
    #[serde(default)]
    detail: String,
}

pub struct DocumentClient {
    base_url: String,
    signer: TokenSigner,
    transport: Box<dyn HttpSend>,
    timeout: Duration,
}

impl DocumentClient {
    pub fn new(base_url: &str, signer: TokenSigner) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
            transport: Box::new(ReqwestSend::new()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the transport, for tests
    pub fn with_transport(mut self, transport: Box<dyn HttpSend>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        bearer: &str,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Request> {
        let url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| CountersignError::Config(format!("invalid document API URL: {}", e)))?;

        let mut request = reqwest::Request::new(method, url);
        *request.timeout_mut() = Some(self.timeout);

        let auth = HeaderValue::from_str(&format!("Bearer {}", bearer))
            .map_err(|e| CountersignError::Token(format!("invalid bearer header: {}", e)))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        if let Some(bytes) = body {
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *request.body_mut() = Some(bytes.into());
        }

        Ok(request)
    }

    /// `PUT /documents/{uid}` with the full document snapshot.
    ///
    /// A 400 reporting the document already exists is treated as success
    /// so re-submission stays safe.
    pub async fn send_document(&self, uid: &str, snapshot: &DocumentSnapshot) -> Result<()> {
        let bearer = self.signer.service_bearer()?;
        let body = serde_json::to_vec(snapshot)?;
        let request = self.request(Method::PUT, &format!("/documents/{}", uid), &bearer, Some(body))?;

        let response = self.transport.send(request).await?;
        let status = response.status();
        if status == StatusCode::CREATED {
            info!("Stored document {}", uid);
            return Ok(());
        }

        let body = response.text().await?;
        if status == StatusCode::BAD_REQUEST {
            if let Ok(problem) = serde_json::from_str::<ProblemDetail>(&body) {
                if problem.detail == "document with UID already exists" {
                    debug!("Document {} already stored, nothing to do", uid);
                    return Ok(());
                }
            }
        }

        Err(CountersignError::RemoteDocument {
            status: status.as_u16(),
            body,
        })
    }

    /// `GET /documents/{uid}`, flattened into the two appointment sets
    pub async fn fetch(&self, uid: &str) -> Result<ResolvedDocument> {
        let bearer = self.signer.service_bearer()?;
        let request = self.request(Method::GET, &format!("/documents/{}", uid), &bearer, None)?;

        let response = self.transport.send(request).await?;
        match response.status() {
            StatusCode::OK => {
                let parsed: DocumentResponse = serde_json::from_slice(&response.bytes().await?)?;
                debug!("Fetched document {} with status '{}'", uid, parsed.status);
                Ok(parsed.flatten())
            }
            StatusCode::NOT_FOUND => Err(CountersignError::NotFound),
            status => Err(CountersignError::RemoteDocument {
                status: status.as_u16(),
                body: response.text().await?,
            }),
        }
    }

    /// `POST /documents/{uid}/updates`; `actor_uid` of `None` sends under
    /// the service identity
    pub async fn send_update(
        &self,
        uid: &str,
        actor_uid: Option<&str>,
        update: &Update,
    ) -> Result<()> {
        let bearer = match actor_uid {
            Some(actor) => self.signer.bearer_for(actor)?,
            None => self.signer.service_bearer()?,
        };
        let body = serde_json::to_vec(update)?;
        let request = self.request(
            Method::POST,
            &format!("/documents/{}/updates", uid),
            &bearer,
            Some(body),
        )?;

        let response = self.transport.send(request).await?;
        match response.status() {
            StatusCode::CREATED => {
                info!("Sent {:?} update for document {}", update.kind, uid);
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(CountersignError::NotFound),
            status => Err(CountersignError::RemoteDocument {
                status: status.as_u16(),
                body: response.text().await?,
            }),
        }
    }

    /// Certificate provider signing event, sent as the provider
    pub async fn send_certificate_provider_signed(
        &self,
        resolved: &ResolvedDocument,
        details: &CertificateProviderDetails,
    ) -> Result<()> {
        let update = Update::certificate_provider_sign(resolved, details);
        self.send_update(
            &resolved.uid,
            Some(&resolved.certificate_provider.uid),
            &update,
        )
        .await
    }

    /// Registration event, sent under the service identity
    pub async fn send_register(&self, uid: &str) -> Result<()> {
        self.send_update(uid, None, &Update::register()).await
    }

    /// Perfection event, sent under the service identity
    pub async fn send_perfect(&self, uid: &str) -> Result<()> {
        self.send_update(uid, None, &Update::perfect()).await
    }
}
