use crate::{normalize_base, VerifierNetError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;
use verifier_model::{ContentError, ContentStore, PackageLocation};

/// Namespace content addresses are resolved under.
const CONTENT_NAMESPACE: &str = "ipfs/";

/// Default cap on a fetched document.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 8 * 1024 * 1024;

/// Content-store client for an IPFS-style HTTP gateway: `GET {base}/ipfs/{location}`.
#[derive(Clone)]
pub struct ContentGatewayClient {
    client: Client,
    base_url: Url,
    max_document_bytes: usize,
}

impl ContentGatewayClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, VerifierNetError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: normalize_base(base_url),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        })
    }

    /// Documents larger than `limit` fail with [`ContentError::TooLarge`].
    pub fn with_max_document_bytes(mut self, limit: usize) -> Self {
        self.max_document_bytes = limit;
        self
    }

    pub(crate) fn url_for(&self, location: &PackageLocation) -> Result<Url, ContentError> {
        self.base_url
            .join(&format!("{}{}", CONTENT_NAMESPACE, location.as_str()))
            .map_err(|e| ContentError::Transport(format!("invalid content url: {}", e)))
    }

    fn too_large(&self, location: &PackageLocation) -> ContentError {
        ContentError::TooLarge { location: location.to_string(), limit: self.max_document_bytes }
    }
}

#[async_trait]
impl ContentStore for ContentGatewayClient {
    async fn fetch(&self, location: &PackageLocation) -> Result<Option<Vec<u8>>, ContentError> {
        let url = self.url_for(location)?;
        debug!(%url, "Fetching content");

        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ContentError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|err| format!("response body error: {err}"));
            return Err(ContentError::Status { status: status.as_u16(), body });
        }

        if resp.content_length().is_some_and(|len| len > self.max_document_bytes as u64) {
            return Err(self.too_large(location));
        }

        // Gateways may omit or misreport the length; enforce the cap while reading
        let mut bytes = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| ContentError::Transport(e.to_string()))?
        {
            if bytes.len() + chunk.len() > self.max_document_bytes {
                return Err(self.too_large(location));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(Some(bytes))
    }
}
