//! Content-store client contract

use async_trait::async_trait;
use thiserror::Error;

use crate::types::PackageLocation;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("content store request failed: {0}")]
    Transport(String),
    #[error("content store returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("content at {location} exceeds {limit} bytes")]
    TooLarge { location: String, limit: usize },
    #[error("content at {location} is not valid UTF-8")]
    NotUtf8 { location: String },
}

/// Resolves content addresses to raw bytes.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// `Ok(None)` means the address does not resolve (NotFound).
    async fn fetch(&self, location: &PackageLocation) -> Result<Option<Vec<u8>>, ContentError>;
}
