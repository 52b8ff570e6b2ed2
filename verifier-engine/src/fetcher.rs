//! Resolves package locations to interface descriptions

use crate::error::VerifyError;
use std::sync::Arc;
use tracing::{debug, warn};
use verifier_model::{ContentError, ContentStore, PackageLocation, SchemaDocument};

#[derive(Clone)]
pub struct SchemaFetcher {
    store: Arc<dyn ContentStore>,
}

impl SchemaFetcher {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// `Ok(None)` when the address does not resolve.
    pub async fn fetch(&self, location: &PackageLocation) -> Result<Option<SchemaDocument>, ContentError> {
        let Some(bytes) = self.store.fetch(location).await? else {
            return Ok(None);
        };
        let text = String::from_utf8(bytes)
            .map_err(|_| ContentError::NotUtf8 { location: location.to_string() })?;
        Ok(Some(SchemaDocument::new(location.clone(), text)))
    }

    /// Fetch the proposal's own schema.
    ///
    /// `Ok(None)` means the document exists but can never be a valid schema
    /// (oversized or not UTF-8), so the proposal can be rejected. Not found
    /// and transport failures are errors: nothing can be judged without it.
    pub async fn fetch_proposed(&self, location: &PackageLocation) -> Result<Option<SchemaDocument>, VerifyError> {
        match self.fetch(location).await {
            Ok(Some(doc)) => Ok(Some(doc)),
            Ok(None) => Err(VerifyError::ContentFetch {
                location: location.to_string(),
                message: "not found".into(),
            }),
            Err(e @ (ContentError::TooLarge { .. } | ContentError::NotUtf8 { .. })) => {
                warn!(%location, error = %e, "Proposed schema is unusable");
                Ok(None)
            }
            Err(e) => Err(VerifyError::ContentFetch {
                location: location.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Fetch a lineage schema; any failure reads as "absent".
    pub async fn fetch_lenient(&self, location: Option<&PackageLocation>) -> Option<SchemaDocument> {
        let location = location?;
        match self.fetch(location).await {
            Ok(Some(doc)) => Some(doc),
            Ok(None) => {
                debug!(%location, "Lineage schema not found, treating as absent");
                None
            }
            Err(e) => {
                warn!(%location, error = %e, "Lineage schema unavailable, treating as absent");
                None
            }
        }
    }
}
