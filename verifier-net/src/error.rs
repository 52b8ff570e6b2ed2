//! Error types for verifier-net crate

use thiserror::Error;

/// Construction-time errors. Per-call failures use the model's
/// `LedgerError` / `ContentError` so the engine never sees transport types.
#[derive(Error, Debug)]
pub enum VerifierNetError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
