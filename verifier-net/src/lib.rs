//! Verifier Net
//!
//! reqwest-backed implementations of the verifier's remote collaborators:
//! [`ContentGatewayClient`] resolves package locations through an IPFS-style
//! HTTP gateway, [`LedgerGatewayClient`] talks to the voting registry through
//! a JSON-RPC gateway.

pub mod error;
pub mod content;
pub mod ledger;
mod wire;

pub use content::{ContentGatewayClient, DEFAULT_MAX_DOCUMENT_BYTES};
pub use error::VerifierNetError;
pub use ledger::LedgerGatewayClient;

pub use reqwest::Url;

/// Make `base` safe to `join` relative paths onto.
pub(crate) fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}
