//! Strong types for ledger identifiers and content addresses

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid node id: {0}")]
    InvalidNodeId(String),
    #[error("package location must not be empty")]
    EmptyLocation,
}

/// 32-byte identifier of a registry node (package, patch or minor version).
///
/// The all-zero id is the ledger's way of saying "no such node".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Returns the inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Maps the zero id to `None`.
    pub fn non_zero(self) -> Option<Self> {
        if self.is_zero() { None } else { Some(self) }
    }

    /// Parse from a hex string, with or without a `0x` prefix.
    pub fn from_hex(hex_str: &str) -> Result<Self, ModelError> {
        let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(trimmed)
            .map_err(|e| ModelError::InvalidNodeId(format!("invalid hex: {}", e)))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            ModelError::InvalidNodeId(format!("expected 64 hex characters, got {}", trimmed.len()))
        })?;
        Ok(Self(arr))
    }

    /// `0x`-prefixed hex, the form the ledger gateway speaks.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// First four bytes, for log lines.
    pub fn short(&self) -> String {
        format!("0x{}..", hex::encode(&self.0[..4]))
    }
}

impl From<[u8; 32]> for NodeId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.short())
    }
}

/// Opaque content address of a published package (e.g. an IPFS CID).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct PackageLocation(String);

impl PackageLocation {
    pub fn new(location: impl Into<String>) -> Result<Self, ModelError> {
        let location = location.into();
        if location.trim().is_empty() {
            return Err(ModelError::EmptyLocation);
        }
        Ok(Self(location))
    }

    /// Empty strings on the wire mean "not declared".
    pub fn from_optional(location: Option<String>) -> Option<Self> {
        location.and_then(|l| Self::new(l).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PackageLocation {
    type Error = ModelError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for PackageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
