//! Interface descriptions and the comparison seam

use crate::types::PackageLocation;

/// Raw interface-description text, keyed by the content address it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    pub location: PackageLocation,
    pub text: String,
}

impl SchemaDocument {
    pub fn new(location: PackageLocation, text: impl Into<String>) -> Self {
        Self { location, text: text.into() }
    }
}

/// Schema-diff predicates. Implementations must be pure and deterministic.
pub trait SchemaComparator: Send + Sync {
    /// Clients written against `old` keep working against `new`.
    fn is_backward_compatible(&self, old: &SchemaDocument, new: &SchemaDocument) -> bool;

    /// Both documents expose the same observable interface.
    fn is_functionally_identical(&self, a: &SchemaDocument, b: &SchemaDocument) -> bool;
}
