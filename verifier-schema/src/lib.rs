//! Verifier Schema
//!
//! Parses GraphQL-style interface descriptions into a normalized form and
//! answers the two questions the verifier asks of a pair of schemas:
//! is the newer one backward-compatible, and are they functionally identical.

mod lexer;
pub mod parser;
pub mod compare;

pub use compare::{is_backward_compatible, SdlComparator};
pub use parser::{parse, ArgSig, DeclKind, Declaration, Member, ParsedSchema};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unexpected end of document, expected {0}")]
    UnexpectedEof(&'static str),
    #[error("unexpected token {found}, expected {expected}")]
    Unexpected { found: String, expected: &'static str },
    #[error("duplicate definition: {0}")]
    Duplicate(String),
    #[error("type nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("document exceeds {0} tokens")]
    TooLarge(usize),
}
