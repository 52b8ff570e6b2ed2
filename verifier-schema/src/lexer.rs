//! Tokenizer for SDL text. Commas, whitespace and `#` comments are insignificant.

use crate::SchemaError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Name(String),
    Punct(char),
    /// String or block-string literal; descriptions when in definition position.
    Str(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(n) => write!(f, "'{}'", n),
            Token::Punct(c) => write!(f, "'{}'", c),
            Token::Str(_) => write!(f, "string literal"),
        }
    }
}

/// Largest document accepted, in tokens.
pub(crate) const MAX_TOKENS: usize = 250_000;

const PUNCT: &[char] = &['{', '}', '(', ')', '[', ']', ':', '!', '=', '@', '|', '&'];

pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, SchemaError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if tokens.len() > MAX_TOKENS {
            return Err(SchemaError::TooLarge(MAX_TOKENS));
        }
        let c = chars[i];

        if c.is_whitespace() || c == ',' || c == '\u{feff}' {
            i += 1;
            continue;
        }

        if c == '#' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        if c == '"' {
            let (literal, end) = read_string(&chars, i)?;
            tokens.push(Token::Str(literal));
            i = end;
            continue;
        }

        if c.is_alphanumeric() || c == '_' || c == '-' {
            let numeric = c.is_ascii_digit() || c == '-';
            let start = i;
            i += 1;
            while i < chars.len() {
                let ch = chars[i];
                let ok = ch.is_alphanumeric()
                    || ch == '_'
                    || (numeric && (ch == '.' || ch == '-' || ch == '+'));
                if !ok {
                    break;
                }
                i += 1;
            }
            tokens.push(Token::Name(chars[start..i].iter().collect()));
            continue;
        }

        if PUNCT.contains(&c) {
            tokens.push(Token::Punct(c));
            i += 1;
            continue;
        }

        return Err(SchemaError::UnexpectedChar { ch: c, offset: i });
    }

    if tokens.len() > MAX_TOKENS {
        return Err(SchemaError::TooLarge(MAX_TOKENS));
    }
    Ok(tokens)
}

/// Reads a `"..."` or `"""..."""` literal starting at `start`.
/// Returns the contents and the index just past the closing quote(s).
fn read_string(chars: &[char], start: usize) -> Result<(String, usize), SchemaError> {
    let is_block = chars.len() >= start + 3 && chars[start + 1] == '"' && chars[start + 2] == '"';

    if is_block {
        let mut j = start + 3;
        while j + 2 < chars.len() {
            if chars[j] == '"' && chars[j + 1] == '"' && chars[j + 2] == '"' {
                let body: String = chars[start + 3..j].iter().collect();
                return Ok((body.trim().to_string(), j + 3));
            }
            j += 1;
        }
        return Err(SchemaError::UnterminatedString(start));
    }

    let mut j = start + 1;
    let mut body = String::new();
    while j < chars.len() {
        match chars[j] {
            '"' => return Ok((body, j + 1)),
            '\n' => break,
            '\\' if j + 1 < chars.len() => {
                body.push(chars[j + 1]);
                j += 2;
            }
            ch => {
                body.push(ch);
                j += 1;
            }
        }
    }
    Err(SchemaError::UnterminatedString(start))
}
