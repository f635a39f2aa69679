//! Segment splitting shared by every address grammar.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("static pattern"));

/// Key selecting one instance of a repeated object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstanceKey {
    /// `[0]`, from `count`
    Int(u64),
    /// `["key"]`, from `for_each`
    Str(String),
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "[{}]", n),
            Self::Str(s) => {
                f.write_str("[\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"]")
            }
        }
    }
}

/// One `name[key]` step of an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub name: String,
    pub key: Option<InstanceKey>,
}

impl Segment {
    /// True if this is the bare keyword `word` with no instance key.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.key.is_none() && self.name == word
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    IDENTIFIER.is_match(s)
}

/// Split an address into its segments. The error is a human-readable reason.
pub(crate) fn split_segments(input: &str) -> Result<Vec<Segment>, String> {
    if input.is_empty() {
        return Err("address is empty".to_string());
    }

    let mut segments = Vec::new();
    let mut rest = input;
    loop {
        let name_len = rest.find(['.', '[']).unwrap_or(rest.len());
        let name = &rest[..name_len];
        if !is_identifier(name) {
            return Err(format!("invalid name {:?}", name));
        }
        rest = &rest[name_len..];

        let mut key = None;
        if let Some(after) = rest.strip_prefix('[') {
            let (parsed, consumed) = parse_key(after)?;
            key = Some(parsed);
            rest = &after[consumed..];
        }
        segments.push(Segment {
            name: name.to_string(),
            key,
        });

        if rest.is_empty() {
            return Ok(segments);
        }
        rest = rest
            .strip_prefix('.')
            .ok_or_else(|| format!("unexpected {:?} after {:?}", rest, name))?;
    }
}

/// Parse a key body following `[`. Returns the key and the number of bytes
/// consumed, including the closing `]`.
fn parse_key(after: &str) -> Result<(InstanceKey, usize), String> {
    if let Some(body) = after.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = body.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    let close = 1 + i + 1;
                    if after[close..].starts_with(']') {
                        return Ok((InstanceKey::Str(value), close + 1));
                    }
                    return Err("string key must be followed by ']'".to_string());
                }
                '\\' => match chars.next() {
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, other)) => return Err(format!("invalid escape \\{}", other)),
                    None => break,
                },
                c => value.push(c),
            }
        }
        return Err("unterminated string key".to_string());
    }

    let close = after
        .find(']')
        .ok_or_else(|| "unterminated instance key".to_string())?;
    let digits = &after[..close];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid instance key [{}]", digits));
    }
    let n = digits
        .parse::<u64>()
        .map_err(|e| format!("invalid instance key [{}]: {}", digits, e))?;
    Ok((InstanceKey::Int(n), close + 1))
}
