//! Line-oriented section/value configuration format
//!
//! ```text
//! #TIME
//! 7
//! 12.0 hours after midnight
//! #TopBoundary
//! 100
//! ```
//!
//! - A line starting with `#` opens a section; its name is the rest of the
//!   line, trimmed and upper-cased. Opening a section again starts its value
//!   list afresh but keeps its original position.
//! - Other non-empty lines contribute their first whitespace-delimited token:
//!   a float if the token contains `.`, an integer otherwise. Trailing text is
//!   a comment. Single `_` separators between digits are accepted (`1_000`),
//!   and integers too large for `i64` are kept as floats.
//! - Tokens that do not parse, and value lines before the first header, are
//!   skipped without error.

use crate::error::TransportError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::num::IntErrorKind;
use std::path::Path;

/// Numeric value read from a configuration line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Int(i64),
    Float(f64),
}

impl ConfigValue {
    /// Parse a single token
    ///
    /// Returns `None` if the token is not a number of the expected kind.
    pub fn parse(token: &str) -> Option<Self> {
        let token = strip_digit_separators(token)?;
        if token.contains('.') {
            return token.parse().ok().map(ConfigValue::Float);
        }
        match token.parse::<i64>() {
            Ok(v) => Some(ConfigValue::Int(v)),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    token.parse().ok().map(ConfigValue::Float)
                }
                _ => None,
            },
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            ConfigValue::Int(v) => v as f64,
            ConfigValue::Float(v) => v,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Int(v) => write!(f, "{v}"),
            ConfigValue::Float(v) => write!(f, "{v:?}"),
        }
    }
}

/// Drop `_` separators; every one must sit between two ASCII digits
fn strip_digit_separators(token: &str) -> Option<Cow<'_, str>> {
    if !token.contains('_') {
        return Some(Cow::Borrowed(token));
    }
    let bytes = token.as_bytes();
    let valid = bytes.iter().enumerate().all(|(n, &b)| {
        b != b'_'
            || (n > 0
                && bytes[n - 1].is_ascii_digit()
                && bytes.get(n + 1).is_some_and(u8::is_ascii_digit))
    });
    valid.then(|| Cow::Owned(token.replace('_', "")))
}

/// Section name to ordered values, iterated in order of first declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionMap {
    order: Vec<String>,
    values: FxHashMap<String, Vec<ConfigValue>>,
}

impl SectionMap {
    /// Values of a section, `None` if it was never declared
    pub fn get(&self, name: &str) -> Option<&[ConfigValue]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sections in order of first declaration
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ConfigValue])> {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.values[name].as_slice()))
    }

    fn open_section(&mut self, name: String) {
        if let Some(values) = self.values.get_mut(&name) {
            values.clear();
        } else {
            self.order.push(name.clone());
            self.values.insert(name, Vec::new());
        }
    }

    fn push(&mut self, section: &str, value: ConfigValue) {
        if let Some(values) = self.values.get_mut(section) {
            values.push(value);
        }
    }
}

/// Parse configuration text into sections
pub fn parse_sections(text: &str) -> SectionMap {
    let mut sections = SectionMap::default();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            let name = header.trim().to_uppercase();
            sections.open_section(name.clone());
            current = Some(name);
            continue;
        }
        let Some(section) = current.as_deref() else {
            continue;
        };
        let value = line.split_whitespace().next().and_then(ConfigValue::parse);
        if let Some(value) = value {
            sections.push(section, value);
        }
    }

    sections
}

/// Read and parse a configuration file
///
/// # Errors
///
/// Returns [`TransportError::Io`] if the file cannot be read.
pub fn load_sections<P: AsRef<Path>>(path: P) -> Result<SectionMap, TransportError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| TransportError::Io(format!("{}: {e}", path.display())))?;
    Ok(parse_sections(&contents))
}
