//! Identifier scheme for requirement documents
//!
//! Identifiers look like `REQ-7` or `REQ-007`: a fixed prefix, a dash and a
//! run of decimal digits. Every collection shares one prefix and, once
//! renumbered, one padding width derived from its document count.

use regex::Regex;
use std::cmp::Ordering;

/// Default identifier prefix
pub const DEFAULT_PREFIX: &str = "REQ";

/// Default marker used to build quarantine keys during a rename
pub const DEFAULT_QUARANTINE_MARKER: &str = "TEMP";

/// Describes how identifiers and storage keys are spelled in a collection
#[derive(Debug, Clone)]
pub struct IdScheme {
    prefix: String,
    quarantine_marker: String,
    key_pattern: Regex,
    token_pattern: Regex,
    declared_pattern: Regex,
}

impl IdScheme {
    /// Creates a scheme for the given prefix and quarantine marker.
    ///
    /// The marker must contain at least one non-digit character so that a
    /// quarantine key can never be mistaken for an identifier.
    pub fn new(prefix: &str, quarantine_marker: &str) -> anyhow::Result<Self> {
        if prefix.is_empty() {
            anyhow::bail!("Identifier prefix must not be empty");
        }
        if quarantine_marker.is_empty() || quarantine_marker.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!(
                "Quarantine marker '{}' must contain a non-digit character",
                quarantine_marker
            );
        }

        let escaped = regex::escape(prefix);
        let key_pattern = Regex::new(&format!(r"^{}-([0-9]+)$", escaped))?;
        let token_pattern = Regex::new(&format!(r"\b{}-([0-9]+)\b", escaped))?;
        let declared_pattern = Regex::new(&format!(r"\*\*ID:\*\*\s*({}-[0-9]+)", escaped))?;

        Ok(Self {
            prefix: prefix.to_string(),
            quarantine_marker: quarantine_marker.to_string(),
            key_pattern,
            token_pattern,
            declared_pattern,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the digit run of a storage key, or `None` when the key is not
    /// an identifier of this scheme
    pub fn digits<'a>(&self, key: &'a str) -> Option<&'a str> {
        self.key_pattern
            .captures(key)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// True when `key` is exactly `PREFIX-<digits>`
    pub fn is_identifier(&self, key: &str) -> bool {
        self.key_pattern.is_match(key)
    }

    /// True when `key` starts with `PREFIX-`, identifier or not
    pub fn is_prefixed(&self, key: &str) -> bool {
        key.strip_prefix(self.prefix.as_str())
            .map_or(false, |rest| rest.starts_with('-'))
    }

    /// Formats the n-th identifier zero-padded to `pad` digits
    pub fn format(&self, number: usize, pad: usize) -> String {
        format!("{}-{:0width$}", self.prefix, number, width = pad)
    }

    /// Regex matching identifier tokens inside free text, bounded on both
    /// sides so `REQ-1` never matches inside `REQ-10`
    pub fn token_regex(&self) -> &Regex {
        &self.token_pattern
    }

    /// Identifier declared in a document's `**ID:**` field, if any
    pub fn declared_id<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.declared_pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Temporary key used while a document is moved out of the way.
    ///
    /// Injective in `old_key` and disjoint from every identifier because the
    /// marker is never all digits.
    pub fn quarantine_key(&self, old_key: &str) -> String {
        format!("{}-{}-{}", self.prefix, self.quarantine_marker, old_key)
    }

    pub fn is_quarantine_key(&self, key: &str) -> bool {
        key.starts_with(&format!("{}-{}-", self.prefix, self.quarantine_marker))
    }
}

/// Number of decimal digits needed to print `total`
pub fn pad_width(total: usize) -> usize {
    total.to_string().len()
}

/// Compares two digit strings by numeric value without parsing them, so
/// arbitrarily long runs never overflow
pub fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
