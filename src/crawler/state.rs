//! Discovered article identifiers for one crawl run

use percent_encoding::percent_decode_str;
use std::collections::HashSet;

/// Ordered, de-duplicated article identifiers gathered across listing pages
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    identifiers: Vec<String>,
    seen: HashSet<String>,
}

impl CrawlState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Append identifiers not seen before, keeping discovery order.
    /// Returns how many were added.
    pub fn extend<I, S>(&mut self, identifiers: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.identifiers.len();
        for identifier in identifiers {
            let identifier = identifier.into();
            if self.seen.insert(dedup_key(&identifier)) {
                self.identifiers.push(identifier);
            }
        }
        self.identifiers.len() - before
    }

    /// Number of distinct identifiers collected
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Whether nothing has been collected
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Drop everything past the first `len` identifiers
    pub fn truncate(&mut self, len: usize) {
        for dropped in self.identifiers.drain(len.min(self.identifiers.len())..) {
            self.seen.remove(&dedup_key(&dropped));
        }
    }

    /// All identifiers in discovery order
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// The `[offset, offset + limit)` slice, clamped to what was collected
    pub fn window(&self, offset: usize, limit: usize) -> &[String] {
        let start = offset.min(self.identifiers.len());
        let end = offset.saturating_add(limit).min(self.identifiers.len());
        &self.identifiers[start..end]
    }
}

/// Key used to detect repeated identifiers: percent-decoded,
/// case-insensitive, with underscores and spaces treated alike
pub fn dedup_key(identifier: &str) -> String {
    percent_decode_str(identifier)
        .decode_utf8_lossy()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
