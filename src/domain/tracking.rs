//! Shipment tracking-number extraction.
//!
//! Finds UPS-style tracking numbers (`1Z` followed by 16 alphanumerics) in
//! page text. Text from scans often breaks numbers across spaces and lines, so
//! whitespace is removed before matching.

use std::{collections::HashSet, fmt, sync::LazyLock};

use regex::Regex;
use serde::{Serialize, Serializer};

// ASCII-only case folding: every match is exactly 18 bytes.
static TRACKING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u)1Z[A-Z0-9]{16}").expect("tracking number pattern is valid")
});

/// Raised when no tracking numbers are found in a document.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrackingError {
    /// Nothing matched on any scanned page.
    #[error("no tracking numbers found in {pages_scanned} scanned page(s)")]
    NoneFound {
        /// How many pages were searched.
        pages_scanned: usize,
    },
}

/// A normalised 18-character tracking number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Normalises a raw match: uppercase, with `O` read as `0`.
    fn from_match(raw: &str) -> Self {
        Self(raw.to_ascii_uppercase().replace('O', "0"))
    }

    /// The number without spacing.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number grouped for reading, e.g. `1Z 999 AA1 01 2345 6784`.
    #[must_use]
    pub fn formatted(&self) -> String {
        const GROUPS: [usize; 6] = [2, 3, 3, 2, 4, 4];

        let mut out = String::with_capacity(self.0.len() + GROUPS.len());
        let mut rest = self.0.as_str();
        for width in GROUPS {
            let (group, tail) = rest.split_at(width.min(rest.len()));
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(group);
            rest = tail;
        }
        out
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for TrackingNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Extracts tracking numbers page by page.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackingExtractor {
    even_pages_only: bool,
}

impl TrackingExtractor {
    /// Creates an extractor. With `even_pages_only`, pages 1, 3, 5, ... are
    /// skipped (pages are counted from 1).
    #[must_use]
    pub const fn new(even_pages_only: bool) -> Self {
        Self { even_pages_only }
    }

    /// Extracts every distinct tracking number, in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::NoneFound`] if no page yields a number.
    pub fn extract_pages<S: AsRef<str>>(
        &self,
        pages: &[S],
    ) -> Result<Vec<TrackingNumber>, TrackingError> {
        let mut seen = HashSet::new();
        let mut numbers = Vec::new();
        let mut pages_scanned = 0;

        for (index, page) in pages.iter().enumerate() {
            let page_number = index + 1;
            if self.even_pages_only && page_number % 2 != 0 {
                continue;
            }
            pages_scanned += 1;

            let found = extract_text(page.as_ref());
            tracing::debug!("page {page_number}: {} tracking number(s)", found.len());
            for number in found {
                if seen.insert(number.clone()) {
                    numbers.push(number);
                }
            }
        }

        if numbers.is_empty() {
            return Err(TrackingError::NoneFound { pages_scanned });
        }
        Ok(numbers)
    }
}

/// Extracts tracking numbers from a single block of text, keeping duplicates.
#[must_use]
pub fn extract_text(text: &str) -> Vec<TrackingNumber> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    TRACKING_NUMBER
        .find_iter(&compact)
        .map(|m| TrackingNumber::from_match(m.as_str()))
        .collect()
}
