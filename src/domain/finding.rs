use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// How much attention a finding deserves.
///
/// Ordered from least to most serious, so `Severity::Risk > Severity::Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth knowing, no action needed.
    Info,
    /// Read carefully before signing.
    Warning,
    /// Likely to cost money or rights.
    Risk,
}

impl Severity {
    /// Returns the lowercase name used in config files and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Risk => "risk",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity name is not recognised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown severity '{0}': expected one of info, warning, risk")]
pub struct UnknownSeverityError(String);

impl FromStr for Severity {
    type Err = UnknownSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "risk" => Ok(Self::Risk),
            _ => Err(UnknownSeverityError(s.to_string())),
        }
    }
}

/// A single result produced by evaluating a rule against contract text.
///
/// Clause findings carry only a label (the rule's message). Key-point
/// findings also carry the literal text that was extracted. Two findings are
/// the same key point when their `(label, matched_text)` pairs are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    /// The rule message or key-point label.
    pub label: String,

    /// The trimmed substring that matched, for key-point findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,

    /// How serious the finding is.
    pub severity: Severity,
}

impl Finding {
    /// Creates a finding with no extracted text.
    #[must_use]
    pub fn new(label: impl Into<String>, severity: Severity) -> Self {
        Self {
            label: label.into(),
            matched_text: None,
            severity,
        }
    }

    /// Creates a finding carrying the text a pattern extracted.
    #[must_use]
    pub fn with_match(
        label: impl Into<String>,
        matched_text: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            label: label.into(),
            matched_text: Some(matched_text.into()),
            severity,
        }
    }

    /// The text a speech layer should read for this finding.
    ///
    /// Key points read as `"label: text"`, clause findings read their message.
    #[must_use]
    pub fn utterance(&self) -> String {
        match &self.matched_text {
            Some(text) => format!("{}: {}", self.label, text),
            None => self.label.clone(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.utterance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_seriousness() {
        assert!(Severity::Risk > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("RISK".parse::<Severity>().unwrap(), Severity::Risk);
        assert_eq!(" warning ".parse::<Severity>().unwrap(), Severity::Warning);
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn utterance_reads_label_and_text_for_key_points() {
        let finding =
            Finding::with_match("Monthly payment", "monthly payment of $450.00", Severity::Info);
        assert_eq!(
            finding.utterance(),
            "Monthly payment: monthly payment of $450.00"
        );
    }

    #[test]
    fn utterance_reads_message_for_clauses() {
        let finding = Finding::new("There may be a large payment at the end.", Severity::Risk);
        assert_eq!(finding.utterance(), "There may be a large payment at the end.");
        assert_eq!(
            finding.to_string(),
            "[risk] There may be a large payment at the end."
        );
    }

    #[test]
    fn serializes_severity_lowercase_and_skips_missing_match() {
        let json = serde_json::to_string(&Finding::new("x", Severity::Warning)).unwrap();
        assert_eq!(json, r#"{"label":"x","severity":"warning"}"#);
    }
}
