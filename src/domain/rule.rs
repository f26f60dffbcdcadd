//! Declarative rules and their compiled forms.
//!
//! Rules are written as plain strings in the configuration file
//! ([`ClauseRuleSpec`], [`KeyPointRuleSpec`]) and compiled once into
//! [`Rule`] and [`KeyPointRule`] when an engine is built. All patterns are
//! compiled case-insensitively.
//!
//! Key-point patterns may contain the [`GAP_PLACEHOLDER`] token, which expands
//! to a lazy wildcard spanning at most `max_gap` characters (newlines
//! included). This lets a label and its value match when they are split by
//! formatting, without hardcoding the span into each pattern.

use nonempty::NonEmpty;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::Severity;

/// Token in a key-point pattern that expands to a bounded wildcard.
pub const GAP_PLACEHOLDER: &str = "{gap}";

/// Default number of characters a [`GAP_PLACEHOLDER`] may span.
pub const DEFAULT_MAX_GAP: usize = 50;

const fn default_max_gap() -> usize {
    DEFAULT_MAX_GAP
}

/// Errors raised while compiling rule definitions.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A pattern is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        /// The pattern after gap expansion.
        pattern: String,
        /// The underlying regex error.
        source: regex::Error,
    },

    /// A key-point rule was declared without any patterns.
    #[error("key-point rule '{0}' has no patterns")]
    NoPatterns(String),
}

/// The configuration form of a clause rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseRuleSpec {
    /// Regular expression evaluated against the whole contract text.
    pub pattern: String,
    /// Message shown (and read aloud) when the rule fires.
    pub message: String,
    /// Severity of the resulting finding.
    pub severity: Severity,
}

impl ClauseRuleSpec {
    /// Convenience constructor used by the built-in rule table.
    #[must_use]
    pub fn new(pattern: &str, message: &str, severity: Severity) -> Self {
        Self {
            pattern: pattern.to_string(),
            message: message.to_string(),
            severity,
        }
    }
}

/// The configuration form of a key-point rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPointRuleSpec {
    /// Label attached to every finding the rule produces.
    pub label: String,
    /// Severity of the resulting findings.
    pub severity: Severity,
    /// Maximum span of each [`GAP_PLACEHOLDER`] in the patterns.
    #[serde(default = "default_max_gap")]
    pub max_gap: usize,
    /// Alternative patterns, evaluated in order.
    pub patterns: Vec<String>,
}

impl KeyPointRuleSpec {
    /// Convenience constructor used by the built-in rule table.
    #[must_use]
    pub fn new(label: &str, severity: Severity, max_gap: usize, patterns: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            severity,
            max_gap,
            patterns: patterns.iter().map(ToString::to_string).collect(),
        }
    }
}

/// A compiled clause rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    message: String,
    severity: Severity,
}

impl Rule {
    /// Compiles a clause rule from its configuration form.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Pattern`] if the pattern is not a valid regex.
    pub fn compile(spec: &ClauseRuleSpec) -> Result<Self, RuleError> {
        Ok(Self {
            pattern: compile_pattern(&spec.pattern)?,
            message: spec.message.clone(),
            severity: spec.severity,
        })
    }

    /// Returns `true` if the pattern matches anywhere in `text`.
    #[must_use]
    pub fn fires(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// The message attached to this rule.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The severity attached to this rule.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }
}

/// A compiled key-point rule with one or more alternative patterns.
#[derive(Debug, Clone)]
pub struct KeyPointRule {
    label: String,
    severity: Severity,
    max_gap: usize,
    patterns: NonEmpty<Regex>,
}

impl KeyPointRule {
    /// Compiles a key-point rule, expanding gap placeholders with the rule's
    /// `max_gap`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::NoPatterns`] if the rule has no patterns, or
    /// [`RuleError::Pattern`] if any expanded pattern is not a valid regex.
    pub fn compile(spec: &KeyPointRuleSpec) -> Result<Self, RuleError> {
        let compiled = spec
            .patterns
            .iter()
            .map(|pattern| compile_pattern(&expand_gaps(pattern, spec.max_gap)))
            .collect::<Result<Vec<_>, _>>()?;

        let patterns =
            NonEmpty::from_vec(compiled).ok_or_else(|| RuleError::NoPatterns(spec.label.clone()))?;

        Ok(Self {
            label: spec.label.clone(),
            severity: spec.severity,
            max_gap: spec.max_gap,
            patterns,
        })
    }

    /// Every non-overlapping match, pattern by pattern, in match order.
    ///
    /// Matches are returned untrimmed.
    pub fn matches<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> {
        self.patterns
            .iter()
            .flat_map(move |pattern| pattern.find_iter(text).map(|m| m.as_str()))
    }

    /// The label attached to every finding of this rule.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The severity attached to every finding of this rule.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// The gap bound the patterns were compiled with.
    #[must_use]
    pub const fn max_gap(&self) -> usize {
        self.max_gap
    }
}

/// Replaces every [`GAP_PLACEHOLDER`] with a lazy wildcard of at most
/// `max_gap` characters.
#[must_use]
pub fn expand_gaps(pattern: &str, max_gap: usize) -> String {
    pattern.replace(GAP_PLACEHOLDER, &format!("(?s:.{{0,{max_gap}}}?)"))
}

fn compile_pattern(pattern: &str) -> Result<Regex, RuleError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| RuleError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}
