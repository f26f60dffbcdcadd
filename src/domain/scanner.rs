//! Clause scanning: flag risky contract clauses with whole-text rules.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{
    Finding, Severity,
    rule::{ClauseRuleSpec, Rule, RuleError},
};

/// Returned when there is no text to scan.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("no contract text provided: paste text or load a document before analyzing")]
pub struct EmptyInputError;

/// The outcome of a clause scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// The text broken into sentences, in order.
    pub sentences: Vec<String>,
    /// Findings in rule-table order.
    pub findings: Vec<Finding>,
}

/// Evaluates an ordered table of clause rules against contract text.
#[derive(Debug, Clone)]
pub struct ClauseScanner {
    rules: Vec<Rule>,
    fallback_message: Option<String>,
}

impl ClauseScanner {
    /// Creates a scanner from already compiled rules.
    #[must_use]
    pub const fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            fallback_message: None,
        }
    }

    /// Compiles a scanner from rule definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if any rule pattern fails to compile.
    pub fn compile(specs: &[ClauseRuleSpec]) -> Result<Self, RuleError> {
        let rules = specs.iter().map(Rule::compile).collect::<Result<_, _>>()?;
        Ok(Self::new(rules))
    }

    /// Sets a message to report as a single Info finding when no rule fires.
    #[must_use]
    pub fn with_fallback_message(mut self, message: Option<String>) -> Self {
        self.fallback_message = message;
        self
    }

    /// The compiled rules, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Scans the text, returning its sentences and the rules that fired.
    ///
    /// Each rule is evaluated against the whole text and fires at most once.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyInputError`] if the text is empty after trimming.
    #[instrument(level = "debug", skip_all, fields(len = text.len()))]
    pub fn scan(&self, text: &str) -> Result<ScanReport, EmptyInputError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EmptyInputError);
        }

        let mut findings: Vec<Finding> = self
            .rules
            .iter()
            .filter(|rule| rule.fires(text))
            .inspect(|rule| tracing::debug!("clause rule fired: {}", rule.message()))
            .map(|rule| Finding::new(rule.message(), rule.severity()))
            .collect();

        if findings.is_empty() {
            if let Some(message) = &self.fallback_message {
                tracing::debug!("no clause rule fired, using fallback message");
                findings.push(Finding::new(message.as_str(), Severity::Info));
            }
        }

        Ok(ScanReport {
            sentences: split_sentences(text),
            findings,
        })
    }
}

/// Splits text into sentences.
///
/// A split happens right after `.`, `!` or `?` when followed by whitespace.
/// The whitespace belongs to neither sentence. Blank fragments are dropped.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_some_and(|(_, next)| next.is_whitespace());
        if !at_boundary {
            continue;
        }

        // Terminators are single-byte, so `index` is the last byte of the sentence.
        push_sentence(&mut sentences, &text[start..=index]);
        while chars.next_if(|(_, next)| next.is_whitespace()).is_some() {}
        start = chars.peek().map_or(text.len(), |(next, _)| *next);
    }
    push_sentence(&mut sentences, &text[start..]);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, fragment: &str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        sentences.push(fragment.to_string());
    }
}
