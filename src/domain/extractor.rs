//! Key-point extraction: pull labelled values out of contract text.
//!
//! Unlike the clause scanner, which only reports that a rule fired, the
//! extractor records the literal text each pattern matched. Every
//! non-overlapping match of every pattern is collected, then deduplicated by
//! `(label, matched text)`. Findings come out in rule order, then pattern
//! order, then match position.

use std::collections::HashSet;

use tracing::instrument;

use super::{
    Finding, Severity,
    rule::{KeyPointRule, KeyPointRuleSpec, RuleError},
};

/// Label of the sentinel finding returned when nothing is extracted.
pub const NO_KEY_POINTS: &str = "No key points detected";

/// Evaluates an ordered table of key-point rules against contract text.
#[derive(Debug, Clone)]
pub struct KeyPointExtractor {
    rules: Vec<KeyPointRule>,
}

impl KeyPointExtractor {
    /// Creates an extractor from already compiled rules.
    #[must_use]
    pub const fn new(rules: Vec<KeyPointRule>) -> Self {
        Self { rules }
    }

    /// Compiles an extractor from rule definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if any rule has no patterns or a pattern fails to
    /// compile.
    pub fn compile(specs: &[KeyPointRuleSpec]) -> Result<Self, RuleError> {
        let rules = specs
            .iter()
            .map(KeyPointRule::compile)
            .collect::<Result<_, _>>()?;
        Ok(Self::new(rules))
    }

    /// The compiled rules, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[KeyPointRule] {
        &self.rules
    }

    /// Extracts every key point from `text`.
    ///
    /// Never returns an empty list: when nothing matches, the result is a
    /// single Info finding labelled [`NO_KEY_POINTS`].
    #[instrument(level = "debug", skip_all, fields(len = text.len()))]
    pub fn extract(&self, text: &str) -> Vec<Finding> {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut findings = Vec::new();

        for rule in &self.rules {
            for matched in rule.matches(text) {
                let matched = matched.trim();
                if matched.is_empty() || !seen.insert((rule.label(), matched)) {
                    continue;
                }
                findings.push(Finding::with_match(rule.label(), matched, rule.severity()));
            }
        }

        tracing::debug!("extracted {} key points", findings.len());

        if findings.is_empty() {
            findings.push(Finding::new(NO_KEY_POINTS, Severity::Info));
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::default_key_point_rules;

    fn extractor() -> KeyPointExtractor {
        KeyPointExtractor::compile(&default_key_point_rules()).unwrap()
    }

    fn spec(label: &str, patterns: &[&str]) -> KeyPointRuleSpec {
        KeyPointRuleSpec::new(label, Severity::Info, 20, patterns)
    }

    const CONTRACT: &str = "\
RETAIL INSTALLMENT CONTRACT

Amount Financed: $18,500.00
Annual Percentage Rate (APR)      6.9%
Term: 60 months

Your monthly payment
will be $365.45 starting March 1. A late fee of $35 is charged after 10 days.
If you end early, an early termination fee of $500 applies.";

    #[test]
    fn extracts_labelled_values_from_contract() {
        let findings = extractor().extract(CONTRACT);

        let labels: Vec<_> = findings.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "Amount financed",
                "Monthly payment",
                "Interest rate",
                "Loan term",
                "Late fee",
                "Early termination fee",
            ]
        );

        let payment = &findings[1];
        assert_eq!(
            payment.matched_text.as_deref(),
            Some("monthly payment\nwill be $365.45")
        );
        assert_eq!(
            findings[2].matched_text.as_deref(),
            Some("Annual Percentage Rate (APR)      6.9%")
        );
        assert_eq!(findings[5].severity, Severity::Risk);
    }

    #[test]
    fn collects_every_match_in_position_order() {
        let extractor = KeyPointExtractor::compile(&[spec("Fee", &[r"fee of \$\d+"])]).unwrap();
        let findings = extractor.extract("A fee of $10, later a fee of $20.");

        let texts: Vec<_> = findings
            .iter()
            .filter_map(|f| f.matched_text.as_deref())
            .collect();
        assert_eq!(texts, ["fee of $10", "fee of $20"]);
    }

    #[test]
    fn deduplicates_identical_matches_across_patterns() {
        let extractor =
            KeyPointExtractor::compile(&[spec("Fee", &[r"fee of \$\d+", r"fee of \$10"])])
                .unwrap();
        let findings = extractor.extract("A fee of $10. Again, a fee of $10.");

        assert_eq!(findings, [Finding::with_match("Fee", "fee of $10", Severity::Info)]);
    }

    #[test]
    fn same_text_under_different_labels_is_kept() {
        let extractor = KeyPointExtractor::compile(&[
            spec("First", &[r"fee of \$\d+"]),
            spec("Second", &[r"fee of \$\d+"]),
        ])
        .unwrap();
        let findings = extractor.extract("a fee of $10");

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].label, "First");
        assert_eq!(findings[1].label, "Second");
    }

    #[test]
    fn matched_text_is_trimmed_before_dedup() {
        let extractor =
            KeyPointExtractor::compile(&[spec("Term", &[r"\s*term \d+", r"term \d+\s*"])]).unwrap();
        let findings = extractor.extract(" term 12 ");

        assert_eq!(findings, [Finding::with_match("Term", "term 12", Severity::Info)]);
    }

    #[test]
    fn never_returns_duplicate_pairs() {
        let findings = extractor().extract(&CONTRACT.repeat(3));
        let unique: HashSet<_> = findings
            .iter()
            .map(|f| (f.label.clone(), f.matched_text.clone()))
            .collect();
        assert_eq!(unique.len(), findings.len());
    }

    #[test]
    fn sentinel_when_nothing_matches() {
        let findings = extractor().extract("This agreement is governed by the laws of Ohio.");
        assert_eq!(findings, [Finding::new(NO_KEY_POINTS, Severity::Info)]);
    }

    #[test]
    fn sentinel_for_empty_text() {
        let findings = extractor().extract("");
        assert_eq!(findings, [Finding::new(NO_KEY_POINTS, Severity::Info)]);
    }
}
