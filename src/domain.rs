//! Domain models for contract review and duty calculation.
//!
//! This module contains the evaluation engines, the rule and rate tables they
//! are built from, and the configuration that ties them together. Every engine
//! is a pure, synchronous function of its input and its injected tables.

/// Findings and their severity.
pub mod finding;
pub use finding::{Finding, Severity, UnknownSeverityError};

/// Rule definitions and their compiled forms.
pub mod rule;
pub use rule::{ClauseRuleSpec, KeyPointRule, KeyPointRuleSpec, Rule, RuleError};

/// Whole-text clause scanning.
pub mod scanner;
pub use scanner::{ClauseScanner, EmptyInputError, ScanReport, split_sentences};

/// Extraction of labelled values from contract text.
pub mod extractor;
pub use extractor::{KeyPointExtractor, NO_KEY_POINTS};

/// Decimal helpers.
pub mod money;

/// Tariff and duty calculation.
pub mod tariff;
pub use tariff::{
    CountryCode, FeeSchedule, TableError, TariffCalculator, TariffRequest, TariffResult,
    TariffTable, TradeAgreement, ValidationError,
};

/// Duty quotes by HS code.
pub mod hs;
pub use hs::{HsQuote, HsTariffTable, QuoteError};

/// Shipment tracking numbers.
pub mod tracking;
pub use tracking::{TrackingError, TrackingExtractor, TrackingNumber};

/// Versioned configuration.
pub mod config;
pub use config::{Config, ConfigError};
