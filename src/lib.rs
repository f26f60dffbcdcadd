//! Contract clause scanning and tariff/duty calculation
//!
//! Vehicle finance contracts are checked against declarative rule tables, and
//! shipments are priced against rate tables loaded from a TOML configuration.

pub mod domain;
pub use domain::{
    ClauseScanner, Config, Finding, HsTariffTable, KeyPointExtractor, Severity, TariffCalculator,
    TariffRequest, TariffResult, TrackingExtractor,
};

/// Loading contract documents from disk or stdin.
pub mod storage;
pub use storage::{Document, LoadError};
