use std::{collections::BTreeMap, io, path::Path};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    ClauseScanner, FeeSchedule, HsTariffTable, KeyPointExtractor, Severity, TariffCalculator,
    TariffTable, TrackingExtractor,
    rule::{ClauseRuleSpec, KeyPointRuleSpec, RuleError},
    tariff::{DestinationFees, ProcessingFee},
};

/// Errors raised while loading or saving a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[source] io::Error),

    /// The file is not a valid configuration.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file could not be written.
    #[error("failed to write config file: {0}")]
    Write(#[source] io::Error),
}

/// Rule tables and rate tables for every engine.
///
/// Any section missing from the file falls back to the built-in tables, so a
/// file containing only `_version = "1"` is the default configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Clause rules and the optional fallback message.
    pub scanner: ScannerConfig,
    /// Key-point rules.
    pub extractor: ExtractorConfig,
    /// Category/route rates and destination fees.
    pub tariff: TariffConfig,
    /// Rates by HS code and destination.
    pub hs: HsConfig,
    /// Tracking-number extraction settings.
    pub tracking: TrackingConfig,
}

/// Clause scanner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Message reported as an Info finding when no rule fires.
    ///
    /// When unset, a scan with no matches returns no findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_message: Option<String>,

    /// Rules, in reporting order. Defaults to the built-in rules.
    #[serde(default = "default_clause_rules")]
    pub rules: Vec<ClauseRuleSpec>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            fallback_message: None,
            rules: default_clause_rules(),
        }
    }
}

/// Key-point extractor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Rules, in reporting order. Defaults to the built-in rules.
    #[serde(default = "default_key_point_rules")]
    pub rules: Vec<KeyPointRuleSpec>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            rules: default_key_point_rules(),
        }
    }
}

/// Tariff calculator tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffConfig {
    /// Rates by category and route.
    pub rates: TariffTable,
    /// Additional fees by destination.
    #[serde(default)]
    pub fees: FeeSchedule,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            rates: default_tariff_table(),
            fees: default_fee_schedule(),
        }
    }
}

/// HS-code quote table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsConfig {
    /// Rates by HS code and destination.
    pub rates: HsTariffTable,
}

impl Default for HsConfig {
    fn default() -> Self {
        Self {
            rates: default_hs_table(),
        }
    }
}

/// Tracking-number extraction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Only scan pages 2, 4, 6, ...
    pub even_pages_only: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            even_pages_only: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            extractor: ExtractorConfig::default(),
            tariff: TariffConfig::default(),
            hs: HsConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid, including a tariff category without a `default` rate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the configuration if the file exists, otherwise the built-in
    /// tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using built-in tables", path.display());
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Compiles the clause scanner.
    ///
    /// # Errors
    ///
    /// Returns an error if a clause pattern is invalid.
    pub fn clause_scanner(&self) -> Result<ClauseScanner, RuleError> {
        Ok(ClauseScanner::compile(&self.scanner.rules)?
            .with_fallback_message(self.scanner.fallback_message.clone()))
    }

    /// Compiles the key-point extractor.
    ///
    /// # Errors
    ///
    /// Returns an error if a key-point rule is invalid.
    pub fn key_point_extractor(&self) -> Result<KeyPointExtractor, RuleError> {
        KeyPointExtractor::compile(&self.extractor.rules)
    }

    /// Builds the tariff calculator.
    #[must_use]
    pub fn tariff_calculator(&self) -> TariffCalculator {
        TariffCalculator::new(self.tariff.rates.clone(), self.tariff.fees.clone())
    }

    /// Builds the tracking-number extractor.
    #[must_use]
    pub const fn tracking_extractor(&self) -> TrackingExtractor {
        TrackingExtractor::new(self.tracking.even_pages_only)
    }
}

/// The built-in clause rules for vehicle finance contracts.
#[must_use]
pub fn default_clause_rules() -> Vec<ClauseRuleSpec> {
    vec![
        ClauseRuleSpec::new(
            "early termination|cancellation fee",
            "High Risk: Check for fees if you end the contract early.",
            Severity::Risk,
        ),
        ClauseRuleSpec::new(
            "balloon payment|final payment",
            "High Risk: There may be a large payment at the end.",
            Severity::Risk,
        ),
        ClauseRuleSpec::new(
            "variable interest|APR may change",
            "Important: Your interest rate could go up.",
            Severity::Warning,
        ),
        ClauseRuleSpec::new(
            "repossession|take back vehicle",
            "High Risk: They can take the car if you miss payments.",
            Severity::Risk,
        ),
        ClauseRuleSpec::new(
            "penalty|late fee",
            "Important: Extra costs if you miss or delay payments.",
            Severity::Warning,
        ),
        ClauseRuleSpec::new(
            "mandatory insurance|GAP insurance",
            "Important: You might be required to buy extra insurance.",
            Severity::Warning,
        ),
    ]
}

/// The built-in key-point rules for vehicle finance contracts.
#[must_use]
pub fn default_key_point_rules() -> Vec<KeyPointRuleSpec> {
    vec![
        KeyPointRuleSpec::new(
            "Amount financed",
            Severity::Info,
            30,
            &[r"amount financed{gap}\$\s?\d[\d,]*(?:\.\d{2})?"],
        ),
        KeyPointRuleSpec::new(
            "Monthly payment",
            Severity::Info,
            50,
            &[r"monthly payment{gap}\$\s?\d[\d,]*(?:\.\d{2})?"],
        ),
        KeyPointRuleSpec::new(
            "Interest rate",
            Severity::Warning,
            40,
            &[r"(?:annual percentage rate|\bAPR\b|interest rate){gap}\d+(?:\.\d+)?\s?%"],
        ),
        KeyPointRuleSpec::new(
            "Loan term",
            Severity::Info,
            20,
            &[r"\bterm\b{gap}\d+\s?(?:months|years)"],
        ),
        KeyPointRuleSpec::new(
            "Down payment",
            Severity::Info,
            50,
            &[r"down payment{gap}\$\s?\d[\d,]*(?:\.\d{2})?"],
        ),
        KeyPointRuleSpec::new(
            "Late fee",
            Severity::Warning,
            30,
            &[
                r"late (?:fee|charge){gap}\$\s?\d[\d,]*(?:\.\d{2})?",
                r"late (?:fee|charge){gap}\d+(?:\.\d+)?\s?%",
            ],
        ),
        KeyPointRuleSpec::new(
            "Balloon payment",
            Severity::Risk,
            50,
            &[r"(?:balloon|final) payment{gap}\$\s?\d[\d,]*(?:\.\d{2})?"],
        ),
        KeyPointRuleSpec::new(
            "Early termination fee",
            Severity::Risk,
            50,
            &[
                concat!(
                    r"(?:early termination|cancellation) (?:fee|charge|penalty)",
                    r"{gap}\$\s?\d[\d,]*(?:\.\d{2})?",
                ),
            ],
        ),
    ]
}

fn routes(entries: &[(&str, i64)]) -> BTreeMap<String, Decimal> {
    entries
        .iter()
        .map(|(route, tenths)| ((*route).to_string(), Decimal::new(*tenths, 1)))
        .collect()
}

/// The built-in tariff rates (percent) by category and route.
#[must_use]
pub fn default_tariff_table() -> TariffTable {
    let categories: BTreeMap<String, BTreeMap<String, Decimal>> = [
        (
            "electronics",
            routes(&[
                ("CN-US", 250),
                ("MX-US", 0),
                ("CA-US", 0),
                ("DE-US", 35),
                ("JP-US", 0),
                ("KR-US", 0),
                ("GB-US", 0),
                ("default", 50),
            ]),
        ),
        (
            "textiles",
            routes(&[
                ("CN-US", 150),
                ("VN-US", 180),
                ("IN-US", 120),
                ("MX-US", 0),
                ("CA-US", 0),
                ("default", 100),
            ]),
        ),
        (
            "automotive",
            routes(&[("default", 25), ("CN-US", 275), ("MX-US", 0), ("CA-US", 0)]),
        ),
        (
            "machinery",
            routes(&[("default", 37), ("CN-US", 75), ("DE-US", 21), ("JP-US", 0)]),
        ),
        (
            "chemicals",
            routes(&[("default", 65), ("CN-US", 100), ("DE-US", 32)]),
        ),
        ("food", routes(&[("default", 80), ("MX-US", 0), ("CA-US", 0)])),
        (
            "furniture",
            routes(&[("default", 70), ("CN-US", 250), ("IT-US", 40)]),
        ),
        ("toys", routes(&[("default", 0), ("CN-US", 0)])),
        ("medical", routes(&[("default", 0), ("CN-US", 75)])),
        ("jewelry", routes(&[("default", 50), ("CN-US", 120)])),
        ("books", routes(&[("default", 0)])),
        ("sports", routes(&[("default", 40), ("CN-US", 150)])),
    ]
    .into_iter()
    .map(|(category, routes)| (category.to_string(), routes))
    .collect();

    TariffTable::new(categories).expect("built-in tariff table has a default for every category")
}

/// The built-in fee schedule: US harbor maintenance and merchandise
/// processing fees.
#[must_use]
pub fn default_fee_schedule() -> FeeSchedule {
    let us = DestinationFees {
        harbor_maintenance_percent: Decimal::new(125, 3),
        processing: ProcessingFee {
            rate_percent: Decimal::new(3464, 4),
            min: Decimal::new(200, 2),
            max: Decimal::new(48500, 2),
        },
    };
    FeeSchedule::new(BTreeMap::from([("US".to_string(), us)]))
}

/// The built-in HS-code rates: rice, computers and T-shirts.
#[must_use]
pub fn default_hs_table() -> HsTariffTable {
    HsTariffTable::new(BTreeMap::from([
        ("1006".to_string(), routes(&[("US", 100), ("EU", 0)])),
        ("8471".to_string(), routes(&[("US", 0), ("EU", 0)])),
        ("6109".to_string(), routes(&[("US", 165), ("EU", 120)])),
    ]))
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        scanner: ScannerConfig,

        #[serde(default)]
        extractor: ExtractorConfig,

        #[serde(default)]
        tariff: TariffConfig,

        #[serde(default)]
        hs: HsConfig,

        #[serde(default)]
        tracking: TrackingConfig,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                scanner,
                extractor,
                tariff,
                hs,
                tracking,
            } => Self {
                scanner,
                extractor,
                tariff,
                hs,
                tracking,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            scanner: config.scanner,
            extractor: config.extractor,
            tariff: config.tariff,
            hs: config.hs,
            tracking: config.tracking,
        }
    }
}
