//! Duty quotes by harmonized-system (HS) code.
//!
//! A simpler lookup than [`TariffCalculator`](super::TariffCalculator): one
//! rate per HS code and destination, with no route, agreement or fee logic.
//! Unlike the category table, a missing entry is an error.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{format_amount, percent_of};

/// Errors raised by [`HsTariffTable::quote`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuoteError {
    /// The declared value is zero or negative.
    #[error("invalid value for product: {0}")]
    InvalidValue(Decimal),

    /// The table has no rate for this code and destination.
    #[error("no tariff data found for HS code {hs_code} to {destination}")]
    NoTariffData {
        /// The HS code that was looked up.
        hs_code: String,
        /// The destination that was looked up.
        destination: String,
    },

    /// The amounts are too large to represent.
    #[error("value is too large to quote")]
    Overflow,
}

/// Percentage rates by HS code, then by destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, BTreeMap<String, Decimal>>")]
#[serde(into = "BTreeMap<String, BTreeMap<String, Decimal>>")]
pub struct HsTariffTable {
    codes: BTreeMap<String, BTreeMap<String, Decimal>>,
}

impl HsTariffTable {
    /// Builds a table. Destination keys are uppercased.
    #[must_use]
    pub fn new(codes: BTreeMap<String, BTreeMap<String, Decimal>>) -> Self {
        let codes = codes
            .into_iter()
            .map(|(code, destinations)| {
                let destinations = destinations
                    .into_iter()
                    .map(|(dest, rate)| (dest.trim().to_ascii_uppercase(), rate))
                    .collect();
                (code.trim().to_string(), destinations)
            })
            .collect();
        Self { codes }
    }

    /// Quotes the duty for goods of `value` under `hs_code` entering
    /// `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::InvalidValue`] for a non-positive value and
    /// [`QuoteError::NoTariffData`] when the code/destination pair is not in
    /// the table.
    pub fn quote(
        &self,
        hs_code: &str,
        destination: &str,
        value: Decimal,
    ) -> Result<HsQuote, QuoteError> {
        if value <= Decimal::ZERO {
            return Err(QuoteError::InvalidValue(value));
        }

        let hs_code = hs_code.trim();
        let destination = destination.trim().to_ascii_uppercase();

        let rate_percent = self
            .codes
            .get(hs_code)
            .and_then(|destinations| destinations.get(&destination))
            .copied()
            .ok_or_else(|| QuoteError::NoTariffData {
                hs_code: hs_code.to_string(),
                destination: destination.clone(),
            })?;

        let duty = percent_of(value, rate_percent).ok_or(QuoteError::Overflow)?;
        let total = value.checked_add(duty).ok_or(QuoteError::Overflow)?;
        tracing::debug!("HS {hs_code} to {destination}: {rate_percent}%, duty {duty}");

        Ok(HsQuote {
            hs_code: hs_code.to_string(),
            destination,
            value,
            rate_percent,
            duty,
            total,
        })
    }
}

impl From<BTreeMap<String, BTreeMap<String, Decimal>>> for HsTariffTable {
    fn from(codes: BTreeMap<String, BTreeMap<String, Decimal>>) -> Self {
        Self::new(codes)
    }
}

impl From<HsTariffTable> for BTreeMap<String, BTreeMap<String, Decimal>> {
    fn from(table: HsTariffTable) -> Self {
        table.codes
    }
}

/// A duty quote for one HS code and destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsQuote {
    /// The HS code quoted.
    pub hs_code: String,
    /// The destination, uppercased.
    pub destination: String,
    /// The declared value.
    pub value: Decimal,
    /// The duty rate.
    pub rate_percent: Decimal,
    /// Duty owed.
    pub duty: Decimal,
    /// Value plus duty.
    pub total: Decimal,
}

impl HsQuote {
    /// The customer-facing summary line.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Customer must pay ${} in tariffs/duties.",
            format_amount(self.duty)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::default_hs_table;

    #[test]
    fn quotes_t_shirts_into_us() {
        let quote = default_hs_table()
            .quote("6109", "us", Decimal::from(200))
            .unwrap();

        assert_eq!(quote.destination, "US");
        assert_eq!(quote.rate_percent, Decimal::new(165, 1));
        assert_eq!(format_amount(quote.duty), "33.00");
        assert_eq!(format_amount(quote.total), "233.00");
        assert_eq!(quote.message(), "Customer must pay $33.00 in tariffs/duties.");
    }

    #[test]
    fn zero_rate_is_a_valid_quote() {
        let quote = default_hs_table()
            .quote("8471", "EU", Decimal::from(999))
            .unwrap();
        assert_eq!(quote.duty, Decimal::ZERO);
        assert_eq!(quote.total, Decimal::from(999));
    }

    #[test]
    fn missing_pair_is_an_error() {
        let error = default_hs_table()
            .quote("1006", "JP", Decimal::from(10))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "no tariff data found for HS code 1006 to JP"
        );

        let error = default_hs_table()
            .quote("0000", "US", Decimal::from(10))
            .unwrap_err();
        assert!(matches!(error, QuoteError::NoTariffData { .. }));
    }

    #[test]
    fn non_positive_value_is_rejected() {
        assert_eq!(
            default_hs_table().quote("1006", "US", Decimal::ZERO),
            Err(QuoteError::InvalidValue(Decimal::ZERO))
        );
    }
}
