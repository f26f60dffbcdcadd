//! Tariff and duty calculation.
//!
//! A [`TariffCalculator`] owns an immutable [`TariffTable`] and
//! [`FeeSchedule`]. Each call to [`TariffCalculator::calculate`] validates a
//! [`TariffRequest`] and produces a fresh [`TariffResult`]:
//!
//! 1. `total value = product value × quantity`
//! 2. base rate: route entry, else the category `default`, else zero
//! 3. trade-agreement adjustment
//! 4. duty, plus the destination's ad-valorem fees, if it has any

use std::{collections::BTreeMap, fmt, str::FromStr};

use non_empty_string::NonEmptyString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::money::percent_of;

/// Route-table key used when no specific route is listed.
pub const DEFAULT_ROUTE: &str = "default";

/// Origins that get a zero NAFTA rate, but only when shipping to
/// [`NAFTA_DESTINATION`].
pub const NAFTA_ORIGINS: &[&str] = &["MX", "CA"];

/// The only destination that grants the NAFTA zero rate.
pub const NAFTA_DESTINATION: &str = "US";

/// Errors raised when a tariff request cannot be calculated.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The declared product value is zero or negative.
    #[error("product value must be greater than zero, got {0}")]
    NonPositiveValue(Decimal),

    /// The quantity is zero.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The weight is negative.
    #[error("weight cannot be negative, got {0}")]
    NegativeWeight(Decimal),

    /// A required text field is empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The amounts are too large to represent.
    #[error("shipment value is too large to calculate")]
    Overflow,
}

/// Errors raised when building tariff tables.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    /// A category has no `default` route entry.
    #[error("tariff category '{0}' has no '{DEFAULT_ROUTE}' rate")]
    MissingDefault(String),

    /// Two category keys are the same after trimming and lowercasing.
    #[error("tariff category '{0}' is listed more than once")]
    DuplicateCategory(String),
}

/// An ISO country code, trimmed and uppercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CountryCode(NonEmptyString);

impl CountryCode {
    /// Normalises a country code. Returns `None` if it is blank.
    #[must_use]
    pub fn new(code: &str) -> Option<Self> {
        NonEmptyString::new(code.trim().to_ascii_uppercase())
            .ok()
            .map(Self)
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trade agreement that may reduce the base tariff rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAgreement {
    /// No agreement; the base rate applies.
    #[default]
    None,
    /// Zero rate from Mexico or Canada into the US.
    Nafta,
    /// Generalized System of Preferences: half rate.
    Gsp,
    /// Free trade agreement: quarter rate.
    Fta,
    /// Most favoured nation: 80% of the rate.
    Mfn,
}

impl TradeAgreement {
    /// Applies the agreement to a base rate.
    ///
    /// NAFTA only zeroes the rate for MX/CA origins shipping to the US. Every
    /// other NAFTA route, including US exports, keeps the base rate. This
    /// asymmetry is intentional.
    #[must_use]
    pub fn adjust(self, rate: Decimal, origin: &CountryCode, destination: &CountryCode) -> Decimal {
        match self {
            Self::None => rate,
            Self::Nafta => {
                if NAFTA_ORIGINS.contains(&origin.as_str())
                    && destination.as_str() == NAFTA_DESTINATION
                {
                    Decimal::ZERO
                } else {
                    rate
                }
            }
            Self::Gsp => rate * Decimal::new(5, 1),
            Self::Fta => rate * Decimal::new(25, 2),
            Self::Mfn => rate * Decimal::new(8, 1),
        }
    }

    /// The lowercase name used in config files and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Nafta => "nafta",
            Self::Gsp => "gsp",
            Self::Fta => "fta",
            Self::Mfn => "mfn",
        }
    }
}

impl fmt::Display for TradeAgreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a trade agreement name is not recognised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown trade agreement '{0}': expected one of none, nafta, gsp, fta, mfn")]
pub struct UnknownAgreementError(String);

impl FromStr for TradeAgreement {
    type Err = UnknownAgreementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "nafta" => Ok(Self::Nafta),
            "gsp" => Ok(Self::Gsp),
            "fta" => Ok(Self::Fta),
            "mfn" => Ok(Self::Mfn),
            _ => Err(UnknownAgreementError(s.to_string())),
        }
    }
}

/// A shipment to price, as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffRequest {
    /// Declared value of a single unit.
    pub product_value: Decimal,
    /// Country the goods ship from.
    pub origin_country: String,
    /// Country the goods ship to.
    pub destination_country: String,
    /// Key into the tariff table, e.g. `electronics`.
    pub product_category: String,
    /// Shipment weight. Validated, but not used by any rate.
    pub weight: Decimal,
    /// Number of units.
    pub quantity: u32,
    /// Trade agreement claimed for the shipment.
    #[serde(default)]
    pub trade_agreement: TradeAgreement,
}

/// A request that passed validation.
#[derive(Debug, Clone)]
struct Shipment {
    total_value: Decimal,
    origin: CountryCode,
    destination: CountryCode,
    category: NonEmptyString,
    agreement: TradeAgreement,
}

impl TariffRequest {
    fn validate(&self) -> Result<Shipment, ValidationError> {
        if self.product_value <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveValue(self.product_value));
        }
        if self.quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        if self.weight < Decimal::ZERO {
            return Err(ValidationError::NegativeWeight(self.weight));
        }

        let category = NonEmptyString::new(self.product_category.trim().to_lowercase())
            .map_err(|_| ValidationError::MissingField("product category"))?;
        let origin = CountryCode::new(&self.origin_country)
            .ok_or(ValidationError::MissingField("origin country"))?;
        let destination = CountryCode::new(&self.destination_country)
            .ok_or(ValidationError::MissingField("destination country"))?;

        let total_value = self
            .product_value
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(ValidationError::Overflow)?;

        Ok(Shipment {
            total_value,
            origin,
            destination,
            category,
            agreement: self.trade_agreement,
        })
    }
}

/// Percentage rates by category, then by `ORIGIN-DEST` route.
///
/// Every category carries a [`DEFAULT_ROUTE`] entry. Category keys are
/// lowercased and route keys uppercased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, BTreeMap<String, Decimal>>",
    into = "BTreeMap<String, BTreeMap<String, Decimal>>"
)]
pub struct TariffTable {
    categories: BTreeMap<String, BTreeMap<String, Decimal>>,
}

impl TariffTable {
    /// Builds a table, checking that every category has a default rate.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingDefault`] for the first category without
    /// a `default` entry.
    pub fn new(
        categories: BTreeMap<String, BTreeMap<String, Decimal>>,
    ) -> Result<Self, TableError> {
        let mut normalised = BTreeMap::new();
        for (category, routes) in categories {
            let routes: BTreeMap<String, Decimal> = routes
                .into_iter()
                .map(|(route, rate)| {
                    let route = route.trim();
                    if route.eq_ignore_ascii_case(DEFAULT_ROUTE) {
                        (DEFAULT_ROUTE.to_string(), rate)
                    } else {
                        (route.to_ascii_uppercase(), rate)
                    }
                })
                .collect();
            if !routes.contains_key(DEFAULT_ROUTE) {
                return Err(TableError::MissingDefault(category));
            }
            let key = category.trim().to_lowercase();
            if normalised.contains_key(&key) {
                return Err(TableError::DuplicateCategory(key));
            }
            normalised.insert(key, routes);
        }
        Ok(Self {
            categories: normalised,
        })
    }

    /// Resolves the base rate for a category and route.
    ///
    /// Resolution order: the specific route, then the category default, then
    /// zero for an unknown category. A route listed with a zero rate counts
    /// as present.
    #[must_use]
    pub fn base_rate(&self, category: &str, route_key: &str) -> Decimal {
        let Some(routes) = self.categories.get(category) else {
            tracing::debug!("unknown tariff category '{category}', using zero rate");
            return Decimal::ZERO;
        };

        if let Some(rate) = routes.get(route_key) {
            tracing::debug!("route rate for {category} {route_key}: {rate}%");
            return *rate;
        }

        let rate = routes.get(DEFAULT_ROUTE).copied().unwrap_or(Decimal::ZERO);
        tracing::debug!("no {category} rate for {route_key}, using default {rate}%");
        rate
    }

    /// The category names in the table.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}

impl TryFrom<BTreeMap<String, BTreeMap<String, Decimal>>> for TariffTable {
    type Error = TableError;

    fn try_from(value: BTreeMap<String, BTreeMap<String, Decimal>>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TariffTable> for BTreeMap<String, BTreeMap<String, Decimal>> {
    fn from(table: TariffTable) -> Self {
        table.categories
    }
}

/// The merchandise processing fee: a percentage clamped to a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingFee {
    /// Percentage of the total value.
    pub rate_percent: Decimal,
    /// Lower bound of the fee.
    pub min: Decimal,
    /// Upper bound of the fee.
    pub max: Decimal,
}

/// The ad-valorem fees charged by one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationFees {
    /// Harbor maintenance fee, as a percentage of the total value.
    pub harbor_maintenance_percent: Decimal,
    /// Merchandise processing fee.
    pub processing: ProcessingFee,
}

impl DestinationFees {
    /// Returns `(harbor fee, processing fee)` for a total value, or `None`
    /// on overflow.
    #[must_use]
    pub fn apply(&self, total_value: Decimal) -> Option<(Decimal, Decimal)> {
        let harbor = percent_of(total_value, self.harbor_maintenance_percent)?;
        let processing = percent_of(total_value, self.processing.rate_percent)?
            .max(self.processing.min)
            .min(self.processing.max);
        Some((harbor, processing))
    }
}

/// Fee schedules by destination country.
///
/// Destinations not listed pay no additional fees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeSchedule {
    destinations: BTreeMap<String, DestinationFees>,
}

impl FeeSchedule {
    /// Builds a schedule. Destination keys are uppercased.
    #[must_use]
    pub fn new(destinations: BTreeMap<String, DestinationFees>) -> Self {
        Self {
            destinations: destinations
                .into_iter()
                .map(|(code, fees)| (code.trim().to_ascii_uppercase(), fees))
                .collect(),
        }
    }

    /// The fees for a destination, if it has a schedule.
    #[must_use]
    pub fn for_destination(&self, destination: &CountryCode) -> Option<&DestinationFees> {
        self.destinations.get(destination.as_str())
    }
}

/// The cost breakdown of a shipment, at full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffResult {
    /// Product value × quantity.
    pub total_value: Decimal,
    /// The tariff rate after the trade-agreement adjustment.
    pub tariff_rate_percent: Decimal,
    /// Duty owed on the total value.
    pub duty_amount: Decimal,
    /// Harbor maintenance fee.
    pub harbor_fee: Decimal,
    /// Merchandise processing fee.
    pub processing_fee: Decimal,
    /// Duty plus all fees.
    pub total_taxes_and_fees: Decimal,
    /// Total value plus taxes and fees.
    pub total_cost: Decimal,
    /// Taxes and fees as a percentage of the total value.
    pub effective_rate_percent: Decimal,
}

/// Prices shipments against an injected tariff table and fee schedule.
#[derive(Debug, Clone)]
pub struct TariffCalculator {
    table: TariffTable,
    fees: FeeSchedule,
}

impl TariffCalculator {
    /// Creates a calculator from its tables.
    #[must_use]
    pub const fn new(table: TariffTable, fees: FeeSchedule) -> Self {
        Self { table, fees }
    }

    /// The tariff table in use.
    #[must_use]
    pub const fn table(&self) -> &TariffTable {
        &self.table
    }

    /// Calculates the cost breakdown for a request.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] before any arithmetic if the request is
    /// invalid, or if the amounts overflow.
    #[instrument(level = "debug", skip(self))]
    pub fn calculate(&self, request: &TariffRequest) -> Result<TariffResult, ValidationError> {
        let shipment = request.validate()?;
        let total_value = shipment.total_value;

        let route_key = format!("{}-{}", shipment.origin, shipment.destination);
        let base_rate = self.table.base_rate(shipment.category.as_str(), &route_key);
        let rate = shipment
            .agreement
            .adjust(base_rate, &shipment.origin, &shipment.destination);

        let duty_amount = percent_of(total_value, rate).ok_or(ValidationError::Overflow)?;

        let (harbor_fee, processing_fee) = match self.fees.for_destination(&shipment.destination) {
            Some(fees) => fees.apply(total_value).ok_or(ValidationError::Overflow)?,
            None => (Decimal::ZERO, Decimal::ZERO),
        };

        let total_taxes_and_fees = duty_amount
            .checked_add(harbor_fee)
            .and_then(|sum| sum.checked_add(processing_fee))
            .ok_or(ValidationError::Overflow)?;
        let total_cost = total_value
            .checked_add(total_taxes_and_fees)
            .ok_or(ValidationError::Overflow)?;
        // The processing fee minimum makes this ratio unbounded for tiny values.
        let effective_rate_percent = if total_value > Decimal::ZERO {
            total_taxes_and_fees
                .checked_div(total_value)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .ok_or(ValidationError::Overflow)?
        } else {
            Decimal::ZERO
        };

        Ok(TariffResult {
            total_value,
            tariff_rate_percent: rate,
            duty_amount,
            harbor_fee,
            processing_fee,
            total_taxes_and_fees,
            total_cost,
            effective_rate_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        config::{default_fee_schedule, default_tariff_table},
        money::format_amount,
    };

    fn calculator() -> TariffCalculator {
        TariffCalculator::new(default_tariff_table(), default_fee_schedule())
    }

    fn request(category: &str, origin: &str, destination: &str) -> TariffRequest {
        TariffRequest {
            product_value: Decimal::from(1000),
            origin_country: origin.to_string(),
            destination_country: destination.to_string(),
            product_category: category.to_string(),
            weight: Decimal::from(5),
            quantity: 2,
            trade_agreement: TradeAgreement::None,
        }
    }

    fn code(s: &str) -> CountryCode {
        CountryCode::new(s).unwrap()
    }

    #[test]
    fn electronics_from_china_to_us() {
        let result = calculator()
            .calculate(&request("electronics", "CN", "US"))
            .unwrap();

        assert_eq!(result.tariff_rate_percent, Decimal::from(25));
        assert_eq!(result.total_value, Decimal::from(2000));
        assert_eq!(format_amount(result.duty_amount), "500.00");
        assert_eq!(format_amount(result.harbor_fee), "2.50");
        assert_eq!(result.processing_fee, Decimal::new(6928, 3));
        assert_eq!(format_amount(result.processing_fee), "6.93");
        assert_eq!(format_amount(result.total_taxes_and_fees), "509.43");
        assert_eq!(format_amount(result.total_cost), "2509.43");
        assert_eq!(format_amount(result.effective_rate_percent), "25.47");
    }

    #[test]
    fn fta_quarters_the_rate() {
        let mut req = request("electronics", "CN", "US");
        req.trade_agreement = TradeAgreement::Fta;
        let result = calculator().calculate(&req).unwrap();

        assert_eq!(result.tariff_rate_percent, Decimal::new(625, 2));
        assert_eq!(format_amount(result.duty_amount), "125.00");
    }

    #[test]
    fn gsp_and_mfn_scale_the_rate() {
        let mut req = request("electronics", "CN", "US");
        req.trade_agreement = TradeAgreement::Gsp;
        assert_eq!(
            calculator().calculate(&req).unwrap().tariff_rate_percent,
            Decimal::new(125, 1)
        );

        req.trade_agreement = TradeAgreement::Mfn;
        assert_eq!(
            calculator().calculate(&req).unwrap().tariff_rate_percent,
            Decimal::from(20)
        );
    }

    #[test]
    fn nafta_zeroes_mexico_to_us_for_every_category() {
        let calculator = calculator();
        for category in calculator.table().categories() {
            let mut req = request(category, "MX", "US");
            req.trade_agreement = TradeAgreement::Nafta;
            let result = calculator.calculate(&req).unwrap();
            assert_eq!(result.tariff_rate_percent, Decimal::ZERO, "{category}");
            assert_eq!(result.duty_amount, Decimal::ZERO, "{category}");
        }
    }

    #[test]
    fn nafta_is_not_granted_in_the_other_direction() {
        let rate = Decimal::from(10);
        assert_eq!(
            TradeAgreement::Nafta.adjust(rate, &code("US"), &code("MX")),
            rate
        );
        assert_eq!(
            TradeAgreement::Nafta.adjust(rate, &code("CN"), &code("US")),
            rate
        );
        assert_eq!(
            TradeAgreement::Nafta.adjust(rate, &code("CA"), &code("US")),
            Decimal::ZERO
        );
    }

    #[test]
    fn unknown_category_has_zero_rate() {
        let result = calculator()
            .calculate(&request("widgets", "CN", "US"))
            .unwrap();
        assert_eq!(result.tariff_rate_percent, Decimal::ZERO);
        assert_eq!(result.duty_amount, Decimal::ZERO);
    }

    #[test]
    fn unlisted_route_falls_back_to_category_default() {
        let result = calculator()
            .calculate(&request("textiles", "BR", "US"))
            .unwrap();
        assert_eq!(result.tariff_rate_percent, Decimal::from(10));
    }

    #[test]
    fn zero_route_rate_is_not_replaced_by_default() {
        let result = calculator()
            .calculate(&request("electronics", "JP", "US"))
            .unwrap();
        assert_eq!(result.tariff_rate_percent, Decimal::ZERO);
    }

    #[test]
    fn inputs_are_normalised() {
        let result = calculator()
            .calculate(&request(" Electronics ", "cn", " us"))
            .unwrap();
        assert_eq!(result.tariff_rate_percent, Decimal::from(25));
        assert_eq!(format_amount(result.harbor_fee), "2.50");
    }

    #[test]
    fn other_destinations_pay_no_fees() {
        let result = calculator()
            .calculate(&request("electronics", "CN", "EU"))
            .unwrap();
        assert_eq!(result.harbor_fee, Decimal::ZERO);
        assert_eq!(result.processing_fee, Decimal::ZERO);
        assert_eq!(result.total_taxes_and_fees, result.duty_amount);
    }

    #[test]
    fn processing_fee_is_clamped() {
        let mut small = request("books", "GB", "US");
        small.product_value = Decimal::from(10);
        small.quantity = 1;
        let result = calculator().calculate(&small).unwrap();
        assert_eq!(result.processing_fee, Decimal::from(2));

        let mut large = request("books", "GB", "US");
        large.product_value = Decimal::from(1_000_000);
        let result = calculator().calculate(&large).unwrap();
        assert_eq!(result.processing_fee, Decimal::from(485));
    }

    #[test]
    fn zero_value_is_rejected() {
        let mut req = request("electronics", "CN", "US");
        req.product_value = Decimal::ZERO;
        assert_eq!(
            calculator().calculate(&req),
            Err(ValidationError::NonPositiveValue(Decimal::ZERO))
        );
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let calculator = calculator();

        let mut req = request("electronics", "CN", "US");
        req.quantity = 0;
        assert_eq!(calculator.calculate(&req), Err(ValidationError::ZeroQuantity));

        let mut req = request("electronics", "CN", "US");
        req.weight = Decimal::from(-1);
        assert_eq!(
            calculator.calculate(&req),
            Err(ValidationError::NegativeWeight(Decimal::from(-1)))
        );

        let req = request("  ", "CN", "US");
        assert_eq!(
            calculator.calculate(&req),
            Err(ValidationError::MissingField("product category"))
        );

        let req = request("electronics", "", "US");
        assert_eq!(
            calculator.calculate(&req),
            Err(ValidationError::MissingField("origin country"))
        );

        let req = request("electronics", "CN", " ");
        assert_eq!(
            calculator.calculate(&req),
            Err(ValidationError::MissingField("destination country"))
        );
    }

    #[test]
    fn overflow_is_reported_not_panicked() {
        let mut req = request("electronics", "CN", "US");
        req.product_value = Decimal::MAX;
        assert_eq!(calculator().calculate(&req), Err(ValidationError::Overflow));
    }

    #[test]
    fn tiny_value_effective_rate_overflow_is_reported() {
        let mut req = request("electronics", "CN", "US");
        req.product_value = Decimal::new(1, 28);
        assert_eq!(calculator().calculate(&req), Err(ValidationError::Overflow));
    }

    #[test]
    fn table_requires_default_per_category() {
        let mut routes = BTreeMap::new();
        routes.insert("CN-US".to_string(), Decimal::from(5));
        let mut categories = BTreeMap::new();
        categories.insert("gadgets".to_string(), routes);

        assert_eq!(
            TariffTable::new(categories),
            Err(TableError::MissingDefault("gadgets".to_string()))
        );
    }

    #[test]
    fn table_keys_are_trimmed_before_matching_default() {
        let routes = BTreeMap::from([
            (" Default ".to_string(), Decimal::from(4)),
            (" cn-us".to_string(), Decimal::from(9)),
        ]);
        let table =
            TariffTable::new(BTreeMap::from([(" Gadgets".to_string(), routes)])).unwrap();

        assert_eq!(table.base_rate("gadgets", "CN-US"), Decimal::from(9));
        assert_eq!(table.base_rate("gadgets", "VN-US"), Decimal::from(4));
    }

    #[test]
    fn table_rejects_categories_equal_after_normalising() {
        let routes = BTreeMap::from([(DEFAULT_ROUTE.to_string(), Decimal::from(5))]);
        let categories = BTreeMap::from([
            ("Electronics".to_string(), routes.clone()),
            ("electronics".to_string(), routes),
        ]);

        assert_eq!(
            TariffTable::new(categories),
            Err(TableError::DuplicateCategory("electronics".to_string()))
        );
    }

    #[test]
    fn agreement_parses_from_name() {
        assert_eq!("NAFTA".parse::<TradeAgreement>().unwrap(), TradeAgreement::Nafta);
        assert_eq!("none".parse::<TradeAgreement>().unwrap(), TradeAgreement::None);
        assert!("cusma".parse::<TradeAgreement>().is_err());
    }
}
