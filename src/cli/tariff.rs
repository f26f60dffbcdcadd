use clap::Parser;
use dutycheck::{Config, TariffRequest, TariffResult, domain::TradeAgreement};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::{
    format_currency, format_percent,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, Parser)]
#[command(about = "Calculate tariffs, duties and fees for a shipment")]
pub struct Tariff {
    /// Declared value of a single unit
    #[arg(long, value_name = "AMOUNT")]
    value: Decimal,

    /// Number of units
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Shipment weight
    #[arg(long, default_value_t = Decimal::ZERO)]
    weight: Decimal,

    /// Origin country code, e.g. CN
    #[arg(long)]
    origin: String,

    /// Destination country code, e.g. US
    #[arg(long)]
    destination: String,

    /// Product category, e.g. electronics
    #[arg(long)]
    category: String,

    /// Trade agreement (none, nafta, gsp, fta, mfn)
    #[arg(long, default_value_t)]
    agreement: TradeAgreement,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct Breakdown<'a> {
    request: &'a TariffRequest,
    result: &'a TariffResult,
}

impl Tariff {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let calculator = config.tariff_calculator();
        let request = TariffRequest {
            product_value: self.value,
            origin_country: self.origin,
            destination_country: self.destination,
            product_category: self.category,
            weight: self.weight,
            quantity: self.quantity,
            trade_agreement: self.agreement,
        };

        let category = request.product_category.trim().to_lowercase();
        if !calculator.table().categories().any(|known| known == category) {
            tracing::warn!("Unknown product category '{category}', using a zero rate");
        }

        let result = calculator.calculate(&request)?;

        match self.output {
            OutputFormat::Json => {
                let breakdown = Breakdown {
                    request: &request,
                    result: &result,
                };
                println!("{}", serde_json::to_string_pretty(&breakdown)?);
            }
            OutputFormat::Table => Self::output_table(&request, &result),
        }

        Ok(())
    }

    fn output_table(request: &TariffRequest, result: &TariffResult) {
        let mut rows = vec![
            ("Total value", format_currency(result.total_value)),
            ("Tariff rate", format_percent(result.tariff_rate_percent)),
            ("Duty", format_currency(result.duty_amount)),
        ];
        // Destinations without a fee schedule have no fee lines.
        if !result.harbor_fee.is_zero() {
            rows.push(("Harbor maintenance fee", format_currency(result.harbor_fee)));
        }
        if !result.processing_fee.is_zero() {
            rows.push(("Processing fee", format_currency(result.processing_fee)));
        }
        rows.push((
            "Total taxes and fees",
            format_currency(result.total_taxes_and_fees),
        ));

        println!(
            "{} x{} {} -> {} ({})",
            request.product_category.trim(),
            request.quantity,
            request.origin_country.trim().to_ascii_uppercase(),
            request.destination_country.trim().to_ascii_uppercase(),
            request.trade_agreement
        );
        println!("{}", "────────────────────────".dim());

        let narrow = is_narrow();
        for (label, value) in rows {
            if narrow {
                println!("{label}: {value}");
            } else {
                println!("{label:<24}{value:>16}");
            }
        }

        let total = format_currency(result.total_cost);
        let effective = format_percent(result.effective_rate_percent);
        if narrow {
            println!("Total landed cost: {}", total.success());
            println!("Effective rate: {}", effective.warning());
        } else {
            println!("{:<24}{}", "Total landed cost", format!("{total:>16}").success());
            println!("{:<24}{}", "Effective rate", format!("{effective:>16}").warning());
        }
    }
}
