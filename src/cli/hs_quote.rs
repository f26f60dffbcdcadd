use clap::Parser;
use dutycheck::Config;
use rust_decimal::Decimal;
use tracing::instrument;

use super::{format_currency, format_percent, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Quote the duty for an HS code and destination")]
pub struct HsQuote {
    /// Harmonized-system code, e.g. 6109
    #[arg(long, value_name = "CODE")]
    hs_code: String,

    /// Destination, e.g. US or EU
    #[arg(long)]
    destination: String,

    /// Declared value of the goods
    #[arg(long, value_name = "AMOUNT")]
    value: Decimal,

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

impl HsQuote {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let quote = config
            .hs
            .rates
            .quote(&self.hs_code, &self.destination, self.value)?;

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            }
            OutputFormat::Table => {
                println!("HS {} -> {}", quote.hs_code, quote.destination);
                println!("{}", "──────────────".dim());
                println!("{:<10}{:>16}", "Value", format_currency(quote.value));
                println!("{:<10}{:>16}", "Rate", format_percent(quote.rate_percent));
                println!("{:<10}{:>16}", "Duty", format_currency(quote.duty));
                println!("{:<10}{:>16}", "Total", format_currency(quote.total));
                println!();
                println!("{}", quote.message().warning());
            }
        }

        Ok(())
    }
}
