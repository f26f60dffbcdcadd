use std::path::{Path, PathBuf};

mod hs_quote;
mod init;
mod key_points;
mod scan;
mod tariff;
mod terminal;
mod tracking;

use anyhow::Context;
use clap::ArgAction;
use dutycheck::{Config, Document, domain::money::format_amount};
use hs_quote::HsQuote;
use init::Init;
use key_points::KeyPoints;
use rust_decimal::Decimal;
use scan::Scan;
use tariff::Tariff;
use tracking::Tracking;

/// Path argument that reads the document from stdin.
const STDIN_PATH: &str = "-";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the configuration file (built-in tables are used if it
    /// does not exist)
    #[arg(short, long, default_value = "dutycheck.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Write the default configuration file
    Init(Init),

    /// Flag risky clauses in a contract
    Scan(Scan),

    /// Extract key terms (amounts, rates, fees) from a contract
    KeyPoints(KeyPoints),

    /// Calculate tariffs, duties and fees for a shipment
    Tariff(Tariff),

    /// Quote the duty for an HS code and destination
    HsQuote(HsQuote),

    /// Extract shipment tracking numbers from a document
    Tracking(Tracking),
}

impl Command {
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(config_path)?,
            Self::Scan(command) => command.run(&load_config(config_path)?)?,
            Self::KeyPoints(command) => command.run(&load_config(config_path)?)?,
            Self::Tariff(command) => command.run(&load_config(config_path)?)?,
            Self::HsQuote(command) => command.run(&load_config(config_path)?)?,
            Self::Tracking(command) => command.run(&load_config(config_path)?)?,
        }
        Ok(())
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load_or_default(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

/// Loads and concatenates the documents at `paths`, in order.
///
/// `-`, or no paths at all, reads a single page from stdin.
fn load_document(paths: &[PathBuf]) -> anyhow::Result<Document> {
    if paths.is_empty() {
        return read_stdin();
    }

    let mut document = Document::default();
    for path in paths {
        let next = if path.as_os_str() == STDIN_PATH {
            read_stdin()?
        } else {
            Document::load(path)?
        };
        document.append(next);
    }
    Ok(document)
}

fn read_stdin() -> anyhow::Result<Document> {
    tracing::debug!("Reading document from stdin");
    Ok(Document::read(std::io::stdin().lock())?)
}

/// Formats an amount as dollars with thousands separators, e.g. `$2,509.43`.
fn format_currency(amount: Decimal) -> String {
    let plain = format_amount(amount);
    let (sign, digits) = plain
        .strip_prefix('-')
        .map_or(("", plain.as_str()), |rest| ("-", rest));
    let (whole, cents) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents}")
}

/// Formats a rate as a percentage with two decimal places, e.g. `6.25%`.
fn format_percent(rate: Decimal) -> String {
    format!("{}%", format_amount(rate))
}
