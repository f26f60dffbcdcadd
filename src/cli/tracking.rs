use std::path::PathBuf;

use clap::Parser;
use dutycheck::{Config, TrackingExtractor, domain::TrackingNumber};
use tracing::instrument;

use super::{load_document, terminal::Colorize};

const CSV_HEADER: &str = "Tracking Number,Formatted";

#[derive(Debug, Parser)]
#[command(about = "Extract shipment tracking numbers from a document")]
pub struct Tracking {
    /// Text files or page directories to read (`-` reads stdin)
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Scan every page, not only even pages
    #[arg(long, conflicts_with = "even_pages")]
    all_pages: bool,

    /// Scan only even pages (2, 4, 6, ...)
    #[arg(long)]
    even_pages: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl Tracking {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let extractor = if self.all_pages {
            TrackingExtractor::new(false)
        } else if self.even_pages {
            TrackingExtractor::new(true)
        } else {
            config.tracking_extractor()
        };

        let document = load_document(&self.paths)?;
        let numbers = extractor.extract_pages(document.pages())?;
        tracing::info!("Found {} tracking number(s)", numbers.len());

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&numbers)?);
            }
            OutputFormat::Csv => print!("{}", to_csv(&numbers)),
            OutputFormat::Table => {
                println!("Tracking numbers: {}", numbers.len().to_string().success());
                println!("{}", "────────────────".dim());
                for number in &numbers {
                    println!("{number}  {}", number.formatted().dim());
                }
            }
        }

        Ok(())
    }
}

/// Tracking numbers are alphanumeric, so no field needs quoting.
fn to_csv(numbers: &[TrackingNumber]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for number in numbers {
        out.push_str(&format!("{number},{}\n", number.formatted()));
    }
    out
}

#[cfg(test)]
mod tests {
    use dutycheck::domain::tracking::extract_text;

    use super::*;

    #[test]
    fn csv_has_header_and_one_row_per_number() {
        let numbers = extract_text("1Z999AA10123456784 and 1Z999AA10123456785");
        assert_eq!(
            to_csv(&numbers),
            "Tracking Number,Formatted\n\
             1Z999AA10123456784,1Z 999 AA1 01 2345 6784\n\
             1Z999AA10123456785,1Z 999 AA1 01 2345 6785\n"
        );
    }
}
