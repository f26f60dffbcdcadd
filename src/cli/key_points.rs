use std::path::PathBuf;

use clap::Parser;
use dutycheck::{Config, Finding};
use tracing::instrument;

use super::{load_document, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Extract key terms (amounts, rates, fees) from a contract")]
pub struct KeyPoints {
    /// Text files or page directories to read (`-` reads stdin)
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

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

impl KeyPoints {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let extractor = config.key_point_extractor()?;
        let document = load_document(&self.paths)?;
        let findings = extractor.extract(&document.text());

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&findings)?);
            }
            OutputFormat::Table => Self::output_table(&findings),
        }

        Ok(())
    }

    fn output_table(findings: &[Finding]) {
        println!("Key points");
        println!("{}", "──────────".dim());
        for finding in findings {
            let label = format!("{}:", finding.label);
            match &finding.matched_text {
                // Extracted text can span lines in the source layout.
                Some(text) => println!(
                    "{} {}",
                    label.severity(finding.severity),
                    text.split_whitespace().collect::<Vec<_>>().join(" ")
                ),
                None => println!("{}", finding.label.dim()),
            }
        }
    }
}
