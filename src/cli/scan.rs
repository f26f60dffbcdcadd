use std::path::PathBuf;

use clap::Parser;
use dutycheck::{Config, Severity, domain::ScanReport};
use tracing::instrument;

use super::{
    load_document,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, Parser)]
#[command(about = "Flag risky clauses in a contract")]
pub struct Scan {
    /// Text files or page directories to scan (`-` reads stdin)
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Also print the sentence-by-sentence breakdown
    #[arg(long)]
    sentences: bool,

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

impl Scan {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let scanner = config.clause_scanner()?;
        let document = load_document(&self.paths)?;
        let mut report = scanner.scan(&document.text())?;

        if !self.sentences {
            report.sentences.clear();
        }

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Table => Self::output_table(&report),
        }

        Ok(())
    }

    fn output_table(report: &ScanReport) {
        if !report.sentences.is_empty() {
            println!("Sentences");
            println!("{}", "─────────".dim());
            let width = report.sentences.len().to_string().len();
            for (i, sentence) in report.sentences.iter().enumerate() {
                if is_narrow() {
                    println!("{sentence}");
                } else {
                    println!("{}  {sentence}", format!("{:>width$}", i + 1).dim());
                }
            }
            println!();
        }

        if report.findings.is_empty() {
            println!("{}", "No risky clauses found.".success());
            return;
        }

        let risks = report
            .findings
            .iter()
            .filter(|finding| finding.severity == Severity::Risk)
            .count();
        println!(
            "Findings: {} ({} high risk)",
            report.findings.len(),
            risks.to_string().risk()
        );
        println!("{}", "─────────".dim());
        for finding in &report.findings {
            let tag = format!("{:<9}", format!("[{}]", finding.severity));
            println!("{} {}", tag.severity(finding.severity), finding.utterance());
        }
    }
}
