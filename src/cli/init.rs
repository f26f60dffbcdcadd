use std::path::Path;

use dutycheck::Config;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
#[command(about = "Write the default configuration file")]
pub struct Init {}

impl Init {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() {
            anyhow::bail!(
                "Configuration already exists at {} (remove it to start over)",
                config_path.display()
            );
        }

        Config::default()
            .save(config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", config_path.display()))?;

        println!("{} {}", "Created:".success(), config_path.display());
        println!();
        println!("Next steps:");
        println!("  Edit the rule and rate tables in {}", config_path.display());
        println!("  dutycheck scan contract.txt");

        Ok(())
    }
}
