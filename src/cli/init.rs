use std::path::Path;

use anyhow::Context;
use rtm::domain::Config;
use tracing::instrument;

#[derive(Debug, clap::Parser)]
pub struct Command {}

impl Command {
    #[instrument(skip(self))]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() {
            anyhow::bail!(
                "Configuration already exists at {} (refusing to overwrite)",
                config_path.display()
            );
        }

        Config::default()
            .save(config_path)
            .context("Failed to create configuration")?;

        println!("Initialized configuration in {}", config_path.display());
        println!();
        println!("Next steps:");
        println!("  edit the [rules] and [[groups]] tables to suit your project");
        println!("  rtm generate --source requirements.yaml");
        Ok(())
    }
}
