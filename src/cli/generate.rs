use std::path::{Path, PathBuf};

use rtm::{domain::HierarchyCatalog, storage::ReportAssembler};
use tracing::instrument;

use crate::cli::{generate_requirements, load_config, terminal::Colorize};

#[derive(Debug, Default, clap::Parser)]
pub struct Generate {
    /// Requirements file (YAML or JSON) to read instead of the built-in table
    #[arg(long)]
    source: Option<PathBuf>,

    /// Directory to write the reports to
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Generate {
    #[instrument(skip(self))]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let mut config = load_config(config_path)?;
        if let Some(source) = self.source {
            config.source = Some(source);
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }

        let catalog = HierarchyCatalog::sbs();
        let requirements = generate_requirements(&config, &catalog)?;

        let paths = ReportAssembler::new(&config.output_dir, config.document.clone(), &catalog)
            .write_all(&requirements)?;
        tracing::info!(count = requirements.len(), "RTM generation complete");

        println!(
            "{}",
            format!("Generated {} requirements", requirements.len()).success()
        );
        for path in [&paths.markdown, &paths.workbook, &paths.records] {
            println!("  {}", path.display().to_string().dim());
        }
        Ok(())
    }
}
