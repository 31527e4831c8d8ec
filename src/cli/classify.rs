use std::path::Path;

use clap::Parser;
use rtm::domain::{Classification, HierarchyCatalog};
use tracing::instrument;

use super::{load_config, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Classify a free-text requirement description")]
pub struct Classify {
    /// The requirement text
    text: String,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Classify {
    #[instrument(skip(self))]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let config = load_config(config_path)?;
        let classifier = config.classifier(&HierarchyCatalog::sbs())?;
        let classification = classifier.classify(&self.text);

        match self.output {
            OutputFormat::Pretty => print_pretty(&classification),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&classification)?),
        }
        Ok(())
    }
}

fn print_pretty(classification: &Classification) {
    let rows = [
        ("Hierarchy", classification.hierarchy.to_string()),
        ("Type", classification.kind.to_string()),
        ("Priority", classification.priority.to_string()),
        ("Verification", classification.verification.to_string()),
        ("Criteria", classification.acceptance_criteria.clone()),
        ("Rationale", classification.rationale.clone()),
    ];
    for (label, value) in rows {
        println!("{} {value}", format!("{label:<13}").info());
    }
}
