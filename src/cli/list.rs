use std::path::Path;

use clap::{Parser, ValueEnum};
use rtm::{
    domain::{HierarchyCatalog, Requirement},
    storage::RequirementRecord,
};
use tracing::instrument;

use super::{
    generate_requirements, load_config,
    terminal::{Colorize, terminal_width, truncate},
};

const DEFAULT_WIDTH: usize = 120;

/// Command arguments for `rtm list`.
#[derive(Debug, Parser)]
#[command(about = "List the enriched requirements")]
pub struct List {
    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Show only requirements of this type (case-insensitive).
    #[arg(long, value_name = "TYPE")]
    kind: Option<String>,

    /// Show only requirements without parents.
    #[arg(long)]
    orphans: bool,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl List {
    #[instrument(skip(self))]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let config = load_config(config_path)?;
        let requirements = generate_requirements(&config, &HierarchyCatalog::sbs())?;

        let selected: Vec<&Requirement> = requirements
            .iter()
            .filter(|r| self.matches(r))
            .collect();

        match self.output {
            OutputFormat::Table => print_table(&selected),
            OutputFormat::Json => {
                let records: Vec<RequirementRecord> =
                    selected.into_iter().map(RequirementRecord::from).collect();
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
        }
        Ok(())
    }

    fn matches(&self, requirement: &Requirement) -> bool {
        if self.orphans && !requirement.parents().is_empty() {
            return false;
        }
        self.kind
            .as_deref()
            .is_none_or(|kind| requirement.kind().as_str().eq_ignore_ascii_case(kind))
    }
}

fn print_table(requirements: &[&Requirement]) {
    if requirements.is_empty() {
        println!("{}", "No requirements found".dim());
        return;
    }

    let width = terminal_width().map_or(DEFAULT_WIDTH, usize::from);
    println!(
        "{}",
        truncate(
            &format!(
                "{:<8} {:<14} {:<8} {:<24} {}",
                "ID", "TYPE", "PRIORITY", "HIERARCHY", "DESCRIPTION"
            ),
            width
        )
        .info()
    );

    for requirement in requirements {
        let line = format!(
            "{:<8} {:<14} {:<8} {:<24} {}",
            requirement.id().as_str(),
            requirement.kind().as_str(),
            requirement.priority().as_str(),
            requirement.hierarchy().to_string(),
            requirement.description()
        );
        println!("{}", truncate(&line, width));
    }

    println!(
        "\n{}",
        format!("{} requirements", requirements.len()).dim()
    );
}
