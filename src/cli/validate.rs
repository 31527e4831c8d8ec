use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use rtm::{
    domain::{HierarchyCatalog, ValidationReport, Validator},
    storage::{load_records, report::RECORDS_FILE},
};
use tracing::instrument;

use super::{load_config, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Validate a generated requirements dump")]
pub struct Validate {
    /// The requirements dump (defaults to the one in the output directory)
    path: Option<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Validate {
    #[instrument(skip(self))]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let path = match self.path {
            Some(path) => path,
            None => load_config(config_path)?.output_dir.join(RECORDS_FILE),
        };

        let records = load_records(&path)
            .with_context(|| format!("cannot validate {}", path.display()))?;
        let report = Validator::new(&HierarchyCatalog::sbs()).validate(&records);
        tracing::info!(
            checked = report.checked,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "validation finished"
        );

        match self.output {
            OutputFormat::Table => output_table(&report, &path),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }

        if !report.passed() {
            anyhow::bail!("validation failed with {} errors", report.errors.len());
        }
        Ok(())
    }
}

fn output_table(report: &ValidationReport, path: &Path) {
    println!("Validating {}...\n", path.display());

    if report.errors.is_empty() {
        println!("✓ Errors:     none in {} requirements", report.checked);
    } else {
        println!(
            "{}",
            format!("✗ Errors:     {} found", report.errors.len()).error()
        );
        for error in &report.errors {
            println!("    {error}");
        }
    }

    if report.warnings.is_empty() {
        println!("✓ Warnings:   none");
    } else {
        println!(
            "{}",
            format!("! Warnings:   {} found", report.warnings.len()).warning()
        );
        for warning in &report.warnings {
            println!("    {}", warning.to_string().dim());
        }
    }

    if report.passed() {
        println!("\n{}", "Validation passed".success());
    }
}
