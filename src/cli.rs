use std::path::{Path, PathBuf};

mod classify;
mod generate;
mod hierarchy;
mod init;
mod list;
mod terminal;
mod twins;
mod validate;

use anyhow::Context;
use clap::ArgAction;
use classify::Classify;
use generate::Generate;
use hierarchy::Hierarchy;
use list::List;
use rtm::domain::{Config, HierarchyCatalog};
use twins::Twins;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file
    #[arg(short, long, default_value = "rtm.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Generate(Generate::default()))
            .run(&self.config)
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
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Generate the traceability matrix (default)
    Generate(Generate),

    /// Validate a generated requirements dump
    Validate(Validate),

    /// Classify a free-text requirement description
    Classify(Classify),

    /// List the enriched requirements
    List(List),

    /// Show the system breakdown structure
    Hierarchy(Hierarchy),

    /// Write the default configuration file
    Init(init::Command),

    /// Generate digital twins for a directory of presentations
    Twins(Twins),
}

impl Command {
    fn run(self, config: &Path) -> anyhow::Result<()> {
        match self {
            Self::Generate(command) => command.run(config)?,
            Self::Validate(command) => command.run(config)?,
            Self::Classify(command) => command.run(config)?,
            Self::List(command) => command.run(config)?,
            Self::Hierarchy(command) => command.run(),
            Self::Init(command) => command.run(config)?,
            Self::Twins(command) => command.run()?,
        }
        Ok(())
    }
}

/// Loads the configuration, falling back to defaults when the file is absent.
fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load_or_default(path).context("failed to load configuration")
}

/// Runs the generation pipeline with the given configuration.
fn generate_requirements(
    config: &Config,
    catalog: &HierarchyCatalog,
) -> anyhow::Result<Vec<rtm::domain::Requirement>> {
    use rtm::{
        pipeline::Generator,
        storage::{BuiltinExtractor, Extractor, FileExtractor},
    };

    let generator = Generator::new(config.classifier(catalog)?, config.linker());
    let extractor: Box<dyn Extractor> = match &config.source {
        Some(path) => Box::new(FileExtractor::new(path)),
        None => Box::new(BuiltinExtractor),
    };
    Ok(generator.generate(extractor.as_ref())?)
}
