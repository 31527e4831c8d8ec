use std::path::PathBuf;

use clap::Parser;
use rtm::twin::TwinProcessor;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Generate digital twins for a directory of presentations")]
pub struct Twins {
    /// Directory holding the .pptx files
    #[arg(short, long)]
    input: PathBuf,

    /// Directory to write the twins to
    #[arg(short, long, default_value = "twins")]
    output: PathBuf,
}

impl Twins {
    #[instrument(skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let summary = TwinProcessor::new(&self.output).process_dir(&self.input)?;

        let headline = format!(
            "Processed {} of {} presentations",
            summary.successful, summary.total_files
        );
        if summary.failed == 0 {
            println!("{}", headline.success());
        } else {
            println!(
                "{}",
                format!("{headline} ({} failed)", summary.failed).warning()
            );
        }
        for (category, count) in &summary.categories_summary {
            println!("  {:<20} {count}", category.as_str());
        }
        if !summary.cross_references_global.is_empty() {
            let references: Vec<&str> = summary.cross_references_global.iter().copied().collect();
            println!("{}", format!("References: {}", references.join(", ")).dim());
        }
        println!("{}", format!("Output: {}", self.output.display()).dim());
        Ok(())
    }
}
