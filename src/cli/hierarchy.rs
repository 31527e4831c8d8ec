use clap::Parser;
use rtm::domain::HierarchyCatalog;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Show the system breakdown structure")]
pub struct Hierarchy {
    /// Include each node's description
    #[arg(long)]
    describe: bool,
}

impl Hierarchy {
    #[instrument(skip(self))]
    pub fn run(self) {
        let catalog = HierarchyCatalog::sbs();
        for (depth, node) in catalog.walk() {
            let indent = "  ".repeat(depth);
            println!(
                "{indent}{} {} {}",
                node.id.info(),
                node.name,
                format!("(L{})", node.level).dim()
            );
            if self.describe {
                println!("{indent}  {}", node.description.dim());
            }
        }
    }
}
