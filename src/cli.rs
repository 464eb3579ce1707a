use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::toc::{month_number, NodeKey};

#[derive(Parser)]
#[command(name = "thesis-site")]
#[command(about = "Manifests, table of contents and page navigation for the thesis site", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Site root holding site.json and the content folder.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,
    /// Expand-state database. Default: <root>/.thesis-site/state.sqlite3
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Regenerate the manifest of every configured phase folder.
    Manifest,

    /// Print a phase's table of contents.
    Toc {
        #[arg(long)]
        phase: String,
        /// Document to mark as active.
        #[arg(long)]
        file: Option<String>,
        /// Output the tree as JSON instead of HTML.
        #[arg(long)]
        json: bool,
    },

    /// Print previous/next targets as JSON.
    Nav {
        #[arg(long)]
        phase: String,
        /// Current document; omit for the landing view.
        #[arg(long)]
        file: Option<String>,
    },

    /// Mark a tree node expanded, or collapsed with --collapse.
    Expand {
        #[command(flatten)]
        node: NodeArgs,
        #[arg(long)]
        collapse: bool,
    },

    /// Flip a tree node between expanded and collapsed.
    Toggle {
        #[command(flatten)]
        node: NodeArgs,
    },

    /// List stored expand state.
    State,

    /// Render a phase page for a query such as `phase=3&file=notes.html`.
    Page {
        query: String,
        /// Write the page here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output the resolved page as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Inspect or create site.json.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective settings.
    Show,
    /// Write the default settings to site.json.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NodeLevel {
    Year,
    Month,
}

#[derive(Debug, Args)]
pub struct NodeArgs {
    pub level: NodeLevel,
    pub year: i32,
    /// Month name, required for `month`.
    pub month: Option<String>,
}

impl NodeArgs {
    pub fn key(&self) -> Result<NodeKey> {
        match (self.level, self.month.as_deref()) {
            (NodeLevel::Year, None) => Ok(NodeKey::Year(self.year)),
            (NodeLevel::Year, Some(_)) => bail!("a year node takes no month"),
            (NodeLevel::Month, Some(name)) => match month_number(name) {
                Some(month) => Ok(NodeKey::Month(self.year, month)),
                None => bail!("unknown month name '{name}'"),
            },
            (NodeLevel::Month, None) => bail!("a month node needs a month name"),
        }
    }
}
