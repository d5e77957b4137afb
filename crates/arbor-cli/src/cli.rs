use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "Arbor: structural diff for JSON documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two JSON documents
    Compare(CompareArgs),
    /// Test a pointer against a condition pattern
    Pattern(PatternArgs),
}

#[derive(Args)]
pub struct CompareArgs {
    /// The old document
    pub old: PathBuf,
    /// The new document
    pub new: PathBuf,
    /// Matching rules (.toml or .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
    /// Label for the old document (defaults to its file name)
    #[arg(long)]
    pub old_label: Option<String>,
    /// Label for the new document (defaults to its file name)
    #[arg(long)]
    pub new_label: Option<String>,
}

#[derive(Args)]
pub struct PatternArgs {
    /// A pointer such as /catalog/groups/0/id
    pub pointer: String,
    /// A pattern such as groups/#/id
    pub pattern: String,
}
