use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bindex")]
#[command(about = "A disk-backed B-tree index over fixed 512-byte blocks", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open an interactive session
    Shell(ShellArgs),
    /// Create a new index file
    Create(CreateArgs),
    /// Insert a key/value pair into an index file
    Insert(InsertArgs),
    /// Look up a key in an index file
    Search(SearchArgs),
    /// Bulk-load key,value lines from a text file
    Load(LoadArgs),
    /// Print the tree structure of an index file
    Print(PrintArgs),
    /// Extract every pair to a text file in key order
    Extract(ExtractArgs),
}

#[derive(Args)]
pub struct ShellArgs {
    /// Index file to open on startup
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct CreateArgs {
    pub path: PathBuf,
    /// Overwrite an existing file without asking
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct InsertArgs {
    pub file: PathBuf,
    pub key: u64,
    pub value: u64,
}

#[derive(Args)]
pub struct SearchArgs {
    pub file: PathBuf,
    pub key: u64,
}

#[derive(Args)]
pub struct LoadArgs {
    pub file: PathBuf,
    /// Text file of key,value lines
    pub input: PathBuf,
}

#[derive(Args)]
pub struct PrintArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ExtractArgs {
    pub file: PathBuf,
    /// Output text file
    pub output: PathBuf,
    /// Overwrite an existing output file without asking
    #[arg(long)]
    pub force: bool,
}
