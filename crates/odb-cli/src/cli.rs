use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use odb_types::ObjectType;

#[derive(Parser)]
#[command(
    name = "odb",
    about = "Hash and deduplicate files through an in-memory object database",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with database settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// zstd compression level, overrides the config file
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub level: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute object ids for files
    HashObject(HashObjectArgs),
    /// Report files that share content
    Dedup(DedupArgs),
}

#[derive(Args)]
pub struct HashObjectArgs {
    /// Object type to frame the files as
    #[arg(short = 't', long = "type", default_value = "blob")]
    pub kind: ObjectType,
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct DedupArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}
