//! Clap derive structures for the `stashly` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use stashly_core::EntityKey;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// stashly -- load, query and save REST entity collections
#[derive(Debug, Parser)]
#[command(
    name = "stashly",
    version,
    about = "Query and save REST entity collections through the stashly cache",
    long_about = "Each command dispatches one operation through the entity cache,\n\
        waits for the data service to answer, and prints the result.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "STASHLY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Server root URL (overrides config)
    #[arg(long, short = 'u', env = "STASHLY_URL", global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STASHLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "STASHLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "STASHLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Keys only, one per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load every entity of a type
    #[command(alias = "ls")]
    GetAll(GetAllArgs),

    /// Load one entity by key
    Get(GetArgs),

    /// Load entities matching query parameters
    Query(QueryArgs),

    /// Save a new entity
    Add(AddArgs),

    /// Save changes to an entity (the JSON must carry its key)
    Update(UpdateArgs),

    /// Delete an entity by key
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// List configured entity types
    Entities,
}

#[derive(Debug, Args)]
pub struct GetAllArgs {
    /// Entity type name
    pub entity: String,

    /// Show only entities matching this pattern (uses the type's filter props)
    #[arg(long, short = 'f')]
    pub filter: Option<String>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Entity type name
    pub entity: String,

    /// Entity key (numeric keys are sent as numbers)
    pub key: EntityKey,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Entity type name
    pub entity: String,

    /// Query parameters as name=value (repeatable)
    #[arg(required = true)]
    pub params: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Entity type name
    pub entity: String,

    /// Entity JSON, or @path to read it from a file
    pub json: String,

    /// Show the entity in the cache before the server confirms it
    #[arg(long)]
    pub optimistic: bool,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Entity type name
    pub entity: String,

    /// Partial entity JSON including its key, or @path
    pub json: String,

    /// Wait for the server before changing the cache
    #[arg(long)]
    pub pessimistic: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Entity type name
    pub entity: String,

    /// Entity key
    pub key: EntityKey,

    /// Wait for the server before removing from the cache
    #[arg(long)]
    pub pessimistic: bool,
}

impl Command {
    /// Entity type the command addresses, if any.
    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::GetAll(args) => Some(&args.entity),
            Self::Get(args) => Some(&args.entity),
            Self::Query(args) => Some(&args.entity),
            Self::Add(args) => Some(&args.entity),
            Self::Update(args) => Some(&args.entity),
            Self::Delete(args) => Some(&args.entity),
            Self::Entities => None,
        }
    }
}
