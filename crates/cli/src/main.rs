use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "docdrift")]
#[command(about = "Detect documentation drift and repair docs section by section", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./docdrift.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether module docs still match the code (exit 1 on drift or missing docs)
    Check(CheckArgs),

    /// Generate missing docs or repair drifted sections
    Fix(FixArgs),

    /// Merge a JSON change set into a document without calling the LLM
    Apply(ApplyArgs),

    /// List the sections of a markdown document
    Sections(SectionsArgs),

    /// Screen text for prompt-injection patterns
    Scan(ScanArgs),

    /// Inspect or reset the drift check cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Module directories to check
    #[arg(required = true)]
    pub modules: Vec<PathBuf>,

    /// Documentation file (single module only; defaults to <module>/README.md)
    #[arg(long)]
    pub doc: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct FixArgs {
    /// Module directory
    pub module: PathBuf,

    /// Documentation file (defaults to <module>/README.md)
    #[arg(long)]
    pub doc: Option<PathBuf>,

    /// Discard the existing document and generate a new one
    #[arg(long)]
    pub regenerate: bool,

    /// Print the result instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub(crate) struct ApplyArgs {
    /// Document to patch
    #[arg(long)]
    pub doc: PathBuf,

    /// JSON file with the changes (`[...]` or `{"changes": [...]}`), `-` for stdin
    #[arg(long)]
    pub changes: PathBuf,

    /// Write the result back to --doc instead of printing it
    #[arg(long)]
    pub write: bool,
}

#[derive(Args)]
pub(crate) struct SectionsArgs {
    /// Markdown document
    pub doc: PathBuf,

    /// Print sections and anomalies as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct ScanArgs {
    /// File to screen, `-` for stdin
    pub input: PathBuf,

    /// Treat the input as code context (sampled, severity capped at low)
    #[arg(long)]
    pub code: bool,
}

#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Show the number of cached drift checks
    Stats,
    /// Delete the cache snapshot
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Check(args) => commands::run_check(args, config),
        Commands::Fix(args) => commands::run_fix(args, config),
        Commands::Apply(args) => commands::run_apply(args),
        Commands::Sections(args) => commands::run_sections(args),
        Commands::Scan(args) => commands::run_scan(args, config),
        Commands::Cache { action } => commands::run_cache(action, config),
    }
}
