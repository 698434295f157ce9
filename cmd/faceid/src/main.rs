//! faceid CLI - recognize and register faces from precomputed embeddings.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    ConfigCommand, CountCommand, DescribeCommand, RecognizeCommand, RegisterCommand,
    SearchCommand,
};

/// faceid CLI - face identification over a persistent embedding index.
///
/// Embeddings come from an external face model and are passed as YAML or
/// JSON files (`-` for stdin): a list of floats, or `{embedding: [...]}`.
///
/// Configuration is stored in ~/.facekeep/faceid/config.yaml.
#[derive(Parser)]
#[command(name = "faceid")]
#[command(about = "Face identification CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.facekeep/faceid/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the person an embedding belongs to
    Recognize(RecognizeCommand),
    /// Register a new person unless the face is already known
    Register(RegisterCommand),
    /// List accepted nearest identities
    Search(SearchCommand),
    /// Print the number of stored embeddings
    Count(CountCommand),
    /// Show or change the description of an identity
    Describe(DescribeCommand),
    /// Manage CLI configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for command output.
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Recognize(cmd) => cmd.run(&cli).await,
        Commands::Register(cmd) => cmd.run(&cli).await,
        Commands::Search(cmd) => cmd.run(&cli).await,
        Commands::Count(cmd) => cmd.run(&cli).await,
        Commands::Describe(cmd) => cmd.run(&cli).await,
        Commands::Config(cmd) => cmd.run(&cli).await,
    }
}
