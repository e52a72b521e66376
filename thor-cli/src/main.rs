use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "thor", about = "Budget-aware orchestration of specialised agents")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task across a set of agents
    Orchestrate(commands::orchestrate::OrchestrateArgs),
    /// Show agents, tasks, spend and health
    Status(commands::status::StatusArgs),
    /// Suggest agent types for a task description
    Recommend(commands::recommend::RecommendArgs),
    /// Show recorded model spend
    Usage(commands::usage::UsageArgs),
    /// Inspect the model catalog and selection
    Model(commands::model::ModelArgs),
    /// Show conversation history
    History(commands::history::HistoryArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Orchestrate(args) => commands::orchestrate::run(args).await,
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Recommend(args) => commands::recommend::run(args),
        Commands::Usage(args) => commands::usage::run(args).await,
        Commands::Model(args) => commands::model::run(args),
        Commands::History(args) => commands::history::run(args).await,
        Commands::Config(args) => commands::config::run(args),
    }
}
