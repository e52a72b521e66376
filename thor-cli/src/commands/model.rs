//! Model catalog and selection commands.
//!
//! Lets an operator see which model a classification would get at a given
//! spend, and what a call would cost, without running any agents.

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color};
use thor_models::auth::CredentialStore;
use thor_models::{ModelSelector, TaskClass};

use super::table;
use crate::config::ConfigLoader;

/// Model command arguments.
#[derive(Args, Debug)]
pub struct ModelArgs {
    #[command(subcommand)]
    pub command: ModelCommands,
}

/// Model subcommands.
#[derive(Subcommand, Debug)]
pub enum ModelCommands {
    /// List the model catalog
    List,
    /// Show which model a task classification gets
    Choose {
        /// Classification, e.g. architecture, quick_answer, general
        classification: String,

        /// Spend so far today in dollars
        #[arg(long, default_value_t = 0.0)]
        daily_cost: f64,
    },
    /// Estimate the cost of a call
    Estimate {
        input_tokens: u64,
        output_tokens: u64,
        /// Model alias or API name
        model: String,
    },
}

/// Run model command.
pub fn run(args: ModelArgs) -> Result<()> {
    let selector = ModelSelector::default();
    match args.command {
        ModelCommands::List => list_models(&selector),
        ModelCommands::Choose {
            classification,
            daily_cost,
        } => choose(&selector, &classification, daily_cost),
        ModelCommands::Estimate {
            input_tokens,
            output_tokens,
            model,
        } => {
            let cost = selector.estimate_cost(input_tokens, output_tokens, &model)?;
            println!("${cost:.6}");
            Ok(())
        }
    }
}

fn list_models(selector: &ModelSelector) -> Result<()> {
    let mut models = table(&["Alias", "Model", "Tier", "$/1K tokens", "Best for"]);
    for info in selector.catalog().models() {
        models.add_row(vec![
            Cell::new(&info.alias),
            Cell::new(&info.name),
            Cell::new(info.tier),
            Cell::new(format!("{:.5}", info.cost_per_1k_tokens)),
            Cell::new(info.best_for.join(", ")),
        ]);
    }
    println!("{models}");

    let credentials = CredentialStore::new().with_env_file(".env");
    if credentials.has("anthropic") {
        println!("Anthropic API key: configured");
    } else {
        println!("Anthropic API key: not set (agents can still run with --simulate)");
    }
    Ok(())
}

fn choose(selector: &ModelSelector, classification: &str, daily_cost: f64) -> Result<()> {
    let config = ConfigLoader::load()?;
    let limit = config.budget.daily_limit;
    let class = TaskClass::parse(classification);
    let info = selector.choose(class, daily_cost, limit);

    let mut out = table(&["Class", "Spend", "Model"]);
    let model = Cell::new(format!("{} ({})", info.alias, info.name));
    let model = if daily_cost >= limit {
        model.fg(Color::Yellow)
    } else {
        model
    };
    out.add_row(vec![
        Cell::new(class.as_str()),
        Cell::new(format!("${daily_cost:.4} / ${limit:.2}")),
        model,
    ]);
    println!("{out}");
    Ok(())
}
