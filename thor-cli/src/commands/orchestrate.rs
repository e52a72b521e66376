//! Run a task across agents

use anyhow::{Result, bail};
use clap::Args;
use comfy_table::{Cell, Color};
use thor_core::{TaskMode, TaskResult, TaskStatus};
use tracing::{info, warn};

use super::{build_context, table, truncate};
use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct OrchestrateArgs {
    /// What the agents should do
    pub description: String,

    /// Agent types, comma separated (default: recommended from the description)
    #[arg(short, long, value_delimiter = ',')]
    pub agents: Vec<String>,

    /// sequential, parallel or hierarchical
    #[arg(short, long, default_value = "sequential")]
    pub mode: TaskMode,

    /// Use simulated agents instead of calling a model
    #[arg(long)]
    pub simulate: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: OrchestrateArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let ctx = build_context(&config, args.simulate)?;

    let agents = if args.agents.is_empty() {
        let picked: Vec<String> = ctx
            .recommend(&args.description)
            .iter()
            .map(|t| t.to_string())
            .collect();
        info!(agents = %picked.join(","), "using recommended agents");
        picked
    } else {
        args.agents
    };

    let kill_switch = ctx.kill_switch();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping new steps");
            kill_switch.engage("interrupted by user");
        }
    });

    let result = ctx
        .orchestrate(&args.description, agents.as_slice(), args.mode)
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
        println!(
            "Budget remaining today: ${:.4}",
            ctx.budget_remaining().await
        );
    }

    if result.status == TaskStatus::Error {
        bail!(
            "{}",
            result.error.unwrap_or_else(|| "orchestration failed".into())
        );
    }
    Ok(())
}

fn print_result(result: &TaskResult) {
    println!("Task {} ({}): {}", result.task_id, result.mode, result.status);
    if let Some(error) = &result.error {
        println!("  {error}");
    }
    if result.results.is_empty() {
        return;
    }

    let mut steps = table(&["#", "Agent", "Result", "Time", "Output"]);
    for (idx, step) in result.results.iter().enumerate() {
        let (label, color) = if step.success {
            ("ok", Color::Green)
        } else {
            ("failed", Color::Red)
        };
        let text = step
            .output
            .as_deref()
            .or(step.error.as_deref())
            .unwrap_or_default();
        steps.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(step.agent_type),
            Cell::new(label).fg(color),
            Cell::new(format!("{}ms", step.duration_ms)),
            Cell::new(truncate(text, 80)),
        ]);
    }
    println!("{steps}");

    if let Some(output) = result.final_output() {
        println!("\nFinal output:\n{output}\n");
    }
}
