use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color};
use serde::Serialize;
use thor_core::{HealthReport, HealthStatus, StatusSnapshot};

use super::{build_context, table};
use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print status and health as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    status: &'a StatusSnapshot,
    health: &'a HealthReport,
}

pub async fn run(args: StatusArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    // Agents and tasks live per process; what carries over between runs is the ledger
    let ctx = build_context(&config, true)?;

    let snapshot = ctx.get_status().await;
    let health = ctx.health().await;

    if args.json {
        let output = StatusOutput {
            status: &snapshot,
            health: &health,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let color = match health.status {
        HealthStatus::Healthy => Color::Green,
        HealthStatus::Degraded => Color::Yellow,
        HealthStatus::Unhealthy => Color::Red,
    };
    let mut overview = table(&["Field", "Value"]);
    overview.add_row(vec![
        Cell::new("Health"),
        Cell::new(health.status).fg(color),
    ]);
    overview.add_row(vec![
        Cell::new("Kill switch"),
        Cell::new(match snapshot.kill_switch.reason.as_deref() {
            _ if !snapshot.kill_switch.engaged => "off".to_string(),
            Some(reason) => format!("engaged ({reason})"),
            None => "engaged".to_string(),
        }),
    ]);
    if let Some(daily) = &snapshot.daily {
        overview.add_row(vec![
            Cell::new("Spend today"),
            Cell::new(format!(
                "${:.4} of ${:.2} ({} requests)",
                daily.cost,
                ctx.daily_budget(),
                daily.request_count
            )),
        ]);
    }
    overview.add_row(vec![
        Cell::new("Budget remaining"),
        Cell::new(format!("${:.4}", ctx.budget_remaining().await)),
    ]);
    println!("{overview}");

    for warning in &health.warnings {
        println!("warning: {warning}");
    }
    Ok(())
}
