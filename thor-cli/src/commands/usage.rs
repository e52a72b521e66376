//! Spend reports from the ledger

use anyhow::Result;
use clap::Args;
use comfy_table::Cell;
use serde_json::json;

use super::{open_ledger, table};
use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct UsageArgs {
    /// Print usage as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: UsageArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let ledger = open_ledger(&config)?;
    let limit = config.budget.daily_limit;

    let daily = ledger.daily_snapshot().await?;
    let lifetime = ledger.lifetime().await;
    let per_model = ledger.model_usage().await;
    let remaining = ledger.budget_remaining(limit).await;

    if args.json {
        let output = json!({
            "daily": daily,
            "lifetime": lifetime,
            "models": per_model,
            "daily_limit": limit,
            "budget_remaining": remaining,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Today ({}): ${:.4} across {} requests, ${:.4} of ${:.2} left",
        daily.date, daily.cost, daily.request_count, remaining, limit
    );
    println!(
        "Lifetime: ${:.4} across {} requests",
        lifetime.cost, lifetime.request_count
    );

    if per_model.is_empty() {
        println!("No model usage recorded yet.");
        return Ok(());
    }

    let mut models = table(&["Model", "Requests", "Cost"]);
    for (model, totals) in &per_model {
        models.add_row(vec![
            Cell::new(model),
            Cell::new(totals.request_count),
            Cell::new(format!("${:.4}", totals.cost)),
        ]);
    }
    println!("{models}");
    Ok(())
}
