use anyhow::Result;
use clap::Args;
use thor_core::recommend_agents;

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Task description to route
    pub description: String,
}

pub fn run(args: RecommendArgs) -> Result<()> {
    let agents = recommend_agents(&args.description);
    let names: Vec<_> = agents.iter().map(|t| t.as_str()).collect();
    println!("{}", names.join(","));
    Ok(())
}
