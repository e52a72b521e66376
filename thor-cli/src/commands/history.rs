use anyhow::Result;
use clap::Args;
use comfy_table::Cell;

use super::{open_ledger, table, truncate};
use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Session to show; lists sessions when omitted
    pub session: Option<String>,

    /// Print the transcript as Markdown
    #[arg(long)]
    pub markdown: bool,
}

pub async fn run(args: HistoryArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let ledger = open_ledger(&config)?;

    let Some(session) = args.session else {
        let sessions = ledger.sessions().await;
        if sessions.is_empty() {
            println!("No conversations recorded.");
        }
        for id in sessions {
            println!("{id}");
        }
        return Ok(());
    };

    if args.markdown {
        print!("{}", ledger.export_markdown(&session).await);
        return Ok(());
    }

    let messages = ledger.history(&session).await;
    if messages.is_empty() {
        println!("No messages for session {session}.");
        return Ok(());
    }
    let mut transcript = table(&["When", "Role", "Content"]);
    for message in &messages {
        transcript.add_row(vec![
            Cell::new(message.created_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(message.role),
            Cell::new(truncate(&message.content, 100)),
        ]);
    }
    println!("{transcript}");
    Ok(())
}
