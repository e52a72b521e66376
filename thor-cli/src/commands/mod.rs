pub mod config;
pub mod history;
pub mod model;
pub mod orchestrate;
pub mod recommend;
pub mod status;
pub mod usage;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use thor_core::{Ledger, SqliteStore, SystemClock, ThorContext};
use thor_models::TaskClass;
use thor_models::auth::CredentialStore;
use thor_models::providers::{AnthropicProvider, ConcurrencyLimited, ModelProvider};
use tracing::debug;

use crate::config::ThorConfig;

/// Open the ledger database named in the config
pub fn open_ledger(config: &ThorConfig) -> Result<Ledger> {
    let store = open_store(config)?;
    Ok(Ledger::open(
        store,
        config.ledger_config(),
        Arc::new(SystemClock),
    )?)
}

fn open_store(config: &ThorConfig) -> Result<Arc<SqliteStore>> {
    let path = &config.memory.database;
    debug!(path = %path.display(), "opening ledger database");
    let store = SqliteStore::open(path)
        .with_context(|| format!("opening ledger database {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Assemble a context from the config, backed by simulated or real agents
pub fn build_context(config: &ThorConfig, simulate: bool) -> Result<ThorContext> {
    let builder = ThorContext::builder()
        .store(open_store(config)?)
        .coordinator_config(config.coordinator_config())
        .ledger_config(config.ledger_config())
        .daily_budget(config.budget.daily_limit);

    let builder = if simulate {
        builder.simulated(config.simulate_delay())
    } else {
        let provider = model_provider(config)?;
        builder.model(
            provider,
            TaskClass::parse(&config.model.classification),
            Some(config.tool_config()),
        )
    };
    Ok(builder.build()?)
}

fn model_provider(config: &ThorConfig) -> Result<Arc<dyn ModelProvider>> {
    if config.model.provider != "anthropic" {
        bail!(
            "Unsupported model provider '{}' (supported: anthropic)",
            config.model.provider
        );
    }
    let api_key = CredentialStore::new()
        .with_env_file(".env")
        .get("anthropic")
        .context("no Anthropic API key; set ANTHROPIC_API_KEY or run with --simulate")?;
    let provider: Arc<dyn ModelProvider> = Arc::new(AnthropicProvider::new(api_key));
    Ok(Arc::new(ConcurrencyLimited::new(
        provider,
        config.swarm.max_parallel,
    )))
}

/// Table with the house style and the given header
pub fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

/// Shorten `text` to at most `max` characters for table cells
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let kept: String = flat.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_truncate_flattens_newlines() {
        assert_eq!(truncate("a\nb", 10), "a b");
    }
}
