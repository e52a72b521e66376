//! Cost and conversation bookkeeping

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use super::clock::Clock;
use super::error::LedgerError;
use super::store::LedgerStore;
use super::types::{
    Artifact, ConversationMessage, DailyUsage, MessageFilter, MessageRole, UsageRecord,
    UsageTotals, render_markdown,
};

/// Retention settings for the in-memory view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Messages kept per session in memory
    pub conversation_limit: usize,
    /// How far back `Ledger::open` reloads messages
    pub warm_days: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            conversation_limit: 50,
            warm_days: 7,
        }
    }
}

#[derive(Debug)]
struct Totals {
    daily: DailyUsage,
    lifetime: UsageTotals,
    per_model: BTreeMap<String, UsageTotals>,
}

/// Running spend plus a bounded view of each conversation.
///
/// Lifetime totals only grow. Daily figures roll over to zero the first
/// time they are touched on a new calendar day.
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
    totals: Mutex<Totals>,
    conversations: RwLock<HashMap<String, VecDeque<ConversationMessage>>>,
}

impl Ledger {
    /// Build a ledger, warming its view from the store.
    pub fn open(
        store: Arc<dyn LedgerStore>,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        let now = clock.now();
        let daily = store
            .load_daily()?
            .unwrap_or_else(|| DailyUsage::empty(clock.today()));
        let summary = store.usage_summary()?;

        let since = now - Duration::days(config.warm_days);
        let mut conversations: HashMap<String, VecDeque<ConversationMessage>> = HashMap::new();
        for message in store.query(&MessageFilter::default().since(since))? {
            let view = conversations.entry(message.session_id.clone()).or_default();
            view.push_back(message);
            if view.len() > config.conversation_limit {
                view.pop_front();
            }
        }

        info!(
            sessions = conversations.len(),
            daily_cost = daily.cost,
            lifetime_cost = summary.lifetime.cost,
            "ledger opened"
        );

        Ok(Self {
            store,
            clock,
            config,
            totals: Mutex::new(Totals {
                daily,
                lifetime: summary.lifetime,
                per_model: summary.per_model,
            }),
            conversations: RwLock::new(conversations),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Add a billed call to the daily and lifetime totals.
    ///
    /// Returns the daily figures after the update.
    #[instrument(skip(self), level = "debug")]
    pub async fn record_usage(&self, model: &str, cost: f64) -> Result<DailyUsage, LedgerError> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(LedgerError::InvalidCost(cost));
        }
        let now = self.clock.now();
        let today = now.date_naive();

        let record = UsageRecord {
            model: model.to_string(),
            cost,
            recorded_at: now,
        };

        let mut totals = self.totals.lock().await;
        let mut daily = if totals.daily.date == today {
            totals.daily.clone()
        } else {
            DailyUsage::empty(today)
        };
        daily.cost += cost;
        daily.request_count += 1;

        // Totals change only once the store has accepted both rows
        let persisted = daily.clone();
        self.with_store(move |store| store.record_usage(&record, &persisted))
            .await?;

        totals.daily = daily.clone();
        totals.lifetime.add(cost);
        totals
            .per_model
            .entry(model.to_string())
            .or_default()
            .add(cost);
        debug!(daily_cost = daily.cost, "usage recorded");
        Ok(daily)
    }

    /// Today's figures, resetting and persisting zeros on a new day.
    pub async fn daily_snapshot(&self) -> Result<DailyUsage, LedgerError> {
        let today = self.clock.today();
        let mut totals = self.totals.lock().await;
        if totals.daily.date != today {
            let fresh = DailyUsage::empty(today);
            let persisted = fresh.clone();
            self.with_store(move |store| store.save_daily(&persisted))
                .await?;
            info!(previous = %totals.daily.date, cost = totals.daily.cost, "daily spend rolled over");
            totals.daily = fresh;
        }
        Ok(totals.daily.clone())
    }

    /// Today's figures without touching the store
    pub async fn peek_daily(&self) -> DailyUsage {
        let today = self.clock.today();
        let totals = self.totals.lock().await;
        if totals.daily.date == today {
            totals.daily.clone()
        } else {
            DailyUsage::empty(today)
        }
    }

    pub async fn lifetime(&self) -> UsageTotals {
        self.totals.lock().await.lifetime.clone()
    }

    pub async fn model_usage(&self) -> BTreeMap<String, UsageTotals> {
        self.totals.lock().await.per_model.clone()
    }

    /// Budget left today, never below zero
    pub async fn budget_remaining(&self, daily_budget: f64) -> f64 {
        (daily_budget - self.peek_daily().await.cost).max(0.0)
    }

    /// Append a message to a session.
    ///
    /// The store keeps everything; the in-memory view drops its oldest
    /// entries past `conversation_limit`.
    pub async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ConversationMessage, LedgerError> {
        let mut message = ConversationMessage {
            id: 0,
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            created_at: self.clock.now(),
        };
        // Held across the write so the view stays in id order
        let mut conversations = self.conversations.write().await;
        let stored = message.clone();
        message.id = self.with_store(move |store| store.append(&stored)).await?;

        let view = conversations.entry(session_id.to_string()).or_default();
        view.push_back(message.clone());
        while view.len() > self.config.conversation_limit {
            view.pop_front();
        }
        Ok(message)
    }

    /// The retained messages of a session, oldest first
    pub async fn history(&self, session_id: &str) -> Vec<ConversationMessage> {
        self.conversations
            .read()
            .await
            .get(session_id)
            .map(|view| view.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Ids of sessions with retained messages, sorted
    pub async fn sessions(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.conversations.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn export_markdown(&self, session_id: &str) -> String {
        render_markdown(session_id, &self.history(session_id).await)
    }

    /// Save or replace a named artifact
    pub fn save_artifact(
        &self,
        name: &str,
        content: &str,
        category: &str,
    ) -> Result<(), LedgerError> {
        let now = self.clock.now();
        self.store.save_artifact(&Artifact {
            name: name.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            created_at: now,
            updated_at: now,
            access_count: 0,
        })
    }

    pub fn get_artifact(&self, name: &str) -> Result<Option<Artifact>, LedgerError> {
        self.store.load_artifact(name)
    }

    /// Run a store call on the blocking pool
    async fn with_store<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn LedgerStore) -> Result<T, LedgerError> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(store.as_ref())).await?
    }
}
