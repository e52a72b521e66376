//! Ledger storage trait and in-memory implementation

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::error::LedgerError;
use super::types::{Artifact, ConversationMessage, DailyUsage, MessageFilter, UsageRecord, UsageTotals};

/// Aggregated usage read back from a store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageSummary {
    pub lifetime: UsageTotals,
    pub per_model: BTreeMap<String, UsageTotals>,
}

/// Persistence behind the ledger.
///
/// Messages and usage records are append-only. The daily snapshot is a
/// single row that is overwritten. Artifacts are upserted by name.
pub trait LedgerStore: Send + Sync {
    /// Append a message and return its assigned id
    fn append(&self, message: &ConversationMessage) -> Result<i64, LedgerError>;

    /// Matching messages, oldest first
    fn query(&self, filter: &MessageFilter) -> Result<Vec<ConversationMessage>, LedgerError>;

    /// Append a usage record and overwrite the daily snapshot as one write.
    /// On error neither change is visible.
    fn record_usage(&self, record: &UsageRecord, daily: &DailyUsage) -> Result<(), LedgerError>;
    fn usage_summary(&self) -> Result<UsageSummary, LedgerError>;

    fn load_daily(&self) -> Result<Option<DailyUsage>, LedgerError>;
    fn save_daily(&self, daily: &DailyUsage) -> Result<(), LedgerError>;

    /// Insert or replace content and category, keeping `created_at` and
    /// `access_count` of an existing artifact
    fn save_artifact(&self, artifact: &Artifact) -> Result<(), LedgerError>;

    /// Fetch an artifact, counting the read
    fn load_artifact(&self, name: &str) -> Result<Option<Artifact>, LedgerError>;
}

#[derive(Default)]
struct MemoryInner {
    messages: Vec<ConversationMessage>,
    usage: Vec<UsageRecord>,
    daily: Option<DailyUsage>,
    artifacts: BTreeMap<String, Artifact>,
}

/// Store that lives only as long as the process
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, LedgerError> {
        self.inner.lock().map_err(|_| LedgerError::Poisoned)
    }

    /// Number of usage records appended so far
    pub fn usage_len(&self) -> usize {
        self.lock().map(|inner| inner.usage.len()).unwrap_or(0)
    }
}

impl LedgerStore for MemoryStore {
    fn append(&self, message: &ConversationMessage) -> Result<i64, LedgerError> {
        let mut inner = self.lock()?;
        let id = inner.messages.len() as i64 + 1;
        let mut stored = message.clone();
        stored.id = id;
        inner.messages.push(stored);
        Ok(id)
    }

    fn query(&self, filter: &MessageFilter) -> Result<Vec<ConversationMessage>, LedgerError> {
        let inner = self.lock()?;
        let matching: Vec<_> = inner
            .messages
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        let skip = filter
            .limit
            .map_or(0, |limit| matching.len().saturating_sub(limit));
        Ok(matching.into_iter().skip(skip).collect())
    }

    fn record_usage(&self, record: &UsageRecord, daily: &DailyUsage) -> Result<(), LedgerError> {
        let mut inner = self.lock()?;
        inner.usage.push(record.clone());
        inner.daily = Some(daily.clone());
        Ok(())
    }

    fn usage_summary(&self) -> Result<UsageSummary, LedgerError> {
        let inner = self.lock()?;
        let mut summary = UsageSummary::default();
        for record in &inner.usage {
            summary.lifetime.add(record.cost);
            summary
                .per_model
                .entry(record.model.clone())
                .or_default()
                .add(record.cost);
        }
        Ok(summary)
    }

    fn load_daily(&self) -> Result<Option<DailyUsage>, LedgerError> {
        Ok(self.lock()?.daily.clone())
    }

    fn save_daily(&self, daily: &DailyUsage) -> Result<(), LedgerError> {
        self.lock()?.daily = Some(daily.clone());
        Ok(())
    }

    fn save_artifact(&self, artifact: &Artifact) -> Result<(), LedgerError> {
        let mut inner = self.lock()?;
        match inner.artifacts.get_mut(&artifact.name) {
            Some(existing) => {
                existing.content = artifact.content.clone();
                existing.category = artifact.category.clone();
                existing.updated_at = artifact.updated_at;
            }
            None => {
                inner
                    .artifacts
                    .insert(artifact.name.clone(), artifact.clone());
            }
        }
        Ok(())
    }

    fn load_artifact(&self, name: &str) -> Result<Option<Artifact>, LedgerError> {
        let mut inner = self.lock()?;
        Ok(inner.artifacts.get_mut(name).map(|artifact| {
            artifact.access_count += 1;
            artifact.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::MessageRole;
    use chrono::{Duration, TimeZone, Utc};

    fn msg(session: &str, content: &str, minute: u32) -> ConversationMessage {
        ConversationMessage {
            id: 0,
            session_id: session.into(),
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn append_assigns_increasing_ids() {
        let store = MemoryStore::new();
        assert_eq!(store.append(&msg("a", "1", 0)).unwrap(), 1);
        assert_eq!(store.append(&msg("a", "2", 1)).unwrap(), 2);
    }

    #[test]
    fn query_limit_keeps_newest_in_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.append(&msg("a", &i.to_string(), i)).unwrap();
        }
        store.append(&msg("b", "other", 9)).unwrap();

        let got = store.query(&MessageFilter::session("a").limit(2)).unwrap();
        let contents: Vec<_> = got.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["3", "4"]);
    }

    #[test]
    fn query_since_filters_old_messages() {
        let store = MemoryStore::new();
        let old = msg("a", "old", 0);
        let cutoff = old.created_at + Duration::minutes(1);
        store.append(&old).unwrap();
        store.append(&msg("a", "new", 5)).unwrap();

        let got = store.query(&MessageFilter::default().since(cutoff)).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].content, "new");
    }

    #[test]
    fn usage_summary_groups_by_model() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut daily = DailyUsage::empty(now.date_naive());
        for (model, cost) in [("a", 0.1), ("b", 0.2), ("a", 0.3)] {
            daily.cost += cost;
            daily.request_count += 1;
            store
                .record_usage(
                    &UsageRecord {
                        model: model.into(),
                        cost,
                        recorded_at: now,
                    },
                    &daily,
                )
                .unwrap();
        }
        let summary = store.usage_summary().unwrap();
        assert_eq!(summary.lifetime.request_count, 3);
        assert!((summary.lifetime.cost - 0.6).abs() < 1e-12);
        assert_eq!(summary.per_model["a"].request_count, 2);
        assert_eq!(store.load_daily().unwrap(), Some(daily));
    }

    #[test]
    fn artifact_upsert_keeps_access_count() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let artifact = Artifact {
            name: "plan".into(),
            content: "v1".into(),
            category: "notes".into(),
            created_at: now,
            updated_at: now,
            access_count: 0,
        };
        store.save_artifact(&artifact).unwrap();
        store.load_artifact("plan").unwrap();

        store
            .save_artifact(&Artifact {
                content: "v2".into(),
                ..artifact
            })
            .unwrap();
        let loaded = store.load_artifact("plan").unwrap().unwrap();
        assert_eq!(loaded.content, "v2");
        assert_eq!(loaded.access_count, 2);
        assert!(store.load_artifact("missing").unwrap().is_none());
    }
}
