//! SQLite-backed ledger store

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::error::LedgerError;
use super::migrations::Migrator;
use super::store::{LedgerStore, UsageSummary};
use super::types::{
    Artifact, ConversationMessage, DailyUsage, MessageFilter, MessageRole, UsageRecord,
};

/// Ledger store persisted to a single SQLite file
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create database at path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, LedgerError> {
        Migrator::new(&conn).migrate()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn.lock().map_err(|_| LedgerError::Poisoned)
    }
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| LedgerError::Corrupt(format!("timestamp out of range: {ms}")))
}

fn row_to_message(
    row: &rusqlite::Row,
) -> Result<(i64, String, String, String, i64), rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn write_daily(conn: &Connection, daily: &DailyUsage) -> Result<(), LedgerError> {
    conn.execute(
        "INSERT INTO daily_usage (id, date, cost, request_count) VALUES (1, ?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET date = excluded.date, cost = excluded.cost,
             request_count = excluded.request_count",
        params![
            daily.date.format("%Y-%m-%d").to_string(),
            daily.cost,
            daily.request_count as i64
        ],
    )?;
    Ok(())
}

impl LedgerStore for SqliteStore {
    fn append(&self, message: &ConversationMessage) -> Result<i64, LedgerError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO messages (session_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                message.session_id,
                message.role.as_str(),
                message.content,
                to_millis(message.created_at)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &MessageFilter) -> Result<Vec<ConversationMessage>, LedgerError> {
        let conn = self.conn()?;
        // Newest first so LIMIT keeps the most recent rows; reversed below.
        let mut stmt = conn.prepare(
            "SELECT id, session_id, role, content, created_at FROM messages
             WHERE (?1 IS NULL OR session_id = ?1)
               AND (?2 IS NULL OR created_at >= ?2)
             ORDER BY id DESC
             LIMIT ?3",
        )?;
        let limit = filter.limit.map_or(-1, |n| n as i64);
        let rows = stmt
            .query_map(
                params![
                    filter.session_id,
                    filter.since.map(to_millis),
                    limit
                ],
                row_to_message,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let mut messages = rows
            .into_iter()
            .map(|(id, session_id, role, content, created_at)| {
                Ok(ConversationMessage {
                    id,
                    session_id,
                    role: MessageRole::parse(&role)
                        .ok_or_else(|| LedgerError::Corrupt(format!("unknown role: {role}")))?,
                    content,
                    created_at: from_millis(created_at)?,
                })
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;
        messages.reverse();
        Ok(messages)
    }

    fn record_usage(&self, record: &UsageRecord, daily: &DailyUsage) -> Result<(), LedgerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO usage (model, cost, recorded_at) VALUES (?1, ?2, ?3)",
            params![record.model, record.cost, to_millis(record.recorded_at)],
        )?;
        write_daily(&tx, daily)?;
        tx.commit()?;
        Ok(())
    }

    fn usage_summary(&self) -> Result<UsageSummary, LedgerError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT model, SUM(cost), COUNT(*) FROM usage GROUP BY model ORDER BY model")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut summary = UsageSummary::default();
        for (model, cost, count) in rows {
            summary.lifetime.cost += cost;
            summary.lifetime.request_count += count as u64;
            let entry = summary.per_model.entry(model).or_default();
            entry.cost = cost;
            entry.request_count = count as u64;
        }
        Ok(summary)
    }

    fn load_daily(&self) -> Result<Option<DailyUsage>, LedgerError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT date, cost, request_count FROM daily_usage WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(date, cost, count)| {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| LedgerError::Corrupt(format!("daily date {date}: {e}")))?;
            Ok(DailyUsage {
                date,
                cost,
                request_count: count as u64,
            })
        })
        .transpose()
    }

    fn save_daily(&self, daily: &DailyUsage) -> Result<(), LedgerError> {
        write_daily(&*self.conn()?, daily)
    }

    fn save_artifact(&self, artifact: &Artifact) -> Result<(), LedgerError> {
        self.conn()?.execute(
            "INSERT INTO artifacts (name, content, category, created_at, updated_at, access_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(name) DO UPDATE SET content = excluded.content,
                 category = excluded.category, updated_at = excluded.updated_at",
            params![
                artifact.name,
                artifact.content,
                artifact.category,
                to_millis(artifact.created_at),
                to_millis(artifact.updated_at),
                artifact.access_count as i64
            ],
        )?;
        Ok(())
    }

    fn load_artifact(&self, name: &str) -> Result<Option<Artifact>, LedgerError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE artifacts SET access_count = access_count + 1 WHERE name = ?1",
            [name],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        let (content, category, created_at, updated_at, access_count) = conn.query_row(
            "SELECT content, category, created_at, updated_at, access_count
             FROM artifacts WHERE name = ?1",
            [name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )?;
        Ok(Some(Artifact {
            name: name.to_string(),
            content,
            category,
            created_at: from_millis(created_at)?,
            updated_at: from_millis(updated_at)?,
            access_count: access_count as u64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 8, minute, 0).unwrap()
    }

    fn usage(model: &str, cost: f64) -> UsageRecord {
        UsageRecord {
            model: model.into(),
            cost,
            recorded_at: at(0),
        }
    }

    fn message(session: &str, role: MessageRole, content: &str, minute: u32) -> ConversationMessage {
        ConversationMessage {
            id: 0,
            session_id: session.into(),
            role,
            content: content.into(),
            created_at: at(minute),
        }
    }

    #[test]
    fn append_and_query_by_session() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.append(&message("s1", MessageRole::User, "hello", 0)).unwrap();
        store.append(&message("s2", MessageRole::User, "other", 1)).unwrap();
        store
            .append(&message("s1", MessageRole::Assistant, "hi", 2))
            .unwrap();

        let got = store.query(&MessageFilter::session("s1")).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].content, "hello");
        assert_eq!(got[1].role, MessageRole::Assistant);
        assert_eq!(got[1].created_at, at(2));
        assert!(got[0].id < got[1].id);
    }

    #[test]
    fn query_limit_returns_newest_oldest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        for i in 0..5 {
            store
                .append(&message("s", MessageRole::User, &i.to_string(), i))
                .unwrap();
        }
        let got = store.query(&MessageFilter::session("s").limit(3)).unwrap();
        let contents: Vec<_> = got.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["2", "3", "4"]);
    }

    #[test]
    fn query_since_across_sessions() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.append(&message("a", MessageRole::User, "old", 0)).unwrap();
        store.append(&message("b", MessageRole::User, "new", 30)).unwrap();

        let got = store
            .query(&MessageFilter::default().since(at(0) + Duration::minutes(10)))
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].session_id, "b");
    }

    #[test]
    fn usage_summary_aggregates() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut daily = DailyUsage::empty(at(0).date_naive());
        for (model, cost) in [("opus", 0.015), ("haiku", 0.001), ("opus", 0.03)] {
            daily.cost += cost;
            daily.request_count += 1;
            store.record_usage(&usage(model, cost), &daily).unwrap();
        }
        let summary = store.usage_summary().unwrap();
        assert_eq!(summary.lifetime.request_count, 3);
        assert!((summary.lifetime.cost - 0.046).abs() < 1e-9);
        assert_eq!(summary.per_model["opus"].request_count, 2);
        assert_eq!(store.load_daily().unwrap(), Some(daily));
    }

    #[test]
    fn failed_daily_write_rolls_back_usage_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .conn()
            .unwrap()
            .execute_batch("DROP TABLE daily_usage")
            .unwrap();

        let daily = DailyUsage {
            date: at(0).date_naive(),
            cost: 0.5,
            request_count: 1,
        };
        assert!(store.record_usage(&usage("opus", 0.5), &daily).is_err());

        let summary = store.usage_summary().unwrap();
        assert_eq!(summary.lifetime.request_count, 0);
        assert!(summary.per_model.is_empty());
    }

    #[test]
    fn daily_snapshot_overwrites_single_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load_daily().unwrap().is_none());

        let day = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        store
            .save_daily(&DailyUsage {
                date: day,
                cost: 0.05,
                request_count: 3,
            })
            .unwrap();
        store.save_daily(&DailyUsage::empty(day.succ_opt().unwrap())).unwrap();

        let loaded = store.load_daily().unwrap().unwrap();
        assert_eq!(loaded, DailyUsage::empty(day.succ_opt().unwrap()));
    }

    #[test]
    fn artifacts_upsert_and_count_reads() {
        let store = SqliteStore::open_in_memory().unwrap();
        let artifact = Artifact {
            name: "design".into(),
            content: "v1".into(),
            category: "docs".into(),
            created_at: at(0),
            updated_at: at(0),
            access_count: 0,
        };
        store.save_artifact(&artifact).unwrap();
        assert_eq!(store.load_artifact("design").unwrap().unwrap().access_count, 1);

        store
            .save_artifact(&Artifact {
                content: "v2".into(),
                updated_at: at(5),
                ..artifact
            })
            .unwrap();
        let loaded = store.load_artifact("design").unwrap().unwrap();
        assert_eq!(loaded.content, "v2");
        assert_eq!(loaded.created_at, at(0));
        assert_eq!(loaded.updated_at, at(5));
        assert_eq!(loaded.access_count, 2);

        assert!(store.load_artifact("nope").unwrap().is_none());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("thor.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.append(&message("s", MessageRole::User, "persist me", 0)).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let got = store.query(&MessageFilter::session("s")).unwrap();
        assert_eq!(got[0].content, "persist me");
    }
}
