//! Cost and conversation ledger with pluggable persistence

mod clock;
mod error;
mod migrations;
mod service;
mod sqlite;
mod store;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::LedgerError;
pub use service::{Ledger, LedgerConfig};
pub use sqlite::SqliteStore;
pub use store::{LedgerStore, MemoryStore, UsageSummary};
pub use types::{
    Artifact, ConversationMessage, DailyUsage, MessageFilter, MessageRole, UsageRecord,
    UsageTotals, render_markdown,
};
