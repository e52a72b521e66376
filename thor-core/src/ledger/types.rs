//! Records kept by the ledger

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable conversation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Store-assigned sequence number
    pub id: i64,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Filter for reading messages back from a store
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub session_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    /// Keep only the newest `limit` matches
    pub limit: Option<usize>,
}

impl MessageFilter {
    pub fn session(id: impl Into<String>) -> Self {
        Self {
            session_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn since(mut self, at: DateTime<Utc>) -> Self {
        self.since = Some(at);
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub(crate) fn matches(&self, message: &ConversationMessage) -> bool {
        self.session_id
            .as_ref()
            .is_none_or(|s| *s == message.session_id)
            && self.since.is_none_or(|t| message.created_at >= t)
    }
}

/// A single billed model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub model: String,
    pub cost: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Spend for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub cost: f64,
    pub request_count: u64,
}

impl DailyUsage {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            cost: 0.0,
            request_count: 0,
        }
    }
}

/// Running spend, either lifetime or for one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub cost: f64,
    pub request_count: u64,
}

impl UsageTotals {
    pub(crate) fn add(&mut self, cost: f64) {
        self.cost += cost;
        self.request_count += 1;
    }
}

/// A named piece of content kept across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub content: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_count: u64,
}

/// Render a conversation as markdown
pub fn render_markdown(session_id: &str, messages: &[ConversationMessage]) -> String {
    let mut out = format!("# Conversation: {session_id}\n\n");
    for message in messages {
        out.push_str(&format!(
            "## {}\n*{}*\n\n{}\n\n---\n\n",
            message.role.heading(),
            message.created_at.format("%Y-%m-%d %H:%M:%S"),
            message.content
        ));
    }
    out
}
