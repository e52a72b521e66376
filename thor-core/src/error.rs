//! Error types for thor-core

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::agent::AgentId;
use crate::ledger::LedgerError;

/// Top-level error type for thor-core
#[derive(Error, Debug)]
pub enum ThorError {
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Model error: {0}")]
    Model(#[from] thor_models::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors related to the agent registry
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Unknown agent type: {0}")]
    UnknownAgentType(String),

    #[error("Agent not found: {0}")]
    NotFound(AgentId),

    #[error("No agent types requested")]
    NoAgentsRequested,
}

/// Errors raised while an agent executes one step
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Model call failed: {0}")]
    Model(#[from] thor_models::Error),

    #[error("Ledger update failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Tool failed: {0}")]
    Tool(#[from] ToolError),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Tool round limit of {0} reached")]
    ToolRoundLimit(usize),

    #[error("Execution failed: {0}")]
    Failed(String),
}

/// Errors from tool dispatch
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Path escapes the tool root: {}", .0.display())]
    PathOutsideRoot(PathBuf),

    #[error("Tool timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Tool execution refused: kill switch engaged")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
