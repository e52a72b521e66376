//! Agent execution capability
//!
//! The coordinator never knows how an agent produces output. It hands an
//! [`AgentExecutor`] a snapshot of the agent and the step input, and records
//! whatever comes back.

use async_trait::async_trait;

use super::types::Agent;
use crate::error::ExecutionError;

/// Runs one step of work for an agent.
///
/// # Object Safety
///
/// This trait is object-safe; the coordinator holds an `Arc<dyn AgentExecutor>`.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Produce the agent's output for `input`.
    async fn execute(&self, agent: &Agent, input: &str) -> Result<String, ExecutionError>;
}
