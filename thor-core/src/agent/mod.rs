//! Agents: records, registry and execution
//!
//! An agent is a typed worker with a status and success metrics. The
//! [`AgentRegistry`] owns every agent record; an [`AgentExecutor`] turns a
//! step input into output for one agent.

mod executor;
mod model_executor;
mod registry;
mod simulated;
mod types;

pub use executor::AgentExecutor;
pub use model_executor::{DEFAULT_DAILY_BUDGET, DEFAULT_MAX_TOOL_ROUNDS, ModelExecutor};
pub use registry::AgentRegistry;
pub use simulated::{Invocation, SimulatedExecutor};
pub use types::{Agent, AgentId, AgentMetrics, AgentProfile, AgentStatus, AgentType};
