//! thor-core: Agent orchestration for thor
//!
//! This crate provides the moving parts behind `thor orchestrate`:
//!
//! - **Agents** - [`AgentRegistry`] tracks typed agents and their status
//! - **Execution** - [`AgentExecutor`] with simulated and model-backed implementations
//! - **Coordination** - [`Coordinator`] runs tasks sequentially, in parallel, or supervisor-first
//! - **Ledger** - [`Ledger`] tracks daily and lifetime spend plus conversation history
//! - **Tools** - [`tools::ToolRunner`] executes file and shell tools for models
//! - **Kill switch** - [`KillSwitch`] stops new work from starting
//! - **Reporting** - [`StatusReporter`] snapshots and health checks
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use thor_core::{TaskMode, ThorContext};
//!
//! async fn example() -> Result<(), thor_core::ThorError> {
//!     let ctx = ThorContext::builder()
//!         .simulated(Duration::from_millis(100))
//!         .build()?;
//!
//!     let result = ctx
//!         .orchestrate("Review the vendor contract", &["legal", "financial"], TaskMode::Parallel)
//!         .await;
//!     println!("{}: {:?}", result.status, result.final_output());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── ThorContext ────────────────────────────┐
//! │                                                                     │
//! │  Coordinator ──► StepRunner ──► AgentExecutor ──► ModelProvider     │
//! │      │               │               │                              │
//! │      │               ▼               ├──► ToolRunner                │
//! │      │         AgentRegistry         ▼                              │
//! │      └──────────────────────────► Ledger ──► LedgerStore           │
//! │                                                                     │
//! │  KillSwitch (checked before every step, model call and tool call)  │
//! │  StatusReporter (reads registry, task history, ledger)             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod kill_switch;
pub mod ledger;
pub mod reporter;
pub mod task;
pub mod tools;

pub use agent::{
    Agent, AgentExecutor, AgentId, AgentRegistry, AgentStatus, AgentType, ModelExecutor,
    SimulatedExecutor,
};
pub use context::{ThorContext, ThorContextBuilder};
pub use coordinator::{Coordinator, CoordinatorConfig, recommend_agents};
pub use error::{AgentError, ExecutionError, ThorError, ToolError};
pub use kill_switch::{KillSwitch, KillSwitchState};
pub use ledger::{
    Clock, DailyUsage, Ledger, LedgerConfig, LedgerError, LedgerStore, ManualClock, MemoryStore,
    SqliteStore, SystemClock,
};
pub use reporter::{HealthReport, HealthStatus, StatusReporter, StatusSnapshot};
pub use task::{StepOutcome, Task, TaskId, TaskMode, TaskResult, TaskStatus};
