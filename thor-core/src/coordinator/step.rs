//! Running a single agent step

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinError;
use tracing::{debug, warn};

use crate::agent::{AgentExecutor, AgentId, AgentRegistry, AgentStatus, AgentType};
use crate::task::StepOutcome;

/// Everything a step needs, cheap to clone into spawned tasks
#[derive(Clone)]
pub(super) struct StepRunner {
    pub(super) registry: Arc<AgentRegistry>,
    pub(super) executor: Arc<dyn AgentExecutor>,
    pub(super) step_timeout: Duration,
}

impl StepRunner {
    /// Run one step on its own task so the agent is returned to idle even if
    /// the caller stops waiting.
    pub(super) async fn run(
        &self,
        agent_id: AgentId,
        agent_type: AgentType,
        input: String,
        working: AgentStatus,
    ) -> StepOutcome {
        let runner = self.clone();
        let handle = tokio::spawn(async move {
            runner
                .execute(agent_id, agent_type, &input, working)
                .await
        });
        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => self.recover(agent_id, agent_type, e).await,
        }
    }

    /// Mark the agent working, execute under the step timeout, record the
    /// outcome and release the agent.
    pub(super) async fn execute(
        &self,
        agent_id: AgentId,
        agent_type: AgentType,
        input: &str,
        working: AgentStatus,
    ) -> StepOutcome {
        let started = Instant::now();
        let Some(agent) = self.registry.get(agent_id).await else {
            return StepOutcome::failed(agent_id, agent_type, "agent no longer registered", 0);
        };

        self.set_status(agent_id, working).await;
        let result =
            tokio::time::timeout(self.step_timeout, self.executor.execute(&agent, input)).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(Ok(output)) => {
                debug!(agent = %agent.name(), duration_ms, "step succeeded");
                StepOutcome::succeeded(agent_id, agent_type, output, duration_ms)
            }
            Ok(Err(e)) => {
                warn!(agent = %agent.name(), error = %e, "step failed");
                StepOutcome::failed(agent_id, agent_type, e.to_string(), duration_ms)
            }
            Err(_) => {
                warn!(agent = %agent.name(), timeout = ?self.step_timeout, "step timed out");
                StepOutcome::failed(
                    agent_id,
                    agent_type,
                    format!("step timed out after {}s", self.step_timeout.as_secs()),
                    duration_ms,
                )
            }
        };

        self.finish(agent_id, outcome.success).await;
        outcome
    }

    /// Clean up after a step whose task panicked or was aborted
    pub(super) async fn recover(
        &self,
        agent_id: AgentId,
        agent_type: AgentType,
        error: JoinError,
    ) -> StepOutcome {
        warn!(%agent_id, error = %error, "step task did not complete");
        self.finish(agent_id, false).await;
        StepOutcome::failed(agent_id, agent_type, format!("step panicked: {error}"), 0)
    }

    async fn finish(&self, agent_id: AgentId, success: bool) {
        if let Err(e) = self.registry.record_outcome(agent_id, success).await {
            debug!(error = %e, "could not record step outcome");
        }
        self.registry.release(agent_id).await;
    }

    async fn set_status(&self, agent_id: AgentId, status: AgentStatus) {
        if let Err(e) = self.registry.set_status(agent_id, status).await {
            debug!(error = %e, "could not update agent status");
        }
    }
}
