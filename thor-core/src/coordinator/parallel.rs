//! Parallel dispatch: every agent works on the same input at once

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use super::Dispatch;
use super::step::StepRunner;
use crate::agent::{AgentId, AgentStatus, AgentType};
use crate::kill_switch::KillSwitch;

/// Fan `input` out to every agent, at most `max_parallel` at a time.
///
/// Steps waiting for a permit give up as soon as the kill switch is engaged,
/// and a step that gets one checks the switch again before starting.
/// Results keep the order of `agents`.
pub(super) async fn run(
    runner: &StepRunner,
    kill_switch: &KillSwitch,
    agents: &[(AgentId, AgentType)],
    input: &str,
    max_parallel: usize,
) -> Dispatch {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));

    let handles: Vec<_> = agents
        .iter()
        .map(|&(agent_id, agent_type)| {
            let runner = runner.clone();
            let stop = kill_switch.token();
            let semaphore = semaphore.clone();
            let input = input.to_string();
            tokio::spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = stop.cancelled() => return None,
                    permit = semaphore.acquire_owned() => permit.ok()?,
                };
                if stop.is_cancelled() {
                    return None;
                }
                Some(
                    runner
                        .execute(agent_id, agent_type, &input, AgentStatus::Busy)
                        .await,
                )
            })
        })
        .collect();

    let mut results = Vec::with_capacity(agents.len());
    let mut cancelled = false;
    for (handle, &(agent_id, agent_type)) in handles.into_iter().zip(agents) {
        match handle.await {
            Ok(Some(outcome)) => results.push(outcome),
            Ok(None) => {
                debug!(%agent_id, "step skipped by kill switch");
                cancelled = true;
            }
            Err(e) => results.push(runner.recover(agent_id, agent_type, e).await),
        }
    }

    Dispatch { results, cancelled }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::agent::{Agent, AgentExecutor, AgentRegistry};
    use crate::error::ExecutionError;

    /// Engages the switch from inside the first step
    struct StopsTheLine {
        kill_switch: KillSwitch,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AgentExecutor for StopsTheLine {
        async fn execute(&self, _agent: &Agent, input: &str) -> Result<String, ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.kill_switch.engage("budget exhausted");
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(input.to_string())
        }
    }

    #[tokio::test]
    async fn waiting_steps_give_up_when_switch_engages() {
        let registry = Arc::new(AgentRegistry::new());
        let kill_switch = KillSwitch::new();
        let executor = Arc::new(StopsTheLine {
            kill_switch: kill_switch.clone(),
            calls: AtomicUsize::new(0),
        });
        let runner = StepRunner {
            registry: registry.clone(),
            executor: executor.clone(),
            step_timeout: Duration::from_secs(5),
        };

        let types = [AgentType::Legal, AgentType::Legal, AgentType::Legal];
        let agents: Vec<_> = registry
            .resolve(&types)
            .await
            .into_iter()
            .zip(types)
            .map(|((id, _), agent_type)| (id, agent_type))
            .collect();

        let dispatch = run(&runner, &kill_switch, &agents, "x", 1).await;

        assert!(dispatch.cancelled);
        assert_eq!(dispatch.results.len(), 1);
        assert!(dispatch.results[0].success);
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn results_follow_agent_order() {
        let registry = Arc::new(AgentRegistry::new());
        let runner = StepRunner {
            registry: registry.clone(),
            executor: Arc::new(crate::agent::SimulatedExecutor::new(Duration::ZERO)),
            step_timeout: Duration::from_secs(5),
        };
        let types = [AgentType::Science, AgentType::Legal, AgentType::Business];
        let agents: Vec<_> = registry
            .resolve(&types)
            .await
            .into_iter()
            .zip(types)
            .map(|((id, _), agent_type)| (id, agent_type))
            .collect();

        let dispatch = run(&runner, &KillSwitch::new(), &agents, "x", 2).await;

        assert!(!dispatch.cancelled);
        let order: Vec<_> = dispatch.results.iter().map(|r| r.agent_type).collect();
        assert_eq!(order, types.to_vec());
    }
}
