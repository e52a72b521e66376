//! Sequential dispatch: each agent works on the previous agent's output

use tracing::debug;

use super::Dispatch;
use super::step::StepRunner;
use crate::agent::{AgentId, AgentStatus, AgentType};
use crate::kill_switch::KillSwitch;

/// Run agents one after another.
///
/// The first agent gets the description. Each later agent gets the output
/// of the most recent successful step, so a failed step is skipped over.
pub(super) async fn run(
    runner: &StepRunner,
    kill_switch: &KillSwitch,
    agents: &[(AgentId, AgentType)],
    description: &str,
) -> Dispatch {
    let mut input = description.to_string();
    let mut results = Vec::with_capacity(agents.len());

    for &(agent_id, agent_type) in agents {
        if kill_switch.is_engaged() {
            debug!(completed = results.len(), "kill switch observed between steps");
            return Dispatch {
                results,
                cancelled: true,
            };
        }

        let outcome = runner
            .run(agent_id, agent_type, input.clone(), AgentStatus::Active)
            .await;
        if outcome.success
            && let Some(output) = &outcome.output
        {
            input = output.clone();
        }
        results.push(outcome);
    }

    Dispatch {
        results,
        cancelled: false,
    }
}
