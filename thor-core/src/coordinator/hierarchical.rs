//! Hierarchical dispatch: one supervisor briefs a team of subordinates

use tracing::debug;

use super::step::StepRunner;
use super::{Dispatch, parallel};
use crate::agent::{AgentId, AgentStatus, AgentType};
use crate::kill_switch::KillSwitch;

/// Input handed to subordinates once the supervisor has produced a brief
pub(super) fn directive(description: &str, brief: &str) -> String {
    format!("{description}\n\nSupervisor brief:\n{brief}")
}

/// The first agent supervises. Its output is combined with the description
/// and fanned out to the rest; if it fails they get the bare description.
pub(super) async fn run(
    runner: &StepRunner,
    kill_switch: &KillSwitch,
    agents: &[(AgentId, AgentType)],
    description: &str,
    max_parallel: usize,
) -> Dispatch {
    let Some((&(supervisor_id, supervisor_type), subordinates)) = agents.split_first() else {
        return Dispatch {
            results: Vec::new(),
            cancelled: false,
        };
    };
    if kill_switch.is_engaged() {
        return Dispatch {
            results: Vec::new(),
            cancelled: true,
        };
    }

    let supervisor = runner
        .run(
            supervisor_id,
            supervisor_type,
            description.to_string(),
            AgentStatus::Active,
        )
        .await;

    let input = match supervisor.output.as_deref().filter(|_| supervisor.success) {
        Some(brief) => directive(description, brief),
        None => {
            debug!("supervisor failed, subordinates get the original description");
            description.to_string()
        }
    };

    let team = parallel::run(runner, kill_switch, subordinates, &input, max_parallel).await;
    let mut results = Vec::with_capacity(agents.len());
    results.push(supervisor);
    results.extend(team.results);

    Dispatch {
        results,
        cancelled: team.cancelled,
    }
}
