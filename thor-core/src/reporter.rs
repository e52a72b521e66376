//! Status and health reporting
//!
//! Everything here is a read. Snapshots use ordered maps, so two snapshots
//! taken with nothing changing in between (and a fixed clock) are equal.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentRegistry, AgentStatus, AgentType};
use crate::coordinator::Coordinator;
use crate::kill_switch::{KillSwitch, KillSwitchState};
use crate::ledger::{Clock, DailyUsage, Ledger};
use crate::task::TaskStatus;

/// Point-in-time view of the whole system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub total_agents: usize,
    pub agents_by_status: BTreeMap<AgentStatus, usize>,
    pub agents_by_type: BTreeMap<AgentType, usize>,
    pub total_tasks: usize,
    pub tasks_by_status: BTreeMap<TaskStatus, usize>,
    pub uptime_secs: u64,
    pub kill_switch: KillSwitchState,
    /// Today's spend, when a ledger is attached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<DailyUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub warnings: Vec<String>,
}

pub struct StatusReporter {
    registry: Arc<AgentRegistry>,
    coordinator: Arc<Coordinator>,
    kill_switch: KillSwitch,
    ledger: Option<Arc<Ledger>>,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
}

impl StatusReporter {
    pub fn new(
        registry: Arc<AgentRegistry>,
        coordinator: Arc<Coordinator>,
        kill_switch: KillSwitch,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let started_at = clock.now();
        Self {
            registry,
            coordinator,
            kill_switch,
            ledger: None,
            clock,
            started_at,
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        let agents = self.registry.list().await;
        let tasks = self.coordinator.tasks().await;

        let mut agents_by_status = BTreeMap::new();
        let mut agents_by_type = BTreeMap::new();
        for agent in &agents {
            *agents_by_status.entry(agent.status).or_insert(0) += 1;
            *agents_by_type.entry(agent.agent_type).or_insert(0) += 1;
        }
        let mut tasks_by_status = BTreeMap::new();
        for task in &tasks {
            *tasks_by_status.entry(task.status).or_insert(0) += 1;
        }

        let daily = match &self.ledger {
            Some(ledger) => Some(ledger.peek_daily().await),
            None => None,
        };

        StatusSnapshot {
            total_agents: agents.len(),
            agents_by_status,
            agents_by_type,
            total_tasks: tasks.len(),
            tasks_by_status,
            uptime_secs: (self.clock.now() - self.started_at).num_seconds().max(0) as u64,
            kill_switch: self.kill_switch.state(),
            daily,
        }
    }

    /// Degraded when one problem holds, unhealthy when two or more do.
    pub async fn health(&self, daily_budget: f64) -> HealthReport {
        let snapshot = self.snapshot().await;
        let mut warnings = Vec::new();

        if snapshot.kill_switch.engaged {
            let reason = snapshot.kill_switch.reason.as_deref().unwrap_or("no reason");
            warnings.push(format!("kill switch engaged: {reason}"));
        }

        let troubled: usize = [AgentStatus::Error, AgentStatus::Offline]
            .iter()
            .filter_map(|s| snapshot.agents_by_status.get(s))
            .sum();
        if troubled > 0 {
            warnings.push(format!("{troubled} agent(s) in error or offline"));
        }

        if let Some(daily) = &snapshot.daily
            && daily.cost >= daily_budget
        {
            warnings.push(format!(
                "daily budget exhausted: ${:.4} of ${:.4}",
                daily.cost, daily_budget
            ));
        }

        let status = match warnings.len() {
            0 => HealthStatus::Healthy,
            1 => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        };
        HealthReport { status, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SimulatedExecutor;
    use crate::coordinator::CoordinatorConfig;
    use crate::ledger::{LedgerConfig, ManualClock, MemoryStore};
    use crate::task::TaskMode;
    use chrono::TimeZone;
    use std::time::Duration;

    struct Fixture {
        registry: Arc<AgentRegistry>,
        coordinator: Arc<Coordinator>,
        kill_switch: KillSwitch,
        ledger: Arc<Ledger>,
        clock: Arc<ManualClock>,
        reporter: StatusReporter,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap(),
        ));
        let registry = Arc::new(AgentRegistry::with_clock(clock.clone()));
        let kill_switch = KillSwitch::new();
        let coordinator = Arc::new(
            Coordinator::new(
                registry.clone(),
                Arc::new(SimulatedExecutor::new(Duration::ZERO)),
                kill_switch.clone(),
                CoordinatorConfig::default(),
            )
            .with_clock(clock.clone()),
        );
        let ledger = Arc::new(
            Ledger::open(
                Arc::new(MemoryStore::new()),
                LedgerConfig::default(),
                clock.clone(),
            )
            .unwrap(),
        );
        let reporter = StatusReporter::new(
            registry.clone(),
            coordinator.clone(),
            kill_switch.clone(),
            clock.clone(),
        )
        .with_ledger(ledger.clone());
        Fixture {
            registry,
            coordinator,
            kill_switch,
            ledger,
            clock,
            reporter,
        }
    }

    #[tokio::test]
    async fn snapshot_counts_agents_and_tasks() {
        let f = fixture();
        f.coordinator
            .orchestrate("x", &["legal", "legal", "science"], TaskMode::Parallel)
            .await;
        f.coordinator
            .orchestrate("y", &["ghost"], TaskMode::Parallel)
            .await;
        f.clock.advance(chrono::Duration::seconds(90));

        let snapshot = f.reporter.snapshot().await;
        assert_eq!(snapshot.total_agents, 3);
        assert_eq!(snapshot.agents_by_status[&AgentStatus::Idle], 3);
        assert_eq!(snapshot.agents_by_type[&AgentType::Legal], 2);
        assert_eq!(snapshot.total_tasks, 2);
        assert_eq!(snapshot.tasks_by_status[&TaskStatus::Completed], 1);
        assert_eq!(snapshot.tasks_by_status[&TaskStatus::Error], 1);
        assert_eq!(snapshot.uptime_secs, 90);
        assert!(!snapshot.kill_switch.engaged);
        assert_eq!(snapshot.daily.unwrap().request_count, 0);
    }

    #[tokio::test]
    async fn snapshot_is_stable_without_changes() {
        let f = fixture();
        f.registry.deploy(AgentType::Creative).await;

        let first = f.reporter.snapshot().await;
        let second = f.reporter.snapshot().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn healthy_by_default() {
        let f = fixture();
        let report = f.reporter.health(0.17).await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn one_problem_degrades() {
        let f = fixture();
        f.kill_switch.engage("incident");

        let report = f.reporter.health(0.17).await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.warnings, vec!["kill switch engaged: incident"]);
    }

    #[tokio::test]
    async fn two_problems_are_unhealthy() {
        let f = fixture();
        let id = f.registry.deploy(AgentType::Financial).await;
        f.registry.set_status(id, AgentStatus::Offline).await.unwrap();
        f.ledger.record_usage("opus", 0.2).await.unwrap();

        let report = f.reporter.health(0.17).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[1].starts_with("daily budget exhausted"));
    }
}
