//! Agent registry for managing agent records
//!
//! The AgentRegistry is responsible for:
//! - Creating agents of a given type and tracking them by id
//! - Resolving a list of requested types to distinct idle agents
//! - Recording status changes and per-step outcomes
//!
//! Agents handed out by [`AgentRegistry::resolve`] stay claimed until
//! [`AgentRegistry::release`] is called for them, so two tasks never share
//! an agent even while it waits for its turn in a pipeline.
//!
//! Readers get cloned snapshots; the map itself never leaves the lock.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::types::{Agent, AgentId, AgentStatus, AgentType};
use crate::error::AgentError;
use crate::ledger::{Clock, SystemClock};

#[derive(Default)]
struct Roster {
    agents: BTreeMap<AgentId, Agent>,
    /// Agents resolved for a task and not yet released
    claimed: HashSet<AgentId>,
}

impl Roster {
    fn available(&self, agent_type: AgentType) -> impl Iterator<Item = &Agent> {
        self.agents.values().filter(move |a| {
            a.agent_type == agent_type
                && a.status == AgentStatus::Idle
                && !self.claimed.contains(&a.id)
        })
    }
}

/// Registry of all agents, keyed by id.
///
/// Ids are time-ordered, so iteration order is creation order.
pub struct AgentRegistry {
    roster: RwLock<Roster>,
    clock: Arc<dyn Clock>,
}

impl AgentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            roster: RwLock::new(Roster::default()),
            clock,
        }
    }

    /// Create an idle agent of the given type
    pub async fn deploy(&self, agent_type: AgentType) -> AgentId {
        let agent = Agent::new(agent_type, self.clock.now());
        let id = agent.id;
        self.roster.write().await.agents.insert(id, agent);
        info!(%id, %agent_type, "deployed agent");
        id
    }

    /// Oldest idle, unclaimed agent of the given type, if any
    pub async fn find_idle(&self, agent_type: AgentType) -> Option<AgentId> {
        self.roster
            .read()
            .await
            .available(agent_type)
            .next()
            .map(|a| a.id)
    }

    /// Map each requested type to an agent, creating agents where needed.
    ///
    /// Every slot gets a distinct agent, so `[legal, legal]` yields two
    /// agents. The agents are claimed until released. Returns
    /// `(id, created)` pairs in request order.
    pub async fn resolve(&self, types: &[AgentType]) -> Vec<(AgentId, bool)> {
        let mut roster = self.roster.write().await;
        let mut resolved = Vec::with_capacity(types.len());

        for &agent_type in types {
            let existing = roster.available(agent_type).next().map(|a| a.id);

            let (id, created) = match existing {
                Some(id) => (id, false),
                None => {
                    let agent = Agent::new(agent_type, self.clock.now());
                    let id = agent.id;
                    roster.agents.insert(id, agent);
                    info!(%id, %agent_type, "deployed agent on demand");
                    (id, true)
                }
            };
            roster.claimed.insert(id);
            resolved.push((id, created));
        }
        resolved
    }

    /// Return a claimed agent to the pool as idle.
    ///
    /// Status and claim change under one lock, so no other task can pick
    /// the agent up before it is idle. Releasing an unclaimed agent only
    /// resets its status.
    pub async fn release(&self, id: AgentId) {
        let mut roster = self.roster.write().await;
        roster.claimed.remove(&id);
        if let Some(agent) = roster.agents.get_mut(&id) {
            agent.status = AgentStatus::Idle;
        }
        debug!(%id, "agent released");
    }

    pub async fn is_claimed(&self, id: AgentId) -> bool {
        self.roster.read().await.claimed.contains(&id)
    }

    /// Remove an agent. Returns false if it was not registered.
    pub async fn remove(&self, id: AgentId) -> bool {
        let mut roster = self.roster.write().await;
        roster.claimed.remove(&id);
        let removed = roster.agents.remove(&id).is_some();
        if removed {
            info!(%id, "removed agent");
        }
        removed
    }

    /// Snapshot of one agent
    pub async fn get(&self, id: AgentId) -> Option<Agent> {
        self.roster.read().await.agents.get(&id).cloned()
    }

    /// Snapshot of all agents in creation order
    pub async fn list(&self) -> Vec<Agent> {
        self.roster.read().await.agents.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.roster.read().await.agents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.roster.read().await.agents.is_empty()
    }

    /// Get agents by type
    pub async fn by_type(&self, agent_type: AgentType) -> Vec<Agent> {
        self.roster
            .read()
            .await
            .agents
            .values()
            .filter(|a| a.agent_type == agent_type)
            .cloned()
            .collect()
    }

    /// Get agents by status
    pub async fn by_status(&self, status: AgentStatus) -> Vec<Agent> {
        self.roster
            .read()
            .await
            .agents
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect()
    }

    pub async fn set_status(&self, id: AgentId, status: AgentStatus) -> Result<(), AgentError> {
        let mut roster = self.roster.write().await;
        let agent = roster.agents.get_mut(&id).ok_or(AgentError::NotFound(id))?;
        debug!(%id, from = %agent.status, to = %status, "agent status change");
        agent.status = status;
        Ok(())
    }

    /// Count a finished step against the agent's metrics
    pub async fn record_outcome(&self, id: AgentId, success: bool) -> Result<(), AgentError> {
        let now = self.clock.now();
        let mut roster = self.roster.write().await;
        let agent = roster.agents.get_mut(&id).ok_or(AgentError::NotFound(id))?;
        agent.metrics.record(success, now);
        Ok(())
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Basic CRUD Tests =====

    #[tokio::test]
    async fn registry_new_is_empty() {
        let registry = AgentRegistry::new();
        assert!(registry.is_empty().await);
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn deploy_creates_idle_agent() {
        let registry = AgentRegistry::new();
        let id = registry.deploy(AgentType::Legal).await;

        let agent = registry.get(id).await.unwrap();
        assert_eq!(agent.agent_type, AgentType::Legal);
        assert_eq!(agent.status, AgentStatus::Idle);
        assert!(agent.capabilities.contains(&"contract_review".to_string()));
    }

    #[tokio::test]
    async fn get_returns_none_for_unknown_id() {
        let registry = AgentRegistry::new();
        assert!(registry.get(AgentId::new()).await.is_none());
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let registry = AgentRegistry::new();
        let id = registry.deploy(AgentType::Science).await;

        assert!(registry.remove(id).await);
        assert!(!registry.remove(id).await);
        assert!(registry.get(id).await.is_none());
    }

    #[tokio::test]
    async fn list_is_in_creation_order() {
        let registry = AgentRegistry::new();
        let id1 = registry.deploy(AgentType::Business).await;
        let id2 = registry.deploy(AgentType::Legal).await;
        let id3 = registry.deploy(AgentType::Creative).await;

        let ids: Vec<_> = registry.list().await.into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![id1, id2, id3]);
    }

    // ===== Lookup Tests =====

    #[tokio::test]
    async fn find_idle_never_creates() {
        let registry = AgentRegistry::new();
        assert!(registry.find_idle(AgentType::Legal).await.is_none());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn find_idle_skips_working_agents() {
        let registry = AgentRegistry::new();
        let busy = registry.deploy(AgentType::Legal).await;
        let idle = registry.deploy(AgentType::Legal).await;
        registry.set_status(busy, AgentStatus::Busy).await.unwrap();

        assert_eq!(registry.find_idle(AgentType::Legal).await, Some(idle));
    }

    #[tokio::test]
    async fn by_type_and_status_filter() {
        let registry = AgentRegistry::new();
        let legal = registry.deploy(AgentType::Legal).await;
        registry.deploy(AgentType::Business).await;
        registry.set_status(legal, AgentStatus::Offline).await.unwrap();

        assert_eq!(registry.by_type(AgentType::Legal).await.len(), 1);
        let offline = registry.by_status(AgentStatus::Offline).await;
        assert_eq!(offline.len(), 1);
        assert_eq!(offline[0].id, legal);
        assert_eq!(registry.by_status(AgentStatus::Idle).await.len(), 1);
    }

    // ===== Resolve Tests =====

    #[tokio::test]
    async fn resolve_reuses_idle_agents() {
        let registry = AgentRegistry::new();
        let existing = registry.deploy(AgentType::Legal).await;

        let resolved = registry.resolve(&[AgentType::Legal]).await;
        assert_eq!(resolved, vec![(existing, false)]);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn resolve_gives_duplicate_types_distinct_agents() {
        let registry = AgentRegistry::new();
        let existing = registry.deploy(AgentType::Legal).await;

        let resolved = registry
            .resolve(&[AgentType::Legal, AgentType::Legal, AgentType::Business])
            .await;

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0], (existing, false));
        assert!(resolved[1].1);
        assert_ne!(resolved[0].0, resolved[1].0);
        assert!(resolved[2].1);
        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn resolved_agents_are_claimed_until_released() {
        let registry = AgentRegistry::new();
        let first = registry.resolve(&[AgentType::Legal]).await[0].0;

        // still idle, but claimed: neither lookup hands it out again
        assert_eq!(registry.get(first).await.unwrap().status, AgentStatus::Idle);
        assert!(registry.is_claimed(first).await);
        assert!(registry.find_idle(AgentType::Legal).await.is_none());
        let second = registry.resolve(&[AgentType::Legal]).await[0];
        assert_ne!(second.0, first);
        assert!(second.1);

        registry.release(first).await;
        assert!(!registry.is_claimed(first).await);
        assert_eq!(registry.find_idle(AgentType::Legal).await, Some(first));
        assert_eq!(registry.resolve(&[AgentType::Legal]).await, vec![(first, false)]);
    }

    #[tokio::test]
    async fn release_returns_agent_to_idle() {
        let registry = AgentRegistry::new();
        let id = registry.resolve(&[AgentType::Science]).await[0].0;
        registry.set_status(id, AgentStatus::Busy).await.unwrap();

        registry.release(id).await;
        assert_eq!(registry.get(id).await.unwrap().status, AgentStatus::Idle);
        assert!(registry.by_status(AgentStatus::Busy).await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_resolves_never_share_an_agent() {
        let registry = Arc::new(AgentRegistry::new());
        for _ in 0..3 {
            registry.deploy(AgentType::Legal).await;
        }

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.resolve(&[AgentType::Legal]).await[0].0 })
            })
            .collect();
        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(registry.len().await, 6);
    }

    // ===== Mutation Tests =====

    #[tokio::test]
    async fn set_status_on_unknown_agent_fails() {
        let registry = AgentRegistry::new();
        let err = registry
            .set_status(AgentId::new(), AgentStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NotFound(_)));
    }

    #[tokio::test]
    async fn record_outcome_updates_metrics() {
        let registry = AgentRegistry::new();
        let id = registry.deploy(AgentType::Financial).await;

        registry.record_outcome(id, true).await.unwrap();
        registry.record_outcome(id, false).await.unwrap();

        let metrics = registry.get(id).await.unwrap().metrics;
        assert_eq!(metrics.tasks_completed, 1);
        assert_eq!(metrics.tasks_failed, 1);
        assert_eq!(metrics.success_rate(), 0.5);
        assert!(metrics.last_active.is_some());
    }
}
