//! The assembled orchestration system
//!
//! [`ThorContext`] owns every shared component. Entry points build one with
//! [`ThorContext::builder`]; nothing in the crate reaches for globals.

use std::sync::Arc;
use std::time::Duration;

use thor_models::providers::ModelProvider;
use thor_models::{ModelSelector, TaskClass};
use tracing::info;

use crate::agent::{
    AgentExecutor, AgentRegistry, AgentType, DEFAULT_DAILY_BUDGET, ModelExecutor,
    SimulatedExecutor,
};
use crate::coordinator::{Coordinator, CoordinatorConfig};
use crate::error::ThorError;
use crate::kill_switch::{KillSwitch, KillSwitchState};
use crate::ledger::{Clock, Ledger, LedgerConfig, LedgerStore, MemoryStore, SystemClock};
use crate::reporter::{HealthReport, StatusReporter, StatusSnapshot};
use crate::task::{TaskMode, TaskResult};
use crate::tools::{ToolConfig, ToolRunner};

enum Backend {
    Simulated(Duration),
    Custom(Arc<dyn AgentExecutor>),
    Model {
        provider: Arc<dyn ModelProvider>,
        classification: TaskClass,
        tools: Option<ToolConfig>,
    },
}

/// Collects configuration for a [`ThorContext`]
pub struct ThorContextBuilder {
    clock: Arc<dyn Clock>,
    store: Arc<dyn LedgerStore>,
    selector: ModelSelector,
    coordinator: CoordinatorConfig,
    ledger: LedgerConfig,
    daily_budget: f64,
    backend: Backend,
}

impl ThorContextBuilder {
    fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            store: Arc::new(MemoryStore::new()),
            selector: ModelSelector::default(),
            coordinator: CoordinatorConfig::default(),
            ledger: LedgerConfig::default(),
            daily_budget: DEFAULT_DAILY_BUDGET,
            backend: Backend::Simulated(Duration::from_millis(100)),
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Persistence for the ledger. Defaults to an in-memory store.
    pub fn store(mut self, store: Arc<dyn LedgerStore>) -> Self {
        self.store = store;
        self
    }

    pub fn selector(mut self, selector: ModelSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn coordinator_config(mut self, config: CoordinatorConfig) -> Self {
        self.coordinator = config;
        self
    }

    pub fn ledger_config(mut self, config: LedgerConfig) -> Self {
        self.ledger = config;
        self
    }

    pub fn daily_budget(mut self, budget: f64) -> Self {
        self.daily_budget = budget;
        self
    }

    /// Answer every step with templated output after `delay`
    pub fn simulated(mut self, delay: Duration) -> Self {
        self.backend = Backend::Simulated(delay);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn AgentExecutor>) -> Self {
        self.backend = Backend::Custom(executor);
        self
    }

    /// Run steps against a hosted model.
    ///
    /// Pass a `ToolConfig` to let the model use the file and shell tools.
    pub fn model(
        mut self,
        provider: Arc<dyn ModelProvider>,
        classification: TaskClass,
        tools: Option<ToolConfig>,
    ) -> Self {
        self.backend = Backend::Model {
            provider,
            classification,
            tools,
        };
        self
    }

    pub fn build(self) -> Result<ThorContext, ThorError> {
        if !(self.daily_budget.is_finite() && self.daily_budget >= 0.0) {
            return Err(ThorError::Config(format!(
                "daily budget must be a non-negative number, got {}",
                self.daily_budget
            )));
        }

        let kill_switch = KillSwitch::new();
        let selector = Arc::new(self.selector);
        let registry = Arc::new(AgentRegistry::with_clock(self.clock.clone()));
        let ledger = Arc::new(Ledger::open(self.store, self.ledger, self.clock.clone())?);

        let executor: Arc<dyn AgentExecutor> = match self.backend {
            Backend::Simulated(delay) => Arc::new(SimulatedExecutor::new(delay)),
            Backend::Custom(executor) => executor,
            Backend::Model {
                provider,
                classification,
                tools,
            } => {
                info!(provider = provider.name(), %classification, "using model-backed agents");
                let mut executor = ModelExecutor::new(
                    provider,
                    selector.clone(),
                    ledger.clone(),
                    kill_switch.clone(),
                )
                .with_classification(classification)
                .with_daily_budget(self.daily_budget);
                if let Some(config) = tools {
                    executor = executor.with_tools(ToolRunner::new(config, kill_switch.clone())?);
                }
                Arc::new(executor)
            }
        };

        let coordinator = Arc::new(
            Coordinator::new(
                registry.clone(),
                executor,
                kill_switch.clone(),
                self.coordinator,
            )
            .with_clock(self.clock.clone())
            .with_ledger(ledger.clone()),
        );
        let reporter = StatusReporter::new(
            registry.clone(),
            coordinator.clone(),
            kill_switch.clone(),
            self.clock.clone(),
        )
        .with_ledger(ledger.clone());

        Ok(ThorContext {
            kill_switch,
            registry,
            ledger,
            selector,
            coordinator,
            reporter,
            daily_budget: self.daily_budget,
        })
    }
}

/// Registry, ledger, coordinator and reporter sharing one kill switch
pub struct ThorContext {
    kill_switch: KillSwitch,
    registry: Arc<AgentRegistry>,
    ledger: Arc<Ledger>,
    selector: Arc<ModelSelector>,
    coordinator: Arc<Coordinator>,
    reporter: StatusReporter,
    daily_budget: f64,
}

impl ThorContext {
    pub fn builder() -> ThorContextBuilder {
        ThorContextBuilder::new()
    }

    /// Run a task across agents of the named types
    pub async fn orchestrate<S: AsRef<str>>(
        &self,
        description: &str,
        agent_types: &[S],
        mode: TaskMode,
    ) -> TaskResult {
        self.coordinator
            .orchestrate(description, agent_types, mode)
            .await
    }

    pub async fn get_status(&self) -> StatusSnapshot {
        self.reporter.snapshot().await
    }

    /// Health against the configured daily budget
    pub async fn health(&self) -> HealthReport {
        self.reporter.health(self.daily_budget).await
    }

    /// Stop new steps, model calls and tool calls from starting
    pub fn cancel(&self, reason: impl Into<String>) {
        self.kill_switch.engage(reason);
    }

    pub fn reset_cancel(&self) {
        self.kill_switch.reset();
    }

    pub fn kill_switch_state(&self) -> KillSwitchState {
        self.kill_switch.state()
    }

    pub fn recommend(&self, description: &str) -> Vec<AgentType> {
        self.coordinator.recommend_agents(description)
    }

    /// A handle that can engage the switch from another task, e.g. a signal handler
    pub fn kill_switch(&self) -> KillSwitch {
        self.kill_switch.clone()
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn daily_budget(&self) -> f64 {
        self.daily_budget
    }

    /// Budget left today
    pub async fn budget_remaining(&self) -> f64 {
        self.ledger.budget_remaining(self.daily_budget).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::HealthStatus;
    use crate::task::TaskStatus;

    fn context() -> ThorContext {
        ThorContext::builder()
            .simulated(Duration::ZERO)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn orchestrate_updates_status() {
        let ctx = context();
        let result = ctx
            .orchestrate("plan", &["business", "financial"], TaskMode::Sequential)
            .await;
        assert_eq!(result.status, TaskStatus::Completed);

        let status = ctx.get_status().await;
        assert_eq!(status.total_agents, 2);
        assert_eq!(status.total_tasks, 1);
    }

    #[tokio::test]
    async fn cancel_and_reset() {
        let ctx = context();
        ctx.cancel("operator");
        assert!(ctx.kill_switch_state().engaged);
        assert_eq!(ctx.health().await.status, HealthStatus::Degraded);

        let cancelled = ctx.orchestrate("x", &["legal"], TaskMode::Parallel).await;
        assert_eq!(cancelled.status, TaskStatus::Cancelled);

        ctx.reset_cancel();
        let completed = ctx.orchestrate("x", &["legal"], TaskMode::Parallel).await;
        assert_eq!(completed.status, TaskStatus::Completed);
        assert_eq!(ctx.health().await.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn transcript_lands_in_ledger() {
        let ctx = context();
        let result = ctx.orchestrate("hello", &["creative"], TaskMode::Sequential).await;

        let history = ctx.ledger().history(&result.task_id.to_string()).await;
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn rejects_negative_budget() {
        let result = ThorContext::builder().daily_budget(-1.0).build();
        assert!(matches!(result, Err(ThorError::Config(_))));
    }

    #[test]
    fn recommend_routes_by_keyword() {
        let ctx = context();
        assert_eq!(
            ctx.recommend("patient data study"),
            vec![AgentType::Science, AgentType::Healthcare]
        );
    }
}
