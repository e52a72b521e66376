//! Model-backed agent execution
//!
//! ModelExecutor runs one agent step as a conversation with a hosted model:
//! pick a model for today's spend, send the agent's system prompt and the
//! step input, bill the call to the ledger, and feed tool results back until
//! the model answers in plain text.

use std::sync::Arc;

use async_trait::async_trait;
use thor_models::providers::{ContentPart, Message, ModelProvider, ModelRequest};
use thor_models::{ModelSelector, TaskClass};
use tracing::{debug, info, instrument, warn};

use super::executor::AgentExecutor;
use super::types::Agent;
use crate::error::{ExecutionError, ToolError};
use crate::kill_switch::KillSwitch;
use crate::ledger::Ledger;
use crate::tools::{ToolCall, ToolRunner};

/// Default daily spend limit in dollars
pub const DEFAULT_DAILY_BUDGET: f64 = 0.17;

/// Default cap on tool round trips in one step
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 20;

pub struct ModelExecutor {
    provider: Arc<dyn ModelProvider>,
    selector: Arc<ModelSelector>,
    ledger: Arc<Ledger>,
    kill_switch: KillSwitch,
    tools: Option<ToolRunner>,
    classification: TaskClass,
    daily_budget: f64,
    max_tool_rounds: usize,
}

impl ModelExecutor {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        selector: Arc<ModelSelector>,
        ledger: Arc<Ledger>,
        kill_switch: KillSwitch,
    ) -> Self {
        Self {
            provider,
            selector,
            ledger,
            kill_switch,
            tools: None,
            classification: TaskClass::General,
            daily_budget: DEFAULT_DAILY_BUDGET,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Offer tools to the model, executed by `runner`
    pub fn with_tools(mut self, runner: ToolRunner) -> Self {
        self.tools = Some(runner);
        self
    }

    pub fn with_classification(mut self, classification: TaskClass) -> Self {
        self.classification = classification;
        self
    }

    pub fn with_daily_budget(mut self, budget: f64) -> Self {
        self.daily_budget = budget;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    fn check_kill_switch(&self) -> Result<(), ExecutionError> {
        if self.kill_switch.is_engaged() {
            let reason = self
                .kill_switch
                .reason()
                .unwrap_or_else(|| "kill switch engaged".to_string());
            return Err(ExecutionError::Cancelled(reason));
        }
        Ok(())
    }

    /// Run every tool call of one model turn, in order.
    ///
    /// Tool failures go back to the model as error results. Only a refusal
    /// from the kill switch ends the step.
    async fn run_tools(
        &self,
        runner: &ToolRunner,
        calls: &[thor_models::providers::ToolCall],
    ) -> Result<Vec<ContentPart>, ExecutionError> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            self.check_kill_switch()?;
            let outcome = match ToolCall::parse(&call.name, call.input.clone()) {
                Ok(parsed) => runner.execute(&parsed).await,
                Err(e) => Err(e),
            };
            let (content, is_error) = match outcome {
                Ok(output) => (output.to_model_text(), false),
                Err(ToolError::Cancelled) => {
                    return Err(ExecutionError::Cancelled(
                        "tool call refused by kill switch".to_string(),
                    ));
                }
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool call failed");
                    (e.to_string(), true)
                }
            };
            results.push(ContentPart::ToolResult {
                tool_use_id: call.id.clone(),
                content,
                is_error,
            });
        }
        Ok(results)
    }
}

#[async_trait]
impl AgentExecutor for ModelExecutor {
    #[instrument(skip(self, agent, input), fields(agent = %agent.name()))]
    async fn execute(&self, agent: &Agent, input: &str) -> Result<String, ExecutionError> {
        let system_prompt = agent.profile.system_prompt(agent.agent_type);
        let definitions = match self.tools {
            Some(_) => ToolCall::definitions(),
            None => Vec::new(),
        };
        let mut messages = vec![Message::user(input)];

        for round in 0..=self.max_tool_rounds {
            self.check_kill_switch()?;

            let daily = self.ledger.daily_snapshot().await?;
            let model = self
                .selector
                .choose(self.classification, daily.cost, self.daily_budget)
                .name
                .clone();

            let request = ModelRequest::new(&model, messages.clone())
                .with_system_prompt(&system_prompt)
                .with_max_tokens(agent.profile.max_tokens)
                .with_temperature(agent.profile.temperature)
                .with_tools(definitions.clone());

            debug!(%model, round, "calling model");
            let response = self.provider.call_model(request).await?;

            let cost = self.selector.estimate_cost(
                response.usage.input_tokens,
                response.usage.output_tokens,
                &model,
            )?;
            self.ledger.record_usage(&model, cost).await?;

            let Some(runner) = self.tools.as_ref().filter(|_| response.wants_tools()) else {
                info!(%model, cost, rounds = round, "agent step answered");
                return Ok(response.text);
            };
            if round == self.max_tool_rounds {
                break;
            }

            messages.push(response.to_assistant_message());
            let results = self.run_tools(runner, &response.tool_calls).await?;
            messages.push(Message::tool_results(results));
        }

        warn!(limit = self.max_tool_rounds, "tool round limit reached");
        Err(ExecutionError::ToolRoundLimit(self.max_tool_rounds))
    }
}
