//! Anthropic Messages API provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::types::{
    ContentPart, Message, ModelRequest, ModelResponse, StopReason, ToolCall, ToolDefinition, Usage,
};
use super::ModelProvider;
use crate::auth::ApiKey;
use crate::{Error, Result};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentPart>,
    stop_reason: Option<StopReason>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Calls the hosted Messages API over HTTPS.
pub struct AnthropicProvider {
    api_key: ApiKey,
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            http: reqwest::Client::new(),
            base_url: ANTHROPIC_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the provider at a different endpoint (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request_body<'a>(request: &'a ModelRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages: &request.messages,
            system: request.system_prompt.as_deref(),
            tools: &request.tools,
            temperature: request.temperature,
        }
    }

    fn into_response(wire: MessagesResponse) -> ModelResponse {
        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for part in wire.content {
            match part {
                ContentPart::Text { text: t } => text.push_str(&t),
                ContentPart::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall { id, name, input })
                }
                ContentPart::ToolResult { .. } | ContentPart::Unsupported => {}
            }
        }
        let usage = wire
            .usage
            .map(|u| Usage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();
        ModelResponse {
            text,
            tool_calls,
            stop_reason: wire.stop_reason.unwrap_or(StopReason::EndTurn),
            usage,
        }
    }

    fn status_error(status: StatusCode, body: &str) -> Error {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| body.to_string());
        match status {
            StatusCode::TOO_MANY_REQUESTS => Error::Quota(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Error::Timeout(message),
            StatusCode::UNAUTHORIZED => Error::InvalidApiKey,
            _ => Error::ProviderApi(format!("{status}: {message}")),
        }
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn call_model(&self, request: ModelRequest) -> Result<ModelResponse> {
        let body = Self::request_body(&request);

        let response = self
            .http
            .post(&self.base_url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(e.to_string())
                } else {
                    Error::Request(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Request(format!("failed to read response body: {e}")))?;
        if !status.is_success() {
            return Err(Self::status_error(status, &text));
        }

        let wire: MessagesResponse = serde_json::from_str(&text)?;
        let response = Self::into_response(wire);
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            tool_calls = response.tool_calls.len(),
            "model call finished"
        );
        Ok(response)
    }
}
