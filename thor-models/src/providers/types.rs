//! Request and response types for model providers.
//!
//! Messages use the content-block layout of the Messages API directly, so a
//! conversation containing tool use and tool results can be sent back to the
//! provider without translation.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
///
/// The system prompt travels separately on [`ModelRequest`], and tool
/// results are user messages carrying [`ContentPart::ToolResult`] blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Content of a message, either text or structured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Simple text content.
    Text(String),
    /// Content blocks (text, tool use, tool results).
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Create text content.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Get content as text, joining text blocks if necessary.
    pub fn as_text(&self) -> String {
        match self {
            Content::Text(s) => s.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A block of structured content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content.
    Text { text: String },
    /// A tool invocation requested by the model.
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// The result of running a tool, sent back by the caller.
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// Any block type this crate does not model.
    #[serde(other)]
    Unsupported,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender.
    pub role: Role,
    /// Content of the message.
    pub content: Content,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<Content>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<Content>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a user message carrying tool results.
    pub fn tool_results(results: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: Content::Parts(results),
        }
    }
}

/// Tool definition offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema for the tool input.
    pub input_schema: serde_json::Value,
}

/// A tool call made by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call.
    pub id: String,
    /// Name of the tool to call.
    pub name: String,
    /// Arguments as a JSON value.
    pub input: serde_json::Value,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of input/prompt tokens.
    pub input_tokens: u64,
    /// Number of output/completion tokens.
    pub output_tokens: u64,
    /// Total tokens (input + output).
    pub total_tokens: u64,
}

impl Usage {
    /// Create new usage statistics.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response.
    EndTurn,
    /// Hit max tokens limit.
    MaxTokens,
    /// Hit a stop sequence.
    StopSequence,
    /// Model wants to call a tool.
    ToolUse,
    /// Any other reason reported by the provider.
    #[serde(other)]
    Other,
}

/// A single model invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Model name to use.
    pub model: String,
    /// System prompt, sent outside the message list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Tools the model may call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ModelRequest {
    /// Create a new request.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            messages,
            tools: Vec::new(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set available tools.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// Response from a model invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Concatenated text blocks.
    pub text: String,
    /// Tool calls requested by the model, in order.
    pub tool_calls: Vec<ToolCall>,
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Token usage statistics.
    pub usage: Usage,
}

impl ModelResponse {
    /// Whether the model is waiting on tool results.
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The assistant turn to append to the conversation before sending
    /// tool results back.
    pub fn to_assistant_message(&self) -> Message {
        let mut parts = Vec::with_capacity(self.tool_calls.len() + 1);
        if !self.text.is_empty() {
            parts.push(ContentPart::Text {
                text: self.text.clone(),
            });
        }
        parts.extend(self.tool_calls.iter().map(|call| ContentPart::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
        }));
        Message::assistant(Content::Parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn text_message_serializes_as_plain_string() {
        let value = serde_json::to_value(Message::user("Hello")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn tool_result_block_omits_false_error_flag() {
        let msg = Message::tool_results(vec![ContentPart::ToolResult {
            tool_use_id: "toolu_1".into(),
            content: "ok".into(),
            is_error: false,
        }]);
        let value = serde_json::to_value(msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "user",
                "content": [{"type": "tool_result", "tool_use_id": "toolu_1", "content": "ok"}]
            })
        );
    }

    #[test]
    fn unknown_block_type_deserializes_as_unsupported() {
        let part: ContentPart =
            serde_json::from_value(json!({"type": "thinking", "thinking": "hmm"})).unwrap();
        assert_eq!(part, ContentPart::Unsupported);
    }

    #[test]
    fn content_as_text_joins_text_blocks_only() {
        let content = Content::Parts(vec![
            ContentPart::Text { text: "a".into() },
            ContentPart::ToolUse {
                id: "1".into(),
                name: "read_file".into(),
                input: json!({}),
            },
            ContentPart::Text { text: "b".into() },
        ]);
        assert_eq!(content.as_text(), "ab");
    }

    #[test]
    fn unknown_stop_reason_maps_to_other() {
        let reason: StopReason = serde_json::from_str("\"pause_turn\"").unwrap();
        assert_eq!(reason, StopReason::Other);
        let reason: StopReason = serde_json::from_str("\"tool_use\"").unwrap();
        assert_eq!(reason, StopReason::ToolUse);
    }

    #[test]
    fn request_builder_sets_fields() {
        let req = ModelRequest::new("sonnet-4", vec![Message::user("hi")])
            .with_system_prompt("be brief")
            .with_max_tokens(4000)
            .with_temperature(0.7);
        assert_eq!(req.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(req.max_tokens, Some(4000));
        assert!(req.tools.is_empty());
    }

    #[test]
    fn assistant_message_replays_tool_calls() {
        let response = ModelResponse {
            text: "Let me look.".into(),
            tool_calls: vec![ToolCall {
                id: "toolu_9".into(),
                name: "list_files".into(),
                input: json!({"directory": "."}),
            }],
            stop_reason: StopReason::ToolUse,
            usage: Usage::new(10, 5),
        };
        assert!(response.wants_tools());

        let msg = response.to_assistant_message();
        assert_eq!(msg.role, Role::Assistant);
        let Content::Parts(parts) = msg.content else {
            panic!("expected content parts");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[1], ContentPart::ToolUse { id, .. } if id == "toolu_9"));
    }

    #[test]
    fn usage_totals_tokens() {
        assert_eq!(Usage::new(7, 3).total_tokens, 10);
    }
}
