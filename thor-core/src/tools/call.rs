//! Typed tool calls and their outputs

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thor_models::providers::ToolDefinition;

use crate::error::ToolError;

/// Names a model may call, in definition order
pub const TOOL_NAMES: [&str; 5] = [
    "read_file",
    "write_file",
    "list_files",
    "search_files",
    "run_command",
];

fn default_directory() -> String {
    ".".to_string()
}

fn default_pattern() -> String {
    "*".to_string()
}

/// A tool invocation with validated arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "input", rename_all = "snake_case")]
pub enum ToolCall {
    ReadFile {
        path: String,
    },
    WriteFile {
        path: String,
        content: String,
    },
    ListFiles {
        #[serde(default = "default_directory")]
        directory: String,
        #[serde(default = "default_pattern")]
        pattern: String,
    },
    SearchFiles {
        query: String,
        #[serde(default = "default_pattern")]
        file_pattern: String,
    },
    RunCommand {
        command: String,
        #[serde(default)]
        cwd: Option<String>,
    },
}

impl ToolCall {
    /// Build a call from a model-supplied tool name and JSON arguments
    pub fn parse(name: &str, args: Value) -> Result<Self, ToolError> {
        if !TOOL_NAMES.contains(&name) {
            return Err(ToolError::UnknownTool(name.to_string()));
        }
        let args = if args.is_null() { json!({}) } else { args };
        serde_json::from_value(json!({ "name": name, "input": args })).map_err(|e| {
            ToolError::InvalidArguments {
                tool: name.to_string(),
                message: e.to_string(),
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::ReadFile { .. } => "read_file",
            ToolCall::WriteFile { .. } => "write_file",
            ToolCall::ListFiles { .. } => "list_files",
            ToolCall::SearchFiles { .. } => "search_files",
            ToolCall::RunCommand { .. } => "run_command",
        }
    }

    /// Schemas offered to the model
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "read_file".into(),
                description: "Read the contents of a file".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Path to the file to read"}
                    },
                    "required": ["path"]
                }),
            },
            ToolDefinition {
                name: "write_file".into(),
                description: "Write content to a file, creating parent directories".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Path to the file to write"},
                        "content": {"type": "string", "description": "Content to write"}
                    },
                    "required": ["path", "content"]
                }),
            },
            ToolDefinition {
                name: "list_files".into(),
                description: "List files in a directory. Use ** in the pattern to recurse".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "directory": {"type": "string", "default": "."},
                        "pattern": {"type": "string", "default": "*"}
                    }
                }),
            },
            ToolDefinition {
                name: "search_files".into(),
                description: "Search file contents for text (case-insensitive)".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "Text to look for"},
                        "file_pattern": {"type": "string", "default": "*"}
                    },
                    "required": ["query"]
                }),
            },
            ToolDefinition {
                name: "run_command".into(),
                description: "Run a shell command and capture its output".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "command": {"type": "string"},
                        "cwd": {"type": "string", "description": "Working directory"}
                    },
                    "required": ["command"]
                }),
            },
        ]
    }
}

/// One line matching a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub path: String,
    pub line: usize,
    pub text: String,
}

/// Result of a successful tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutput {
    FileContent {
        path: String,
        content: String,
    },
    Written {
        path: String,
        bytes: usize,
    },
    Listing {
        entries: Vec<String>,
    },
    Matches {
        matches: Vec<SearchMatch>,
        truncated: bool,
    },
    Command {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl ToolOutput {
    /// Text handed back to the model as the tool result
    pub fn to_model_text(&self) -> String {
        match self {
            ToolOutput::FileContent { content, .. } => content.clone(),
            ToolOutput::Written { path, bytes } => format!("Wrote {bytes} bytes to {path}"),
            ToolOutput::Listing { entries } if entries.is_empty() => "No files found".into(),
            ToolOutput::Listing { entries } => entries.join("\n"),
            ToolOutput::Matches { matches, .. } if matches.is_empty() => "No matches".into(),
            ToolOutput::Matches { matches, truncated } => {
                let mut text = matches
                    .iter()
                    .map(|m| format!("{}:{}: {}", m.path, m.line, m.text))
                    .collect::<Vec<_>>()
                    .join("\n");
                if *truncated {
                    text.push_str("\n(results truncated)");
                }
                text
            }
            ToolOutput::Command {
                exit_code,
                stdout,
                stderr,
            } => {
                let code = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                let mut text = format!("exit code: {code}\n");
                if !stdout.is_empty() {
                    text.push_str("stdout:\n");
                    text.push_str(stdout);
                }
                if !stderr.is_empty() {
                    text.push_str("\nstderr:\n");
                    text.push_str(stderr);
                }
                text
            }
        }
    }
}
