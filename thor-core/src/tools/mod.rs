//! Tool dispatch for model-backed agents
//!
//! Models ask for tools by name with JSON arguments. [`ToolCall::parse`]
//! turns that into a closed enum, and [`ToolRunner`] executes it under a
//! timeout with every path confined to a configured root.

mod call;
mod runner;

pub use call::{SearchMatch, TOOL_NAMES, ToolCall, ToolOutput};
pub use runner::{ToolConfig, ToolRunner};
