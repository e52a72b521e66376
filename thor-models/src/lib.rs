//! Model catalog, selection and invocation for thor.
//!
//! This crate provides:
//! - A catalog of configured models with per-thousand-token pricing
//! - Budget-aware model selection from a task classification
//! - Provider trait for invoking a hosted model, with an Anthropic implementation
//! - Credential lookup for API keys
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   ModelSelector                      │
//! │        (classification + daily spend → model)        │
//! │  ┌─────────────────────────────────────────────┐    │
//! │  │ ModelCatalog: haiku-4 │ sonnet-4 │ opus-4    │    │
//! │  └─────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────┘
//!                          │ model name
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │     ConcurrencyLimited → AnthropicProvider          │
//! │            (ApiKey from CredentialStore)            │
//! └─────────────────────────────────────────────────────┘
//! ```

mod error;
mod types;

pub mod auth;
pub mod catalog;
pub mod providers;
pub mod selector;

pub use catalog::ModelCatalog;
pub use error::{Error, Result};
pub use selector::{ModelSelector, TaskClass};
pub use types::{ModelInfo, ModelInfoBuilder, ModelTier};
