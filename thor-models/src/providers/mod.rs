//! Model provider trait and implementations.
//!
//! The [`ModelProvider`] trait is the single boundary through which the rest
//! of thor talks to a hosted model. Callers build a [`ModelRequest`], get a
//! [`ModelResponse`] back, and never see the wire format.
//!
//! # Example
//!
//! ```ignore
//! use thor_models::providers::{Message, ModelProvider, ModelRequest};
//!
//! async fn ask(provider: &dyn ModelProvider) -> thor_models::Result<String> {
//!     let request = ModelRequest::new("claude-3-5-sonnet-20241022", vec![Message::user("Hello!")]);
//!     Ok(provider.call_model(request).await?.text)
//! }
//! ```

mod anthropic;
mod types;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

pub use anthropic::AnthropicProvider;
pub use types::*;

use crate::{Error, Result};

/// Trait for hosted model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the provider name (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Perform a single model invocation.
    ///
    /// Failures are typed: [`Error::Request`] when nothing came back,
    /// [`Error::Timeout`], [`Error::Quota`] for rate limiting, and
    /// [`Error::ProviderApi`] for any other non-success response.
    async fn call_model(&self, request: ModelRequest) -> Result<ModelResponse>;
}

/// Caps the number of in-flight calls to an inner provider.
pub struct ConcurrencyLimited {
    inner: Arc<dyn ModelProvider>,
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyLimited {
    pub fn new(inner: Arc<dyn ModelProvider>, max_concurrent: usize) -> Self {
        Self {
            inner,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[async_trait]
impl ModelProvider for ConcurrencyLimited {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn call_model(&self, request: ModelRequest) -> Result<ModelResponse> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| Error::Request(format!("semaphore closed: {e}")))?;
        self.inner.call_model(request).await
    }
}
