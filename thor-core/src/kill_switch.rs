//! Process-wide stop flag for orchestration.
//!
//! Engaging the switch stops new steps, model calls and tool calls from
//! starting. Work already in flight runs to completion. The switch stays
//! engaged until [`KillSwitch::reset`].

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug)]
struct State {
    token: CancellationToken,
    reason: Option<String>,
}

/// Cloneable handle to a shared stop flag
#[derive(Debug, Clone)]
pub struct KillSwitch {
    state: Arc<RwLock<State>>,
}

/// Point-in-time view of the switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillSwitchState {
    pub engaged: bool,
    pub reason: Option<String>,
}

impl KillSwitch {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                token: CancellationToken::new(),
                reason: None,
            })),
        }
    }

    /// Engage the switch. A second call keeps the first reason.
    pub fn engage(&self, reason: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.token.is_cancelled() {
            return;
        }
        let reason = reason.into();
        warn!(%reason, "kill switch engaged");
        state.reason = Some(reason);
        state.token.cancel();
    }

    /// Disengage so new work may start again
    pub fn reset(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.token.is_cancelled() {
            info!("kill switch reset");
        }
        state.token = CancellationToken::new();
        state.reason = None;
    }

    pub fn is_engaged(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .token
            .is_cancelled()
    }

    /// The reason, if engaged
    pub fn reason(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        if state.token.is_cancelled() {
            state.reason.clone()
        } else {
            None
        }
    }

    pub fn state(&self) -> KillSwitchState {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        KillSwitchState {
            engaged: state.token.is_cancelled(),
            reason: state.reason.clone(),
        }
    }

    /// Token that fires when the switch is next engaged
    pub fn token(&self) -> CancellationToken {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .token
            .clone()
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}
