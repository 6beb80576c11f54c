//! Initialization state types for a network SDK.

use serde::{Deserialize, Serialize};

/// Initialization state of one network SDK.
///
/// Monotonic: `None -> InProgress -> Success | Failed`. Both terminal states
/// hold for the rest of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitState {
    /// Nobody has asked for initialization yet
    #[default]
    None,
    /// SDK init issued, waiting for its completion callback
    InProgress,
    /// SDK reported success
    Success,
    /// SDK reported failure
    Failed,
}

impl InitState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// Outcome reported by a network SDK's init callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Success,
    Failed(String),
}

impl InitOutcome {
    pub fn state(&self) -> InitState {
        match self {
            Self::Success => InitState::Success,
            Self::Failed(_) => InitState::Failed,
        }
    }
}

/// Record of the initialization attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitReport {
    /// When init was issued (ISO 8601 format).
    pub started_at: String,
    /// When the SDK reported back (ISO 8601 format), if it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub state: InitState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InitReport {
    /// Create a report with the current time as started_at.
    pub fn started() -> Self {
        Self {
            started_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
            state: InitState::InProgress,
            error: None,
        }
    }

    /// Close the report with the SDK's outcome.
    pub fn completed(mut self, outcome: &InitOutcome) -> Self {
        self.completed_at = Some(chrono::Utc::now().to_rfc3339());
        self.state = outcome.state();
        if let InitOutcome::Failed(message) = outcome {
            self.error = Some(message.clone());
        }
        self
    }
}
