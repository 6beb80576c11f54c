//! Error types surfaced by coordinators, slots and adapters.

use crate::slot::SlotState;

/// Terminal initialization failure. There is no retry at this layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("Network initialization failed: {0}")]
    Failed(String),

    /// The waiter was dropped before the coordinator resolved.
    #[error("Initialization outcome unavailable")]
    Unavailable,
}

/// Load failure reported by the network. Recoverable: the slot accepts a new load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("No fill")]
    NoFill,

    #[error("Load failed ({code}): {message}")]
    Generic { code: i32, message: String },
}

impl LoadError {
    pub fn generic(code: i32, message: impl Into<String>) -> Self {
        Self::Generic {
            code,
            message: message.into(),
        }
    }

    pub fn is_no_fill(&self) -> bool {
        matches!(self, Self::NoFill)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShowError {
    #[error("No ads to show")]
    NotReady,

    #[error("No ads to show: ad expired")]
    Expired,

    /// Reported by the network after a show attempt.
    #[error("Show failed ({code}): {message}")]
    ExternalDisplay { code: i32, message: String },
}

impl ShowError {
    pub fn external(code: i32, message: impl Into<String>) -> Self {
        Self::ExternalDisplay {
            code,
            message: message.into(),
        }
    }

    /// True for failures detected locally, before any network call.
    pub fn is_no_ads_to_show(&self) -> bool {
        matches!(self, Self::NotReady | Self::Expired)
    }
}

/// Synchronous rejection of a slot or adapter operation.
///
/// Rejected operations never reach the network SDK.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("A load is already in flight")]
    LoadInFlight,

    #[error("An ad is already loaded")]
    AlreadyLoaded,

    #[error("An ad is currently showing")]
    Showing,

    #[error("Slot destroyed")]
    Destroyed,

    #[error("Network not initialized")]
    NotInitialized,

    #[error("Network initialization failed")]
    InitFailed,

    #[error("Unknown placement: {0}")]
    UnknownPlacement(String),

    #[error(transparent)]
    NotReady(#[from] ShowError),
}

impl SlotError {
    /// Rejection for a load attempted from `state`, or `None` if the state
    /// accepts a new load.
    pub(crate) fn load_rejected(state: SlotState) -> Option<Self> {
        match state {
            SlotState::Empty | SlotState::LoadFailed | SlotState::Closed => None,
            SlotState::Loading => Some(Self::LoadInFlight),
            SlotState::Loaded => Some(Self::AlreadyLoaded),
            SlotState::Showing => Some(Self::Showing),
            SlotState::Destroyed => Some(Self::Destroyed),
        }
    }
}
