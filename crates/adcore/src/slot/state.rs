//! Slot state and the internal event type.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::AdHandle;
use crate::error::{LoadError, ShowError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotState {
    #[default]
    Empty,
    Loading,
    Loaded,
    Showing,
    LoadFailed,
    Closed,
    Destroyed,
}

impl SlotState {
    pub fn accepts_load(&self) -> bool {
        matches!(self, Self::Empty | Self::LoadFailed | Self::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub name: String,
    pub amount: i64,
}

impl Reward {
    pub fn new(name: impl Into<String>, amount: i64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

impl Default for Reward {
    fn default() -> Self {
        Self::new("reward", 1)
    }
}

/// Everything a network can report about one ad, as a single type.
#[derive(Clone)]
pub enum AdEvent {
    Loaded(Arc<dyn AdHandle>),
    LoadFailed(LoadError),
    Opened,
    Clicked,
    Rewarded(Reward),
    Closed,
    ShowFailed(ShowError),
}

impl AdEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Loaded(_) => "loaded",
            Self::LoadFailed(_) => "load_failed",
            Self::Opened => "opened",
            Self::Clicked => "clicked",
            Self::Rewarded(_) => "rewarded",
            Self::Closed => "closed",
            Self::ShowFailed(_) => "show_failed",
        }
    }
}

impl std::fmt::Debug for AdEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFailed(e) => f.debug_tuple("LoadFailed").field(e).finish(),
            Self::Rewarded(r) => f.debug_tuple("Rewarded").field(r).finish(),
            Self::ShowFailed(e) => f.debug_tuple("ShowFailed").field(e).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_accepted_from_empty_failed_and_closed_only() {
        let accepting: Vec<_> = [
            SlotState::Empty,
            SlotState::Loading,
            SlotState::Loaded,
            SlotState::Showing,
            SlotState::LoadFailed,
            SlotState::Closed,
            SlotState::Destroyed,
        ]
        .into_iter()
        .filter(SlotState::accepts_load)
        .collect();

        assert_eq!(
            accepting,
            vec![SlotState::Empty, SlotState::LoadFailed, SlotState::Closed]
        );
    }

    #[test]
    fn slot_state_serializes_screaming_snake_case() {
        insta::assert_json_snapshot!(
            [SlotState::LoadFailed, SlotState::Destroyed],
            @r#"
        [
          "LOAD_FAILED",
          "DESTROYED"
        ]
        "#
        );
    }

    #[test]
    fn event_debug_names_the_kind() {
        assert_eq!(format!("{:?}", AdEvent::Closed), "closed");
        assert_eq!(
            format!("{:?}", AdEvent::LoadFailed(LoadError::NoFill)),
            "LoadFailed(NoFill)"
        );
    }
}
