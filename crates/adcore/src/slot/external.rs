//! Boundary traits: the network SDK below the slot and the mediation layer above it.

use serde::{Deserialize, Serialize};

use super::{Reward, SlotCallback};
use crate::error::{LoadError, ShowError};
use crate::network::PlacementId;

/// A load request for one placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub placement: PlacementId,
    /// Network-specific payload (bid response, extras, ...), passed through untouched.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl LoadRequest {
    pub fn new(placement: impl Into<PlacementId>) -> Self {
        Self {
            placement: placement.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Ad loading entry point of a network SDK binding.
pub trait AdNetwork: Send + Sync {
    /// Start loading. The result is reported through `callback`
    /// (`loaded` or `load_failed`), from any thread, possibly synchronously.
    fn load(&self, request: &LoadRequest, callback: SlotCallback);

    fn sdk_version(&self) -> Option<String> {
        None
    }
}

/// A loaded ad object owned by the network SDK.
pub trait AdHandle: Send + Sync {
    /// Trigger display. Follow-up events go through `callback`.
    fn show(&self, callback: SlotCallback);

    /// Queried at show time, since expiry is time based.
    fn is_expired(&self) -> bool {
        false
    }

    /// Release the ad object. The slot calls this at most once per handle.
    fn destroy(&self) {}
}

/// Outcomes the slot reports to the mediation layer.
pub trait AdListener: Send + Sync {
    fn on_ad_ready(&self);
    fn on_ad_load_failed(&self, error: &LoadError);
    fn on_ad_show_failed(&self, error: &ShowError);
    fn on_ad_opened(&self) {}
    fn on_ad_clicked(&self) {}
    fn on_ad_closed(&self) {}
    fn on_ad_rewarded(&self, _reward: &Reward) {}
}
