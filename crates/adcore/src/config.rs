//! Adapter configuration and per-network slot policy.

use serde::{Deserialize, Serialize};

use crate::network::NetworkId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdFormat {
    #[default]
    Interstitial,
    Rewarded,
}

impl AdFormat {
    pub fn is_reward_capable(&self) -> bool {
        matches!(self, Self::Rewarded)
    }
}

/// When a reward is forwarded to the listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardDelivery {
    /// Forward `on_ad_rewarded` as soon as the network reports it.
    #[default]
    PassThrough,
    /// Hold the reward and deliver it just before `on_ad_closed`. A reward
    /// reported after close is forwarded as soon as it arrives.
    BeforeClose,
}

/// Per-network policy layered on the shared slot state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotPolicy {
    pub format: AdFormat,
    /// Destroy the ad handle when the ad closes. Networks that reuse one
    /// handle across load cycles turn this off.
    pub destroy_on_close: bool,
    pub reward_delivery: RewardDelivery,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            format: AdFormat::default(),
            destroy_on_close: true,
            reward_delivery: RewardDelivery::default(),
        }
    }
}

impl SlotPolicy {
    pub fn rewarded() -> Self {
        Self {
            format: AdFormat::Rewarded,
            ..Self::default()
        }
    }

    pub fn with_destroy_on_close(mut self, destroy_on_close: bool) -> Self {
        self.destroy_on_close = destroy_on_close;
        self
    }

    pub fn with_reward_delivery(mut self, reward_delivery: RewardDelivery) -> Self {
        self.reward_delivery = reward_delivery;
        self
    }
}

/// Adapter configuration as supplied by the host, usually as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub network: NetworkId,
    pub adapter_version: Option<String>,
    /// Network-specific init parameters (app key, account id, ...), passed
    /// through to the SDK untouched.
    pub init: serde_json::Value,
    pub policy: SlotPolicy,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            network: NetworkId::new("default"),
            adapter_version: None,
            init: serde_json::Value::Null,
            policy: SlotPolicy::default(),
        }
    }
}

impl AdapterConfig {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: NetworkId::new(network),
            ..Self::default()
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn with_adapter_version(mut self, version: impl Into<String>) -> Self {
        self.adapter_version = Some(version.into());
        self
    }

    pub fn with_init(mut self, init: serde_json::Value) -> Self {
        self.init = init;
        self
    }

    pub fn with_policy(mut self, policy: SlotPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_policy_destroys_on_close() {
        let policy = SlotPolicy::default();
        assert_eq!(policy.format, AdFormat::Interstitial);
        assert!(policy.destroy_on_close);
        assert_eq!(policy.reward_delivery, RewardDelivery::PassThrough);
    }

    #[test]
    fn only_rewarded_format_is_reward_capable() {
        assert!(AdFormat::Rewarded.is_reward_capable());
        assert!(!AdFormat::Interstitial.is_reward_capable());
    }

    #[test]
    fn config_from_partial_json_fills_defaults() {
        let config = AdapterConfig::from_json(&json!({
            "network": "vungle",
            "init": {"app_id": "abc"},
            "policy": {"format": "rewarded", "reward_delivery": "before_close"}
        }))
        .unwrap();

        assert_eq!(config.network.as_str(), "vungle");
        assert_eq!(config.init, json!({"app_id": "abc"}));
        assert_eq!(config.policy.format, AdFormat::Rewarded);
        assert_eq!(config.policy.reward_delivery, RewardDelivery::BeforeClose);
        assert!(config.policy.destroy_on_close);
        assert!(config.adapter_version.is_none());
    }

    #[test]
    fn config_rejects_unknown_format() {
        let result = AdapterConfig::from_json(&json!({"policy": {"format": "banner"}}));
        assert!(result.is_err());
    }

    #[test]
    fn policy_serializes_snake_case() {
        insta::assert_json_snapshot!(
            SlotPolicy::rewarded().with_destroy_on_close(false),
            @r#"
        {
          "format": "rewarded",
          "destroy_on_close": false,
          "reward_delivery": "pass_through"
        }
        "#
        );
    }

    #[test]
    fn builder_sets_fields() {
        let config = AdapterConfig::new("mintegral")
            .with_adapter_version("4.3.1")
            .with_init(json!({"app_key": "k"}))
            .with_policy(SlotPolicy::rewarded());

        assert_eq!(config.network, NetworkId::from("mintegral"));
        assert_eq!(config.adapter_version.as_deref(), Some("4.3.1"));
        assert_eq!(config.policy.format, AdFormat::Rewarded);
    }
}
