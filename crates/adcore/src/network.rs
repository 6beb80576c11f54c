//! Identity types shared across coordinators, adapters and slots.

use serde::{Deserialize, Serialize};

/// Identifier of an ad network (one coordinator per network per process).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NetworkId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one adapter wrapper instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdapterId(uuid::Uuid);

impl AdapterId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        let uuid = uuid::Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }
}

impl Default for AdapterId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AdapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network-specific key of one logical ad opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementId(String);

impl PlacementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlacementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for PlacementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry key pairing an adapter instance with one of its placements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub adapter: AdapterId,
    pub placement: PlacementId,
}

impl SlotKey {
    pub fn new(adapter: AdapterId, placement: PlacementId) -> Self {
        Self { adapter, placement }
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.adapter, self.placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_ids_are_unique() {
        assert_ne!(AdapterId::new(), AdapterId::new());
    }

    #[test]
    fn adapter_id_parses_its_display_form() {
        let id = AdapterId::new();
        assert_eq!(AdapterId::parse(&id.to_string()).unwrap(), id);
        assert!(AdapterId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn network_id_serializes_as_plain_string() {
        insta::assert_json_snapshot!(NetworkId::from("unity"), @r#""unity""#);
    }

    #[test]
    fn slot_key_display_joins_adapter_and_placement() {
        let adapter = AdapterId::new();
        let key = SlotKey::new(adapter, PlacementId::from("rewarded_main"));
        assert_eq!(key.to_string(), format!("{adapter}/rewarded_main"));
    }
}
