//! NetworkAdapter - one adapter instance per mediation wrapper.
//!
//! Owns one `AdSlot` per placement and shares the network's init coordinator
//! with every other adapter of the same network. Loaded handles are published
//! in a handle registry under `(adapter id, placement)` so the host can look
//! them up without holding the adapter.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::AdapterConfig;
use crate::coordinator::{InitCoordinator, InitListener, SdkInitializer};
use crate::error::{InitError, SlotError};
use crate::init_state::InitState;
use crate::network::{AdapterId, PlacementId, SlotKey};
use crate::registry::CoordinatorRegistry;
use crate::slot::{
    AdHandle, AdListener, AdNetwork, AdSlot, HandleRegistry, LoadRequest, SlotState,
};
use crate::version::VersionInfo;

pub struct NetworkAdapter {
    id: AdapterId,
    config: AdapterConfig,
    coordinator: Arc<InitCoordinator>,
    network: Arc<dyn AdNetwork>,
    slots: DashMap<PlacementId, Arc<AdSlot>>,
    handles: Arc<HandleRegistry>,
}

impl NetworkAdapter {
    /// Adapter sharing `coordinator` with every other adapter of its network.
    pub fn new(
        config: AdapterConfig,
        coordinator: Arc<InitCoordinator>,
        network: Arc<dyn AdNetwork>,
    ) -> Self {
        if coordinator.network() != &config.network {
            tracing::warn!(
                configured = %config.network,
                coordinator = %coordinator.network(),
                "Adapter network does not match its init coordinator"
            );
        }
        Self {
            id: AdapterId::new(),
            config,
            coordinator,
            network,
            slots: DashMap::new(),
            handles: Arc::new(HandleRegistry::new()),
        }
    }

    /// Adapter bound to `registry`'s coordinator for the configured network.
    pub fn in_registry(
        registry: &CoordinatorRegistry,
        config: AdapterConfig,
        sdk: Arc<dyn SdkInitializer>,
        network: Arc<dyn AdNetwork>,
    ) -> Self {
        let coordinator = registry.coordinator(&config.network, || sdk);
        Self::new(config, coordinator, network)
    }

    /// Publish loaded handles in a registry shared with other adapters.
    pub fn with_handle_registry(mut self, handles: Arc<HandleRegistry>) -> Self {
        self.handles = handles;
        self
    }

    /// Identity of this adapter instance, unique per process.
    pub fn id(&self) -> AdapterId {
        self.id
    }

    /// Configuration the adapter was created with.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Initialization state of the shared network coordinator.
    pub fn init_state(&self) -> InitState {
        self.coordinator.state()
    }

    /// Request network initialization with the configured init parameters.
    pub fn initialize(&self, listener: Arc<dyn InitListener>) {
        tracing::debug!(adapter = %self.id, version = %self.version(), "Adapter initializing");
        self.coordinator.request_init(&self.config.init, listener);
    }

    /// Request initialization and wait for its outcome.
    pub async fn initialized(&self) -> Result<(), InitError> {
        self.coordinator.initialized(&self.config.init).await
    }

    /// Load an ad for `request.placement`, creating the placement's slot on
    /// first use. Rejected until the network has initialized successfully.
    pub fn load(
        &self,
        request: &LoadRequest,
        listener: Arc<dyn AdListener>,
    ) -> Result<(), SlotError> {
        match self.coordinator.state() {
            InitState::Success => {}
            InitState::Failed => return Err(SlotError::InitFailed),
            InitState::None | InitState::InProgress => return Err(SlotError::NotInitialized),
        }

        let slot = self.slot(&request.placement);
        tracing::debug!(adapter = %self.id, placement = %request.placement, "Load requested");
        slot.load(request, listener)
    }

    /// Show the ad loaded for `placement`.
    pub fn show(&self, placement: &PlacementId) -> Result<(), SlotError> {
        let slot = self
            .slots
            .get(placement)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SlotError::UnknownPlacement(placement.to_string()))?;
        slot.show()
    }

    /// Whether `placement` has an ad ready to show.
    pub fn is_ready(&self, placement: &PlacementId) -> bool {
        self.slots
            .get(placement)
            .is_some_and(|entry| entry.is_ready())
    }

    /// Slot state for `placement`, if the adapter has a slot for it.
    pub fn state(&self, placement: &PlacementId) -> Option<SlotState> {
        let slot = self
            .slots
            .get(placement)
            .map(|entry| Arc::clone(entry.value()))?;
        Some(slot.state())
    }

    /// Destroy the placement's slot and forget it. A later load starts over
    /// with a fresh slot. No-op for unknown placements.
    pub fn destroy(&self, placement: &PlacementId) {
        if let Some((_, slot)) = self.slots.remove(placement) {
            slot.destroy();
        }
    }

    /// Destroy every slot this adapter owns.
    pub fn release_all(&self) {
        let placements: Vec<_> = self.slots.iter().map(|e| e.key().clone()).collect();
        if !placements.is_empty() {
            tracing::debug!(adapter = %self.id, count = placements.len(), "Releasing all slots");
        }
        for placement in placements {
            self.destroy(&placement);
        }
    }

    /// The loaded handle for `placement`, if one is still alive.
    pub fn lookup(&self, placement: &PlacementId) -> Option<Arc<dyn AdHandle>> {
        self.handles.retrieve(&self.key(placement))
    }

    /// Placements with a live slot, sorted.
    pub fn placements(&self) -> Vec<PlacementId> {
        let mut placements: Vec<_> = self.slots.iter().map(|e| e.key().clone()).collect();
        placements.sort();
        placements
    }

    /// Versions of this crate, the adapter release and the network SDK.
    pub fn version(&self) -> VersionInfo {
        let mut version = VersionInfo::new();
        if let Some(adapter) = &self.config.adapter_version {
            version = version.with_adapter(adapter.as_str());
        }
        if let Some(sdk) = self.network.sdk_version() {
            version = version.with_network_sdk(sdk);
        }
        version
    }

    fn key(&self, placement: &PlacementId) -> SlotKey {
        SlotKey::new(self.id, placement.clone())
    }

    fn slot(&self, placement: &PlacementId) -> Arc<AdSlot> {
        let entry = self.slots.entry(placement.clone()).or_insert_with(|| {
            AdSlot::registered(
                placement.clone(),
                Arc::clone(&self.network),
                self.config.policy.clone(),
                Arc::clone(&self.handles),
                self.key(placement),
            )
        });
        Arc::clone(entry.value())
    }
}

impl Drop for NetworkAdapter {
    fn drop(&mut self) {
        self.release_all();
    }
}
