//! Process-wide registry of init coordinators, one per network.
//!
//! Coordinators are created lazily on first use and never removed: an init
//! outcome holds for the life of the process, so the registry grows by at most
//! one entry per network and is never torn down.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use serde::Serialize;

use crate::coordinator::{InitCoordinator, SdkInitializer};
use crate::init_state::{InitReport, InitState};
use crate::network::NetworkId;

/// Point-in-time view of one network's initialization.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSnapshot {
    pub network: NetworkId,
    pub state: InitState,
    pub pending_listeners: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<InitReport>,
}

impl NetworkSnapshot {
    fn of(coordinator: &InitCoordinator) -> Self {
        Self {
            network: coordinator.network().clone(),
            state: coordinator.state(),
            pending_listeners: coordinator.pending_listeners(),
            report: coordinator.report(),
        }
    }
}

pub struct CoordinatorRegistry {
    coordinators: DashMap<NetworkId, Arc<InitCoordinator>>,
}

impl CoordinatorRegistry {
    pub fn new() -> Self {
        Self {
            coordinators: DashMap::new(),
        }
    }

    /// The registry shared by every adapter in the process.
    pub fn global() -> &'static CoordinatorRegistry {
        static GLOBAL: OnceLock<CoordinatorRegistry> = OnceLock::new();
        GLOBAL.get_or_init(CoordinatorRegistry::new)
    }

    /// Get the coordinator for `network`, creating it on first use.
    ///
    /// `sdk` is only called when no coordinator exists yet. If two callers race
    /// to create one, both get the same coordinator and the loser's SDK binding
    /// is dropped unused.
    pub fn coordinator<F>(&self, network: &NetworkId, sdk: F) -> Arc<InitCoordinator>
    where
        F: FnOnce() -> Arc<dyn SdkInitializer>,
    {
        if let Some(existing) = self.get(network) {
            return existing;
        }

        let candidate = InitCoordinator::new(network.clone(), sdk());
        let entry = self
            .coordinators
            .entry(network.clone())
            .or_insert_with(|| {
                tracing::debug!(%network, "Registered init coordinator");
                candidate
            });
        Arc::clone(entry.value())
    }

    /// The coordinator for `network`, if one was created.
    pub fn get(&self, network: &NetworkId) -> Option<Arc<InitCoordinator>> {
        self.coordinators
            .get(network)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Number of networks with a coordinator.
    pub fn len(&self) -> usize {
        self.coordinators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinators.is_empty()
    }

    /// Snapshot of every known network, ordered by network id.
    pub fn snapshot(&self) -> Vec<NetworkSnapshot> {
        // Collect first: snapshotting takes each coordinator's own lock.
        let coordinators: Vec<_> = self
            .coordinators
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut snapshots: Vec<_> = coordinators
            .iter()
            .map(|c| NetworkSnapshot::of(c))
            .collect();
        snapshots.sort_by(|a, b| a.network.cmp(&b.network));
        snapshots
    }
}

impl Default for CoordinatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
