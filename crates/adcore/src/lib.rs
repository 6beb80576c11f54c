//! adcore: shared substrate for ad network adapters.
//!
//! Three pieces every network adapter is built on:
//!
//! - [`InitCoordinator`]: runs a network SDK's initialization at most once per
//!   process and fans the outcome out to every caller.
//! - [`AdSlot`]: the load/show/close state machine for one placement, with
//!   stale-callback protection and a lock-free readiness flag.
//! - [`EphemeralHandleRegistry`]: look up loaded ad objects by adapter
//!   identity without keeping them alive.
//!
//! [`NetworkAdapter`] composes them per network.

mod adapter;
mod config;
mod coordinator;
mod error;
mod handle_registry;
mod init_state;
mod network;
mod registry;
pub mod slot;
pub mod telemetry;
mod version;

#[cfg(test)]
mod testing;

pub use adapter::NetworkAdapter;
pub use config::{AdFormat, AdapterConfig, RewardDelivery, SlotPolicy};
pub use coordinator::{InitCompletion, InitCoordinator, InitListener, SdkInitializer};
pub use error::{InitError, LoadError, ShowError, SlotError};
pub use handle_registry::EphemeralHandleRegistry;
pub use init_state::{InitOutcome, InitReport, InitState};
pub use network::{AdapterId, NetworkId, PlacementId, SlotKey};
pub use registry::{CoordinatorRegistry, NetworkSnapshot};
pub use slot::{
    AdEvent, AdHandle, AdListener, AdNetwork, AdSlot, HandleRegistry, LoadRequest, Reward,
    SlotCallback, SlotState,
};
pub use version::{ADCORE_VERSION, VersionInfo};
