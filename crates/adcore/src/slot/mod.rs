//! Ad slot lifecycle: load -> ready -> show -> closed/destroyed.
//!
//! One `AdSlot` per placement load cycle. Callers drive it with `load`, `show`
//! and `destroy`; the network drives it through a `SlotCallback`, from any
//! thread and at any time, including after the slot was destroyed.
//!
//! Every callback carries the generation of the load that produced it. Each
//! `load` and each `destroy` starts a new generation, so late events from a
//! superseded cycle are discarded before they touch state.

mod external;
mod lifecycle;
mod state;

pub use external::{AdHandle, AdListener, AdNetwork, LoadRequest};
pub use lifecycle::{AdSlot, HandleRegistry, SlotCallback};
pub use state::{AdEvent, Reward, SlotState};
