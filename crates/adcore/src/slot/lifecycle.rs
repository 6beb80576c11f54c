//! AdSlot - one placement's ad object and the state machine around it.
//!
//! The availability flag lives next to the state mutex so `is_ready` never
//! takes the lock. It is only written while the lock is held, together with
//! the state it mirrors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::{AdEvent, AdHandle, AdListener, AdNetwork, LoadRequest, Reward, SlotState};
use crate::config::{RewardDelivery, SlotPolicy};
use crate::error::{LoadError, ShowError, SlotError};
use crate::handle_registry::EphemeralHandleRegistry;
use crate::network::{PlacementId, SlotKey};

/// Registry of loaded handles, keyed by adapter instance and placement.
pub type HandleRegistry = EphemeralHandleRegistry<SlotKey, dyn AdHandle>;

/// Routes network events back to the slot for one load generation.
///
/// Holds the slot weakly: a callback retained by the SDK never keeps a
/// released slot alive.
#[derive(Clone)]
pub struct SlotCallback {
    slot: Weak<AdSlot>,
    generation: u64,
    released: Arc<ReleaseLog>,
}

impl SlotCallback {
    /// Load generation this callback belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver `event` to the slot. Dropped if the slot is gone or has moved
    /// on to a newer generation.
    pub fn dispatch(&self, event: AdEvent) {
        match self.slot.upgrade() {
            Some(slot) => slot.handle_event(self.generation, event),
            None => {
                tracing::debug!(
                    generation = self.generation,
                    event = event.kind(),
                    "Slot released, dropping callback"
                );
                if let AdEvent::Loaded(handle) = event {
                    self.released.release(handle);
                }
            }
        }
    }

    pub fn loaded(&self, handle: Arc<dyn AdHandle>) {
        self.dispatch(AdEvent::Loaded(handle));
    }

    pub fn load_failed(&self, error: LoadError) {
        self.dispatch(AdEvent::LoadFailed(error));
    }

    pub fn opened(&self) {
        self.dispatch(AdEvent::Opened);
    }

    pub fn clicked(&self) {
        self.dispatch(AdEvent::Clicked);
    }

    pub fn rewarded(&self, reward: Reward) {
        self.dispatch(AdEvent::Rewarded(reward));
    }

    pub fn closed(&self) {
        self.dispatch(AdEvent::Closed);
    }

    pub fn show_failed(&self, error: ShowError) {
        self.dispatch(AdEvent::ShowFailed(error));
    }
}

/// Handles a slot has destroyed.
///
/// Shared with the slot's callbacks, so a handle the network delivers again
/// after release, even once the slot itself is gone, is not destroyed twice.
#[derive(Default)]
struct ReleaseLog {
    released: Mutex<Vec<Weak<dyn AdHandle>>>,
}

impl ReleaseLog {
    /// Destroy `handle` unless it was already released.
    fn release(&self, handle: Arc<dyn AdHandle>) {
        if self.claim(&handle) {
            handle.destroy();
        } else {
            tracing::debug!("Handle already released, skipping destroy");
        }
    }

    fn claim(&self, handle: &Arc<dyn AdHandle>) -> bool {
        let mut released = self
            .released
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Dead entries go first: a freed handle's address may be reused.
        released.retain(|weak| weak.strong_count() > 0);
        if released
            .iter()
            .any(|weak| std::ptr::addr_eq(weak.as_ptr(), Arc::as_ptr(handle)))
        {
            return false;
        }
        released.push(Arc::downgrade(handle));
        true
    }
}

/// Reward bookkeeping for one show cycle.
#[derive(Default)]
struct RewardTracker {
    pending: Option<Reward>,
    delivered: bool,
}

struct SlotInner {
    state: SlotState,
    generation: u64,
    handle: Option<Arc<dyn AdHandle>>,
    listener: Option<Arc<dyn AdListener>>,
    reward: RewardTracker,
}

struct Registration {
    registry: Arc<HandleRegistry>,
    key: SlotKey,
}

enum Notice {
    Ready,
    LoadFailed(LoadError),
    Opened,
    Clicked,
    Rewarded(Reward),
    Closed,
    ShowFailed(ShowError),
}

/// Work computed under the slot lock and performed after it is released.
#[derive(Default)]
struct Effects {
    release: Vec<Arc<dyn AdHandle>>,
    listener: Option<Arc<dyn AdListener>>,
    notices: Vec<Notice>,
}

impl Effects {
    fn run(self, log: &ReleaseLog) {
        for handle in self.release {
            log.release(handle);
        }
        let Some(listener) = self.listener else {
            return;
        };
        for notice in self.notices {
            match notice {
                Notice::Ready => listener.on_ad_ready(),
                Notice::LoadFailed(error) => listener.on_ad_load_failed(&error),
                Notice::Opened => listener.on_ad_opened(),
                Notice::Clicked => listener.on_ad_clicked(),
                Notice::Rewarded(reward) => listener.on_ad_rewarded(&reward),
                Notice::Closed => listener.on_ad_closed(),
                Notice::ShowFailed(error) => listener.on_ad_show_failed(&error),
            }
        }
    }
}

pub struct AdSlot {
    placement: PlacementId,
    network: Arc<dyn AdNetwork>,
    policy: SlotPolicy,
    registration: Option<Registration>,
    availability: AtomicBool,
    released: Arc<ReleaseLog>,
    inner: Mutex<SlotInner>,
}

impl AdSlot {
    /// Unregistered slot in `Empty` state.
    pub fn new(
        placement: PlacementId,
        network: Arc<dyn AdNetwork>,
        policy: SlotPolicy,
    ) -> Arc<Self> {
        Self::build(placement, network, policy, None)
    }

    /// Slot that publishes its loaded handle in `registry` under `key`.
    pub fn registered(
        placement: PlacementId,
        network: Arc<dyn AdNetwork>,
        policy: SlotPolicy,
        registry: Arc<HandleRegistry>,
        key: SlotKey,
    ) -> Arc<Self> {
        Self::build(
            placement,
            network,
            policy,
            Some(Registration { registry, key }),
        )
    }

    fn build(
        placement: PlacementId,
        network: Arc<dyn AdNetwork>,
        policy: SlotPolicy,
        registration: Option<Registration>,
    ) -> Arc<Self> {
        Arc::new(Self {
            placement,
            network,
            policy,
            registration,
            availability: AtomicBool::new(false),
            released: Arc::default(),
            inner: Mutex::new(SlotInner {
                state: SlotState::Empty,
                generation: 0,
                handle: None,
                listener: None,
                reward: RewardTracker::default(),
            }),
        })
    }

    /// The placement this slot loads for.
    pub fn placement(&self) -> &PlacementId {
        &self.placement
    }

    /// Format, reuse and reward policy applied to every cycle.
    pub fn policy(&self) -> &SlotPolicy {
        &self.policy
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::error!(placement = %self.placement, "Slot mutex poisoned - recovering");
            poisoned.into_inner()
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SlotState {
        self.lock().state
    }

    /// Generation of the current load cycle. Bumped by `load` and `destroy`.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Whether an ad can be shown right now. Lock-free, no side effects.
    pub fn is_ready(&self) -> bool {
        self.availability.load(Ordering::Acquire)
    }

    /// The handle the slot currently holds, loaded or kept for reuse.
    pub fn handle(&self) -> Option<Arc<dyn AdHandle>> {
        self.lock().handle.clone()
    }

    /// Start a load cycle. Accepted only from `Empty`, `LoadFailed` or `Closed`.
    ///
    /// The outcome arrives through `listener` (`on_ad_ready` or
    /// `on_ad_load_failed`); a rejected load never reaches the network.
    pub fn load(
        self: &Arc<Self>,
        request: &LoadRequest,
        listener: Arc<dyn AdListener>,
    ) -> Result<(), SlotError> {
        let callback = {
            let mut inner = self.lock();
            if let Some(rejection) = SlotError::load_rejected(inner.state) {
                tracing::debug!(
                    placement = %self.placement,
                    state = ?inner.state,
                    "Load rejected"
                );
                return Err(rejection);
            }
            inner.generation += 1;
            inner.state = SlotState::Loading;
            self.availability.store(false, Ordering::Release);
            inner.listener = Some(listener);
            inner.reward = RewardTracker::default();
            SlotCallback {
                slot: Arc::downgrade(self),
                generation: inner.generation,
                released: Arc::clone(&self.released),
            }
        };

        tracing::debug!(
            placement = %self.placement,
            generation = callback.generation,
            "Loading ad"
        );
        self.network.load(request, callback);
        Ok(())
    }

    /// Show the loaded ad. Accepted only from `Loaded` with an unexpired handle.
    pub fn show(self: &Arc<Self>) -> Result<(), SlotError> {
        let (handle, generation) = {
            let inner = self.lock();
            match (inner.state, &inner.handle) {
                (SlotState::Loaded, Some(handle)) => (Arc::clone(handle), inner.generation),
                (state, _) => {
                    tracing::debug!(placement = %self.placement, ?state, "Show rejected");
                    return Err(ShowError::NotReady.into());
                }
            }
        };

        if handle.is_expired() {
            self.expire(generation, &handle);
            return Err(ShowError::Expired.into());
        }

        let callback = {
            let mut inner = self.lock();
            if inner.generation != generation || inner.state != SlotState::Loaded {
                // Lost a race with another show or a destroy.
                return Err(ShowError::NotReady.into());
            }
            inner.state = SlotState::Showing;
            self.availability.store(false, Ordering::Release);
            inner.reward = RewardTracker::default();
            SlotCallback {
                slot: Arc::downgrade(self),
                generation,
                released: Arc::clone(&self.released),
            }
        };

        tracing::debug!(placement = %self.placement, generation, "Showing ad");
        handle.show(callback);
        Ok(())
    }

    /// Release the handle and listener. Idempotent, safe from any state.
    pub fn destroy(&self) {
        let (handle, listener) = {
            let mut inner = self.lock();
            if inner.state == SlotState::Destroyed {
                return;
            }
            inner.generation += 1;
            inner.state = SlotState::Destroyed;
            self.availability.store(false, Ordering::Release);
            inner.reward = RewardTracker::default();
            (self.take_handle(&mut inner), inner.listener.take())
        };

        tracing::debug!(placement = %self.placement, "Slot destroyed");
        if let Some(handle) = handle {
            self.released.release(handle);
        }
        drop(listener);
    }

    fn expire(&self, generation: u64, handle: &Arc<dyn AdHandle>) {
        let released = {
            let mut inner = self.lock();
            let current = inner
                .handle
                .as_ref()
                .is_some_and(|h| Arc::ptr_eq(h, handle));
            if inner.generation != generation || inner.state != SlotState::Loaded || !current {
                return;
            }
            inner.state = SlotState::Empty;
            self.availability.store(false, Ordering::Release);
            self.take_handle(&mut inner)
        };

        tracing::info!(placement = %self.placement, generation, "Ad expired before show");
        if let Some(handle) = released {
            self.released.release(handle);
        }
    }

    fn handle_event(&self, generation: u64, event: AdEvent) {
        let effects = {
            let mut inner = self.lock();
            if generation != inner.generation {
                tracing::debug!(
                    placement = %self.placement,
                    generation,
                    current = inner.generation,
                    event = event.kind(),
                    "Stale callback discarded"
                );
                Effects {
                    release: self.orphaned(&inner, event),
                    ..Effects::default()
                }
            } else {
                let mut effects = self.apply(&mut inner, event);
                effects.listener = inner.listener.clone();
                effects
            }
        };
        effects.run(&self.released);
    }

    fn apply(&self, inner: &mut SlotInner, event: AdEvent) -> Effects {
        let mut effects = Effects::default();
        match (inner.state, event) {
            (SlotState::Loading, AdEvent::Loaded(handle)) => {
                if let Some(previous) = inner.handle.take()
                    && !Arc::ptr_eq(&previous, &handle)
                {
                    self.unregister(&previous);
                    effects.release.push(previous);
                }
                self.register(&handle);
                inner.handle = Some(handle);
                inner.state = SlotState::Loaded;
                self.availability.store(true, Ordering::Release);
                tracing::debug!(placement = %self.placement, "Ad loaded");
                effects.notices.push(Notice::Ready);
            }
            (SlotState::Loading, AdEvent::LoadFailed(error)) => {
                inner.state = SlotState::LoadFailed;
                self.availability.store(false, Ordering::Release);
                tracing::debug!(placement = %self.placement, %error, "Ad load failed");
                effects.notices.push(Notice::LoadFailed(error));
            }
            (SlotState::Showing, AdEvent::Opened) => effects.notices.push(Notice::Opened),
            (SlotState::Showing, AdEvent::Clicked) => effects.notices.push(Notice::Clicked),
            (SlotState::Showing | SlotState::Closed, AdEvent::Rewarded(reward)) => {
                self.reward(inner, reward, &mut effects);
            }
            (SlotState::Showing, AdEvent::Closed) => {
                if let Some(reward) = inner.reward.pending.take() {
                    inner.reward.delivered = true;
                    effects.notices.push(Notice::Rewarded(reward));
                }
                self.finish_show(inner, &mut effects);
                effects.notices.push(Notice::Closed);
            }
            (SlotState::Showing, AdEvent::ShowFailed(error)) => {
                inner.reward.pending = None;
                tracing::warn!(placement = %self.placement, %error, "Network failed to show ad");
                self.finish_show(inner, &mut effects);
                effects.notices.push(Notice::ShowFailed(error));
            }
            (state, event) => {
                tracing::debug!(
                    placement = %self.placement,
                    ?state,
                    event = event.kind(),
                    "Callback not valid in current state, ignoring"
                );
                effects.release = self.orphaned(inner, event);
            }
        }
        effects
    }

    fn reward(&self, inner: &mut SlotInner, reward: Reward, effects: &mut Effects) {
        if !self.policy.format.is_reward_capable() {
            tracing::warn!(
                placement = %self.placement,
                format = ?self.policy.format,
                "Reward reported for non-reward format, ignoring"
            );
            return;
        }
        if inner.reward.delivered || inner.reward.pending.is_some() {
            tracing::debug!(placement = %self.placement, "Duplicate reward ignored");
            return;
        }
        match (inner.state, self.policy.reward_delivery) {
            (SlotState::Showing, RewardDelivery::BeforeClose) => {
                inner.reward.pending = Some(reward);
            }
            _ => {
                inner.reward.delivered = true;
                effects.notices.push(Notice::Rewarded(reward));
            }
        }
    }

    fn finish_show(&self, inner: &mut SlotInner, effects: &mut Effects) {
        inner.state = SlotState::Closed;
        self.availability.store(false, Ordering::Release);
        if self.policy.destroy_on_close
            && let Some(handle) = self.take_handle(inner)
        {
            effects.release.push(handle);
        }
    }

    /// A handle delivered by an event that will not be applied. Released
    /// unless it is the one the slot already holds.
    fn orphaned(&self, inner: &SlotInner, event: AdEvent) -> Vec<Arc<dyn AdHandle>> {
        match event {
            AdEvent::Loaded(handle)
                if !inner
                    .handle
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, &handle)) =>
            {
                vec![handle]
            }
            _ => Vec::new(),
        }
    }

    fn take_handle(&self, inner: &mut SlotInner) -> Option<Arc<dyn AdHandle>> {
        let handle = inner.handle.take()?;
        self.unregister(&handle);
        Some(handle)
    }

    // Registry updates happen under the slot lock so a destroy can't be
    // overtaken by a store for the same handle.
    fn register(&self, handle: &Arc<dyn AdHandle>) {
        if let Some(reg) = &self.registration {
            reg.registry.store(reg.key.clone(), handle);
        }
    }

    fn unregister(&self, handle: &Arc<dyn AdHandle>) {
        if let Some(reg) = &self.registration {
            reg.registry.remove_if_same(&reg.key, handle);
        }
    }
}

impl Drop for AdSlot {
    fn drop(&mut self) {
        let inner = self
            .inner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = inner.handle.take() {
            tracing::warn!(
                placement = %self.placement,
                state = ?inner.state,
                "AdSlot dropped without destroy - releasing handle"
            );
            if let Some(reg) = &self.registration {
                reg.registry.remove_if_same(&reg.key, &handle);
            }
            self.released.release(handle);
        }
    }
}
