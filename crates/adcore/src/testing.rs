//! Recording fakes shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::coordinator::{InitCompletion, InitListener, SdkInitializer};
use crate::error::{InitError, LoadError, ShowError};
use crate::init_state::InitOutcome;
use crate::slot::{AdHandle, AdListener, AdNetwork, LoadRequest, Reward, SlotCallback};

/// Counts init callbacks.
#[derive(Default)]
pub struct RecordingListener {
    successes: AtomicUsize,
    failures: AtomicUsize,
    last_error: Mutex<Option<InitError>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn callbacks(&self) -> usize {
        self.successes() + self.failures()
    }

    pub fn last_error(&self) -> Option<InitError> {
        self.last_error.lock().unwrap().clone()
    }
}

impl InitListener for RecordingListener {
    fn on_init_success(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_init_failed(&self, error: &InitError) {
        *self.last_error.lock().unwrap() = Some(error.clone());
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

/// SDK that records init calls and either completes immediately or holds
/// the completion for the test to fire.
#[derive(Default)]
pub struct FakeSdk {
    calls: AtomicUsize,
    immediate: Option<InitOutcome>,
    completions: Mutex<Vec<InitCompletion>>,
}

impl FakeSdk {
    pub fn deferred() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn immediate(outcome: InitOutcome) -> Arc<Self> {
        Arc::new(Self {
            immediate: Some(outcome),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn complete(&self, outcome: InitOutcome) {
        let completion = self.completions.lock().unwrap().first().cloned();
        completion
            .expect("init was never issued")
            .complete(outcome);
    }
}

impl SdkInitializer for FakeSdk {
    fn initialize(&self, _config: &serde_json::Value, completion: InitCompletion) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.immediate {
            Some(outcome) => completion.complete(outcome.clone()),
            None => self.completions.lock().unwrap().push(completion),
        }
    }
}

/// Ad object that records show/destroy calls.
#[derive(Default)]
pub struct FakeHandle {
    shows: AtomicUsize,
    destroys: AtomicUsize,
    expired: AtomicBool,
    show_callbacks: Mutex<Vec<SlotCallback>>,
}

impl FakeHandle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn expire(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    /// Callback handed over by the most recent show.
    pub fn show_callback(&self) -> SlotCallback {
        self.show_callbacks
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("ad was never shown")
    }
}

impl AdHandle for FakeHandle {
    fn show(&self, callback: SlotCallback) {
        self.shows.fetch_add(1, Ordering::SeqCst);
        self.show_callbacks.lock().unwrap().push(callback);
    }

    fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    fn destroy(&self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

/// Network that records load requests, optionally answering synchronously.
#[derive(Default)]
pub struct FakeNetwork {
    loads: Mutex<Vec<(LoadRequest, SlotCallback)>>,
    immediate: Option<Arc<FakeHandle>>,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Network whose loads succeed inside `load` with `handle`.
    pub fn immediate(handle: Arc<FakeHandle>) -> Arc<Self> {
        Arc::new(Self {
            immediate: Some(handle),
            ..Self::default()
        })
    }

    pub fn loads(&self) -> usize {
        self.loads.lock().unwrap().len()
    }

    /// Callback of the `n`th load (zero based).
    pub fn callback(&self, n: usize) -> SlotCallback {
        self.loads.lock().unwrap()[n].1.clone()
    }

    pub fn last_callback(&self) -> SlotCallback {
        self.loads
            .lock()
            .unwrap()
            .last()
            .map(|(_, cb)| cb.clone())
            .expect("no load issued")
    }

    pub fn last_request(&self) -> LoadRequest {
        self.loads
            .lock()
            .unwrap()
            .last()
            .map(|(req, _)| req.clone())
            .expect("no load issued")
    }
}

impl AdNetwork for FakeNetwork {
    fn load(&self, request: &LoadRequest, callback: SlotCallback) {
        self.loads
            .lock()
            .unwrap()
            .push((request.clone(), callback.clone()));
        if let Some(handle) = &self.immediate {
            callback.loaded(handle.clone());
        }
    }

    fn sdk_version(&self) -> Option<String> {
        Some("9.2.0".to_string())
    }
}

/// Records every ad callback as a short string, in order.
#[derive(Default)]
pub struct RecordingAdListener {
    events: Mutex<Vec<String>>,
}

impl RecordingAdListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl AdListener for RecordingAdListener {
    fn on_ad_ready(&self) {
        self.push("ready".into());
    }

    fn on_ad_load_failed(&self, error: &LoadError) {
        self.push(format!("load_failed:{error:?}"));
    }

    fn on_ad_show_failed(&self, error: &ShowError) {
        self.push(format!("show_failed:{error:?}"));
    }

    fn on_ad_opened(&self) {
        self.push("opened".into());
    }

    fn on_ad_clicked(&self) {
        self.push("clicked".into());
    }

    fn on_ad_closed(&self) {
        self.push("closed".into());
    }

    fn on_ad_rewarded(&self, reward: &Reward) {
        self.push(format!("rewarded:{}:{}", reward.name, reward.amount));
    }
}
