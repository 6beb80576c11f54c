//! Init coordinator - runs a network SDK's initialization at most once per process.
//!
//! Any number of adapter instances may request initialization, concurrently and
//! at any time. The first request issues the SDK call; every request, whether it
//! arrives before, during or after resolution, gets exactly one terminal callback.
//!
//! Locking discipline: the state mutex is never held while calling into the SDK
//! or into listeners. SDKs are allowed to complete synchronously from inside
//! `initialize`, and listeners are allowed to re-enter the coordinator.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;

use crate::error::InitError;
use crate::init_state::{InitOutcome, InitReport, InitState};
use crate::network::NetworkId;

/// Receives the single terminal initialization outcome.
pub trait InitListener: Send + Sync {
    fn on_init_success(&self);
    fn on_init_failed(&self, error: &InitError);
}

/// Network SDK initialization entry point.
///
/// `completion` may be invoked from any thread, synchronously or later, and
/// more than once; only the first invocation counts. An SDK that never calls
/// it leaves the coordinator `InProgress` for the life of the process.
pub trait SdkInitializer: Send + Sync {
    /// Start SDK initialization. Called at most once per coordinator; the
    /// outcome is reported through `completion`, possibly before returning.
    fn initialize(&self, config: &serde_json::Value, completion: InitCompletion);
}

/// Completion handle given to the SDK for the one init call.
#[derive(Clone)]
pub struct InitCompletion {
    coordinator: Arc<InitCoordinator>,
}

impl InitCompletion {
    /// Report successful initialization.
    pub fn succeed(&self) {
        self.complete(InitOutcome::Success);
    }

    /// Report failed initialization with the SDK's message.
    pub fn fail(&self, message: impl Into<String>) {
        self.complete(InitOutcome::Failed(message.into()));
    }

    /// Report `outcome`. Only the first report counts.
    pub fn complete(&self, outcome: InitOutcome) {
        self.coordinator.on_external_init_complete(outcome);
    }
}

enum Phase {
    Idle,
    /// Pending listeners, in registration order.
    InProgress(Vec<Arc<dyn InitListener>>),
    Resolved(InitOutcome),
}

struct CoordinatorInner {
    phase: Phase,
    report: Option<InitReport>,
}

enum Admission {
    Trigger,
    Queued,
    Resolved(InitOutcome),
}

/// Per-network initialization coordinator. Lives for the whole process.
pub struct InitCoordinator {
    network: NetworkId,
    sdk: Arc<dyn SdkInitializer>,
    inner: Mutex<CoordinatorInner>,
}

impl InitCoordinator {
    /// Create an idle coordinator. Nothing is called on `sdk` until the first
    /// `request_init`.
    pub fn new(network: NetworkId, sdk: Arc<dyn SdkInitializer>) -> Arc<Self> {
        Arc::new(Self {
            network,
            sdk,
            inner: Mutex::new(CoordinatorInner {
                phase: Phase::Idle,
                report: None,
            }),
        })
    }

    /// The network this coordinator initializes.
    pub fn network(&self) -> &NetworkId {
        &self.network
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::error!(network = %self.network, "Coordinator mutex poisoned - recovering");
            poisoned.into_inner()
        })
    }

    /// Current initialization state.
    pub fn state(&self) -> InitState {
        match &self.lock().phase {
            Phase::Idle => InitState::None,
            Phase::InProgress(_) => InitState::InProgress,
            Phase::Resolved(outcome) => outcome.state(),
        }
    }

    /// Listeners waiting for the outcome. Zero unless init is in progress.
    pub fn pending_listeners(&self) -> usize {
        match &self.lock().phase {
            Phase::InProgress(pending) => pending.len(),
            _ => 0,
        }
    }

    /// Timing and outcome of the init attempt, once one was issued.
    pub fn report(&self) -> Option<InitReport> {
        self.lock().report.clone()
    }

    /// Register interest in the initialization outcome.
    ///
    /// Never blocks. The caller that moves the coordinator out of `None` is the
    /// only one that invokes the SDK; `config` from later callers is ignored.
    pub fn request_init(
        self: &Arc<Self>,
        config: &serde_json::Value,
        listener: Arc<dyn InitListener>,
    ) {
        let admission = {
            let mut inner = self.lock();
            match &mut inner.phase {
                Phase::Idle => {
                    inner.phase = Phase::InProgress(vec![Arc::clone(&listener)]);
                    inner.report = Some(InitReport::started());
                    Admission::Trigger
                }
                Phase::InProgress(pending) => {
                    pending.push(Arc::clone(&listener));
                    Admission::Queued
                }
                Phase::Resolved(outcome) => Admission::Resolved(outcome.clone()),
            }
        };

        match admission {
            Admission::Trigger => {
                tracing::info!(network = %self.network, "Initializing network SDK");
                let completion = InitCompletion {
                    coordinator: Arc::clone(self),
                };
                self.sdk.initialize(config, completion);
            }
            Admission::Queued => {
                tracing::debug!(network = %self.network, "Init in progress, listener queued");
            }
            Admission::Resolved(outcome) => notify(listener.as_ref(), &outcome),
        }
    }

    /// Resolve initialization with the SDK's outcome.
    ///
    /// The first call wins; later calls are logged and ignored.
    pub fn on_external_init_complete(&self, outcome: InitOutcome) {
        let drained = {
            let mut inner = self.lock();
            match &inner.phase {
                Phase::InProgress(_) => {}
                Phase::Idle => {
                    tracing::warn!(
                        network = %self.network,
                        "Init callback before init was requested, ignoring"
                    );
                    return;
                }
                Phase::Resolved(previous) => {
                    tracing::warn!(
                        network = %self.network,
                        previous = ?previous.state(),
                        ignored = ?outcome.state(),
                        "Duplicate init callback ignored"
                    );
                    return;
                }
            }

            inner.report = inner.report.take().map(|r| r.completed(&outcome));
            match std::mem::replace(&mut inner.phase, Phase::Resolved(outcome.clone())) {
                Phase::InProgress(pending) => pending,
                _ => Vec::new(),
            }
        };

        match &outcome {
            InitOutcome::Success => {
                tracing::info!(
                    network = %self.network,
                    listeners = drained.len(),
                    "Network SDK initialized"
                );
            }
            InitOutcome::Failed(message) => {
                tracing::warn!(
                    network = %self.network,
                    listeners = drained.len(),
                    error = %message,
                    "Network SDK initialization failed"
                );
            }
        }

        for listener in drained {
            notify(listener.as_ref(), &outcome);
        }
    }

    /// Wait for the initialization outcome without blocking a thread.
    ///
    /// Registers a listener like any other caller, so this also triggers init
    /// when nobody has yet.
    pub async fn initialized(
        self: &Arc<Self>,
        config: &serde_json::Value,
    ) -> Result<(), InitError> {
        let (tx, rx) = oneshot::channel();
        self.request_init(config, Arc::new(OneshotListener::new(tx)));
        rx.await.unwrap_or(Err(InitError::Unavailable))
    }
}

fn notify(listener: &dyn InitListener, outcome: &InitOutcome) {
    match outcome {
        InitOutcome::Success => listener.on_init_success(),
        InitOutcome::Failed(message) => {
            listener.on_init_failed(&InitError::Failed(message.clone()))
        }
    }
}

struct OneshotListener {
    tx: Mutex<Option<oneshot::Sender<Result<(), InitError>>>>,
}

impl OneshotListener {
    fn new(tx: oneshot::Sender<Result<(), InitError>>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    fn send(&self, result: Result<(), InitError>) {
        let tx = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(tx) = tx {
            let _ = tx.send(result);
        }
    }
}

impl InitListener for OneshotListener {
    fn on_init_success(&self) {
        self.send(Ok(()));
    }

    fn on_init_failed(&self, error: &InitError) {
        self.send(Err(error.clone()));
    }
}
