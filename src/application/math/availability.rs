//! Readiness tracking for the math backend.
//!
//! A [`MathAvailability`] probes its backend once when started. If the backend
//! is not there yet, a polling task re-probes at a fixed interval until it
//! appears or an absolute timeout elapses. The state only ever moves forward:
//! `Pending` becomes `Ready` or `Unavailable`, exactly once.

use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;
use tokio::{
    sync::watch,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use super::backend::{KatexBackend, MathBackend};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendState {
    Pending,
    Ready,
    /// The backend never appeared before the timeout.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_AVAILABILITY_TIMEOUT,
        }
    }
}

type ReadyCallback = Box<dyn FnOnce() + Send + Sync>;

struct Inner {
    state: watch::Sender<BackendState>,
    subscribers: DashMap<u64, ReadyCallback>,
    next_id: AtomicU64,
}

impl Inner {
    fn new(initial: BackendState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    fn current(&self) -> BackendState {
        *self.state.borrow()
    }

    fn mark_ready(&self) {
        if !self.settle(BackendState::Ready) {
            return;
        }

        let ids: Vec<u64> = self.subscribers.iter().map(|entry| *entry.key()).collect();
        info!(
            target = "application::math::availability",
            subscribers = ids.len(),
            "Math backend ready"
        );
        for id in ids {
            if let Some((_, callback)) = self.subscribers.remove(&id) {
                callback();
            }
        }
    }

    fn mark_unavailable(&self, waited: Duration) {
        if !self.settle(BackendState::Unavailable) {
            return;
        }

        warn!(
            target = "application::math::availability",
            waited_ms = waited.as_millis() as u64,
            dropped_subscribers = self.subscribers.len(),
            "Math backend did not load; formulas will print as source"
        );
        self.subscribers.clear();
    }

    /// Moves out of `Pending`; returns whether this call performed the move.
    fn settle(&self, next: BackendState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == BackendState::Pending {
                *state = next;
                true
            } else {
                false
            }
        })
    }
}

/// Shared handle to the readiness state of one math backend.
#[derive(Clone)]
pub struct MathAvailability {
    inner: Arc<Inner>,
}

impl MathAvailability {
    /// Probe `backend` and, if it is absent, start polling for it.
    ///
    /// Polling runs on the current Tokio runtime. Without a runtime the
    /// backend gets exactly one probe.
    pub fn start(backend: Arc<dyn MathBackend>, config: AvailabilityConfig) -> Self {
        if backend.is_present() {
            debug!(
                target = "application::math::availability",
                backend = backend.name(),
                "Math backend present at startup"
            );
            return Self::ready();
        }

        let monitor = Self::pending();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&monitor.inner);
                handle.spawn(poll_until_present(inner, backend, config));
            }
            Err(_) => {
                warn!(
                    target = "application::math::availability",
                    backend = backend.name(),
                    "No async runtime to poll on; treating math backend as unavailable"
                );
                monitor.inner.mark_unavailable(Duration::ZERO);
            }
        }
        monitor
    }

    pub fn ready() -> Self {
        Self {
            inner: Arc::new(Inner::new(BackendState::Ready)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            inner: Arc::new(Inner::new(BackendState::Unavailable)),
        }
    }

    fn pending() -> Self {
        Self {
            inner: Arc::new(Inner::new(BackendState::Pending)),
        }
    }

    pub fn state(&self) -> BackendState {
        self.inner.current()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == BackendState::Ready
    }

    /// Register `callback` to run once when the backend becomes ready.
    ///
    /// Runs immediately when already ready and never runs once the backend
    /// has been declared unavailable. Dropping the returned [`Subscription`]
    /// unregisters the callback.
    pub fn on_ready<F>(&self, callback: F) -> Subscription
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        match self.state() {
            BackendState::Ready => {
                callback();
                return Subscription::inert();
            }
            BackendState::Unavailable => return Subscription::inert(),
            BackendState::Pending => {}
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.insert(id, Box::new(callback));

        // The poller may have settled between the state check and the insert.
        match self.state() {
            BackendState::Ready => {
                if let Some((_, callback)) = self.inner.subscribers.remove(&id) {
                    callback();
                }
                Subscription::inert()
            }
            BackendState::Unavailable => {
                self.inner.subscribers.remove(&id);
                Subscription::inert()
            }
            BackendState::Pending => Subscription {
                id: Some(id),
                inner: Arc::downgrade(&self.inner),
            },
        }
    }

    /// Wait until the backend is either ready or declared unavailable.
    pub async fn settled(&self) -> BackendState {
        let mut receiver = self.inner.state.subscribe();
        match receiver
            .wait_for(|state| *state != BackendState::Pending)
            .await
        {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

async fn poll_until_present(
    inner: Arc<Inner>,
    backend: Arc<dyn MathBackend>,
    config: AvailabilityConfig,
) {
    let started_at = Instant::now();
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; `start` has already probed once.
    ticker.tick().await;

    let appeared = tokio::time::timeout(config.timeout, async {
        loop {
            ticker.tick().await;
            if backend.is_present() {
                break;
            }
        }
    })
    .await;

    match appeared {
        Ok(()) => {
            debug!(
                target = "application::math::availability",
                backend = backend.name(),
                waited_ms = started_at.elapsed().as_millis() as u64,
                "Math backend appeared"
            );
            inner.mark_ready();
        }
        Err(_) => inner.mark_unavailable(started_at.elapsed()),
    }
}

/// Registration handle returned by [`MathAvailability::on_ready`].
#[must_use = "dropping a subscription unregisters its callback"]
pub struct Subscription {
    id: Option<u64>,
    inner: Weak<Inner>,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            id: None,
            inner: Weak::new(),
        }
    }

    /// Whether the callback is still waiting to run.
    pub fn is_active(&self) -> bool {
        match (self.id, self.inner.upgrade()) {
            (Some(id), Some(inner)) => inner.subscribers.contains_key(&id),
            _ => false,
        }
    }

    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let (Some(id), Some(inner)) = (self.id.take(), self.inner.upgrade()) {
            inner.subscribers.remove(&id);
        }
    }
}

#[derive(Debug, Error)]
pub enum AvailabilityConfigError {
    #[error("math availability already configured")]
    AlreadyConfigured,
}

static MATH_AVAILABILITY: OnceCell<MathAvailability> = OnceCell::new();

/// Install the process-wide monitor. Only the first call succeeds.
pub fn configure_math_availability(
    availability: MathAvailability,
) -> Result<(), AvailabilityConfigError> {
    MATH_AVAILABILITY
        .set(availability)
        .map_err(|_| AvailabilityConfigError::AlreadyConfigured)
}

/// Process-wide monitor, started against KaTeX on first use when none was
/// configured.
pub fn math_availability() -> MathAvailability {
    MATH_AVAILABILITY
        .get_or_init(|| {
            MathAvailability::start(Arc::new(KatexBackend::new()), AvailabilityConfig::default())
        })
        .clone()
}
