//! The session store: state ownership, dispatch, and side effects.

use crate::error::SessionError;
use crate::prefs::PreferenceStore;
use crate::reducer::{reduce, CallAction, CallSession};
use dialer_types::CallState;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Tick period of the duration counter.
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Owns a `CallSession` and advances it through dispatched actions.
///
/// The transition itself is the pure [`reduce`] function; the store
/// layers the side effects on top:
///
/// - a once-per-second duration ticker that runs strictly while the
///   session is `Active` (started on entry, aborted on exit, no drift
///   correction), and
/// - a write to the preference cache on every preference change.
///
/// Observers subscribe to state snapshots through a watch channel.
/// Cloning the store clones a handle to the same session.
///
/// Requires a tokio runtime: entering `Active` spawns the ticker task.
#[derive(Clone)]
pub struct CallSessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state_tx: watch::Sender<CallSession>,
    prefs: Option<PreferenceStore>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    /// Serializes the read-reduce-publish step so concurrent dispatches
    /// cannot clobber each other's updates.
    dispatch_lock: Mutex<()>,
}

impl CallSessionStore {
    /// Creates a store with default state and no persistence.
    pub fn new() -> Self {
        Self::build(CallSession::default(), None)
    }

    /// Creates a store backed by a preference cache.
    ///
    /// Stored preferences are loaded once, here, and merged into the
    /// defaults; subsequent preference updates are written back on
    /// every change.
    pub fn with_preferences(prefs: PreferenceStore) -> Self {
        let initial = CallSession {
            user_preferences: prefs.load(),
            ..CallSession::default()
        };
        Self::build(initial, Some(prefs))
    }

    fn build(initial: CallSession, prefs: Option<PreferenceStore>) -> Self {
        let (state_tx, _) = watch::channel(initial);
        Self {
            inner: Arc::new(StoreInner {
                state_tx,
                prefs,
                ticker: Mutex::new(None),
                dispatch_lock: Mutex::new(()),
            }),
        }
    }

    /// Returns a snapshot of the current session state.
    pub fn state(&self) -> CallSession {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribes to state changes. The receiver always starts with the
    /// current state marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<CallSession> {
        self.inner.state_tx.subscribe()
    }

    /// Applies an action to the session.
    pub fn dispatch(&self, action: CallAction) {
        StoreInner::dispatch(&self.inner, &action);
    }
}

impl Default for CallSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreInner {
    fn dispatch(this: &Arc<Self>, action: &CallAction) {
        // Dispatches race from the ticker task, the delayed-reset task,
        // and callers; the lock makes each one an atomic
        // read-reduce-publish (side effects included).
        let _guard = this.dispatch_lock.lock().expect("dispatch lock poisoned");
        let prev = this.state_tx.borrow().clone();
        let next = reduce(&prev, action);

        let was_active = prev.call_state == CallState::Active;
        let now_active = next.call_state == CallState::Active;
        let prefs_changed = next.user_preferences != prev.user_preferences;

        this.state_tx.send_replace(next.clone());

        if now_active && !was_active {
            debug!("call active, starting duration ticker");
            Self::start_ticker(this);
        } else if was_active && !now_active {
            debug!(state = %next.call_state, "call left active state, stopping ticker");
            this.stop_ticker();
        }

        if prefs_changed {
            if let Some(prefs) = &this.prefs {
                if let Err(e) = persist(prefs, &next) {
                    // Persistence failures degrade to in-memory-only
                    // preferences; the session keeps going.
                    warn!(error = %e, "failed to persist preferences");
                }
            }
        }
    }

    fn start_ticker(this: &Arc<Self>) {
        let weak = Arc::downgrade(this);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_PERIOD);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(store) = weak.upgrade() else { break };
                let secs = store.state_tx.borrow().call_duration_secs + 1;
                Self::dispatch(&store, &CallAction::UpdateDuration(secs));
            }
        });

        let mut slot = this.ticker.lock().expect("ticker lock poisoned");
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn stop_ticker(&self) {
        if let Some(handle) = self
            .ticker
            .lock()
            .expect("ticker lock poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

fn persist(prefs: &PreferenceStore, state: &CallSession) -> Result<(), SessionError> {
    prefs.save(&state.user_preferences)
}
