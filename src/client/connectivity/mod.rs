//! # Connectivity
//!
//! Shared, observable connectivity state. The client is offline when either
//! the platform reports the network as unreachable or the last health probe
//! failed (timeout, error status, or a degraded database).
//!
//! State changes are edge-triggered: reporting the same signal twice never
//! publishes a second `BecameOnline` or `BecameOffline`, so subscribers can
//! show a notice per event without de-duplicating. A healthy check that
//! leaves the client online publishes [`ConnectivityEvent::HealthConfirmed`]
//! instead, which drives periodic work such as syncing a ledger left over
//! from an earlier run.
//!
//! A request that fails for connectivity reasons is folded in with
//! [`ConnectivityState::report_failure`] and counts as a failed health check
//! until the next healthy one.
//!
//! ## Usage
//!
//! ```rust
//! use trivia_offline::client::connectivity::{ConnectivityEvent, ConnectivityState};
//!
//! let state = ConnectivityState::new();
//! let mut events = state.subscribe();
//!
//! assert_eq!(state.report_probe(false), Some(ConnectivityEvent::BecameOffline));
//! assert_eq!(state.report_probe(false), None);
//! assert!(state.is_offline());
//! assert_eq!(events.try_recv().ok(), Some(ConnectivityEvent::BecameOffline));
//! ```

pub mod monitor;

pub use monitor::ConnectivityMonitor;

use crate::client::api::ApiError;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::info;

const EVENT_CAPACITY: usize = 16;

/// Published on every offline/online transition, and on each healthy check
/// while already online
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    BecameOnline,
    BecameOffline,
    HealthConfirmed,
}

#[derive(Debug, Default)]
struct Signals {
    network_unreachable: bool,
    probe_failed: bool,
}

impl Signals {
    fn offline(&self) -> bool {
        self.network_unreachable || self.probe_failed
    }
}

/// Process-wide connectivity flag, passed explicitly to the components that
/// need it. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct ConnectivityState {
    signals: Arc<Mutex<Signals>>,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityState {
    /// Starts online
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            signals: Arc::new(Mutex::new(Signals::default())),
            events,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .offline()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    /// Whether the network itself is reported reachable
    pub fn network_reachable(&self) -> bool {
        !self
            .signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .network_unreachable
    }

    /// Platform reachability signal
    pub fn report_network(&self, reachable: bool) -> Option<ConnectivityEvent> {
        self.update(false, |signals| signals.network_unreachable = !reachable)
    }

    /// Outcome of a health probe
    pub fn report_probe(&self, healthy: bool) -> Option<ConnectivityEvent> {
        self.update(healthy, |signals| signals.probe_failed = !healthy)
    }

    /// A remote call failed. Connectivity-class failures mark the client
    /// offline until the next healthy health check; others are ignored.
    pub fn report_failure(&self, error: &ApiError) -> Option<ConnectivityEvent> {
        if !error.is_connectivity() {
            return None;
        }
        self.report_probe(false)
    }

    fn update(
        &self,
        confirms_health: bool,
        apply: impl FnOnce(&mut Signals),
    ) -> Option<ConnectivityEvent> {
        let event = {
            let mut signals = self.signals.lock().unwrap_or_else(PoisonError::into_inner);
            let was_offline = signals.offline();
            apply(&mut signals);
            match (was_offline, signals.offline()) {
                (false, true) => Some(ConnectivityEvent::BecameOffline),
                (true, false) => Some(ConnectivityEvent::BecameOnline),
                (false, false) if confirms_health => Some(ConnectivityEvent::HealthConfirmed),
                _ => None,
            }
        };

        if let Some(event) = event {
            match event {
                ConnectivityEvent::BecameOffline => info!("Connection lost, switching to offline mode"),
                ConnectivityEvent::BecameOnline => info!("Connection restored"),
                ConnectivityEvent::HealthConfirmed => {}
            }
            // No receivers is fine
            let _ = self.events.send(event);
        }
        event
    }
}
