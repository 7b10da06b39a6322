//! # Offline Support
//!
//! Keeps play going without the server and catches the account up once the
//! connection returns.
//!
//! ## Key Components
//!
//! - `ledger.rs`: persisted accumulator of locally graded progress
//! - `reconciliation.rs`: pushes the ledger to the server on reconnect
//! - [`OfflineCoordinator`]: reacts to connectivity events (sync first, then
//!   refresh the question snapshot). Every healthy check counts, not just
//!   the offline-to-online edge, so a ledger left pending by an earlier run
//!   is pushed as soon as the server answers.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # use trivia_offline::client::offline::OfflineCoordinator;
//! # use trivia_offline::client::connectivity::ConnectivityState;
//! # fn demo(coordinator: OfflineCoordinator, connectivity: ConnectivityState) {
//! let mut reports = coordinator.subscribe();
//! let handle = coordinator.spawn(connectivity.subscribe());
//! # }
//! ```

pub mod ledger;
pub mod reconciliation;

pub use ledger::{LedgerError, LedgerSnapshot, OfflineLedger};
pub use reconciliation::{SyncError, SyncOutcome, SyncReconciler, SyncReport};

use crate::client::api::ApiClient;
use crate::client::connectivity::ConnectivityEvent;
use crate::client::local_store::SessionStore;
use crate::client::questions::QuestionCache;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Coordinates what happens when the server is known to be reachable
#[derive(Debug, Clone)]
pub struct OfflineCoordinator {
    reconciler: SyncReconciler,
    cache: Arc<QuestionCache>,
    sessions: SessionStore,
    api: ApiClient,
    /// Questions per tier fetched on refresh
    snapshot_size: usize,
    /// Minimum time between two snapshot refreshes
    refresh_interval: Duration,
    last_refresh: Arc<Mutex<Option<Instant>>>,
    reports: broadcast::Sender<SyncReport>,
}

impl OfflineCoordinator {
    pub fn new(
        reconciler: SyncReconciler,
        cache: Arc<QuestionCache>,
        sessions: SessionStore,
        api: ApiClient,
        snapshot_size: usize,
        refresh_interval: Duration,
    ) -> Self {
        let (reports, _) = broadcast::channel(8);
        Self {
            reconciler,
            cache,
            sessions,
            api,
            snapshot_size,
            refresh_interval,
            last_refresh: Arc::new(Mutex::new(None)),
            reports,
        }
    }

    /// Successful syncs, for user-facing notices
    pub fn subscribe(&self) -> broadcast::Receiver<SyncReport> {
        self.reports.subscribe()
    }

    pub async fn handle_event(&self, event: ConnectivityEvent) -> Option<SyncReport> {
        match event {
            ConnectivityEvent::BecameOffline => {
                debug!("Offline: answers will be graded locally");
                None
            }
            ConnectivityEvent::BecameOnline | ConnectivityEvent::HealthConfirmed => {
                self.on_online().await
            }
        }
    }

    async fn on_online(&self) -> Option<SyncReport> {
        let report = match self.reconciler.sync_with_stored_session().await {
            Ok(SyncOutcome::Synced(report)) => {
                let _ = self.reports.send(report.clone());
                Some(report)
            }
            Ok(_) => None,
            Err(SyncError::NotAuthenticated) => {
                debug!("Not logged in, offline progress stays local");
                None
            }
            Err(e) => {
                warn!("Offline progress not synced: {}", e);
                None
            }
        };

        self.refresh_snapshot_if_due().await;
        report
    }

    /// Refresh the question snapshot unless one happened recently
    pub async fn refresh_snapshot_if_due(&self) {
        let token = match self.sessions.token().await {
            Ok(Some(token)) => token,
            Ok(None) => return,
            Err(e) => {
                warn!("Could not read session token: {}", e);
                return;
            }
        };

        let mut last_refresh = self.last_refresh.lock().await;
        if last_refresh.is_some_and(|at| at.elapsed() < self.refresh_interval) {
            return;
        }

        match self
            .cache
            .refresh_snapshot(&self.api, &token, self.snapshot_size)
            .await
        {
            Ok(summary) => {
                *last_refresh = Some(Instant::now());
                if summary.is_empty() {
                    debug!("Snapshot refresh returned nothing new");
                }
            }
            Err(e) => warn!("Question snapshot refresh failed: {}", e),
        }
    }

    /// React to connectivity events until the sender goes away
    pub fn spawn(self, mut events: broadcast::Receiver<ConnectivityEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        self.handle_event(event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Skipped {} connectivity event(s)", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            info!("Offline coordinator stopped");
        })
    }
}
