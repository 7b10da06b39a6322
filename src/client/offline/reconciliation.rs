//! # Sync Reconciliation
//!
//! Pushes the ledger's accumulated deltas to the server once per online
//! transition and settles the ledger on acknowledgment.
//!
//! ## Ordering
//!
//! 1. Nothing pending: no-op, no request.
//! 2. Offline or no session: refused, ledger untouched.
//! 3. Push the delta. Any failure leaves the ledger untouched for the next
//!    online transition; there is no retry loop here. A rejected token is
//!    forgotten, and an unreachable server marks the client offline.
//! 4. Settle the ledger by the pushed delta, then refresh the cached account
//!    so displays show server-confirmed totals.

use super::ledger::{LedgerError, OfflineLedger};
use crate::client::api::{ApiClient, ApiError};
use crate::client::connectivity::ConnectivityState;
use crate::client::local_store::{SessionStore, StoreError};
use crate::shared::api_types::{ProgressDelta, SyncProgressResponse, UserAccount};
use crate::shared::progression::level_for_xp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cannot sync while offline")]
    Offline,

    #[error("no session token; offline progress stays local")]
    NotAuthenticated,

    #[error("sync request failed: {0}")]
    Api(#[from] ApiError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("local store error: {0}")]
    Store(#[from] StoreError),
}

/// What a successful sync did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Delta the server accepted
    pub pushed: ProgressDelta,
    /// Server totals after applying it
    pub totals: SyncProgressResponse,
    /// Fresh account, when the follow-up refresh succeeded
    pub account: Option<UserAccount>,
    pub did_level_up: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    NothingPending,
    /// Another sync was already running
    InFlight,
    Synced(SyncReport),
}

struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Reconciles the offline ledger with the remote account
#[derive(Debug, Clone)]
pub struct SyncReconciler {
    api: ApiClient,
    ledger: OfflineLedger,
    sessions: SessionStore,
    connectivity: ConnectivityState,
    in_flight: Arc<AtomicBool>,
}

impl SyncReconciler {
    pub fn new(
        api: ApiClient,
        ledger: OfflineLedger,
        sessions: SessionStore,
        connectivity: ConnectivityState,
    ) -> Self {
        Self {
            api,
            ledger,
            sessions,
            connectivity,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sync using the token persisted in the local store
    pub async fn sync_with_stored_session(&self) -> Result<SyncOutcome, SyncError> {
        let token = self.sessions.token().await?;
        self.try_sync(token.as_deref()).await
    }

    pub async fn try_sync(&self, token: Option<&str>) -> Result<SyncOutcome, SyncError> {
        let pending = self.ledger.read().await?;
        if !pending.pending_sync {
            debug!("No offline progress to sync");
            return Ok(SyncOutcome::NothingPending);
        }
        if self.connectivity.is_offline() {
            return Err(SyncError::Offline);
        }
        let token = token.ok_or(SyncError::NotAuthenticated)?;

        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Ok(SyncOutcome::InFlight);
        }
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        let previous_level = match self.sessions.account().await {
            Ok(account) => account.map(|account| account.level),
            Err(e) => {
                warn!("Cached account unreadable, syncing anyway: {}", e);
                None
            }
        };
        let delta = pending.delta();
        info!(
            "Syncing offline progress: {} answered, {} correct, {} xp",
            delta.questions_answered, delta.correct_answers, delta.xp
        );

        let totals = match self.api.sync_offline_progress(token, &delta).await {
            Ok(totals) => totals,
            Err(e) => {
                warn!("Offline progress sync failed, keeping ledger: {}", e);
                if matches!(e, ApiError::Unauthorized(_)) {
                    self.sessions.clear().await?;
                }
                self.connectivity.report_failure(&e);
                return Err(e.into());
            }
        };

        self.ledger.settle(&delta).await?;
        if let Err(e) = self
            .sessions
            .update_account_progress(totals.xp, totals.level)
            .await
        {
            warn!("Synced, but updating the cached account failed: {}", e);
        }

        let account = match self.api.current_user(token).await {
            Ok(account) => {
                self.sessions.set_account(&account).await?;
                Some(account)
            }
            Err(e) => {
                warn!("Synced, but refreshing the account failed: {}", e);
                None
            }
        };

        let confirmed_level = account
            .as_ref()
            .map_or(totals.level, |account| account.level)
            .max(level_for_xp(totals.xp));
        let did_level_up =
            totals.did_level_up || previous_level.is_some_and(|level| confirmed_level > level);

        info!(
            "Offline progress synced: {} xp total, level {}",
            totals.xp, totals.level
        );
        Ok(SyncOutcome::Synced(SyncReport {
            pushed: delta,
            totals,
            account,
            did_level_up,
        }))
    }
}
