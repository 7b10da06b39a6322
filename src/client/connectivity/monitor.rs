//! Periodic health probing

use super::{ConnectivityEvent, ConnectivityState};
use crate::client::api::ApiClient;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Drives [`ConnectivityState`] from the remote health endpoint
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    state: ConnectivityState,
    api: ApiClient,
    /// Time between probes
    interval: Duration,
    /// Per-probe timeout; a hung probe counts as a failure
    timeout: Duration,
}

impl ConnectivityMonitor {
    pub fn new(
        state: ConnectivityState,
        api: ApiClient,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            state,
            api,
            interval,
            timeout,
        }
    }

    pub fn state(&self) -> &ConnectivityState {
        &self.state
    }

    /// Run one health probe and fold the result into the state.
    ///
    /// Skipped while the network is reported unreachable. No retries: the
    /// next tick is the retry.
    pub async fn probe_once(&self) -> Option<ConnectivityEvent> {
        if !self.state.network_reachable() {
            debug!("Network unreachable, skipping health probe");
            return None;
        }

        let healthy = match self.api.health(self.timeout).await {
            Ok(report) if report.is_healthy() => true,
            Ok(report) => {
                debug!("Server reachable but degraded: database {:?}", report.database);
                false
            }
            Err(e) => {
                debug!("Health probe failed: {}", e);
                false
            }
        };
        self.state.report_probe(healthy)
    }

    /// Platform reachability changed. A restored network is probed at once
    /// instead of waiting for the next tick; the transition, if any, is what
    /// gets returned.
    pub async fn network_changed(&self, reachable: bool) -> Option<ConnectivityEvent> {
        let event = self.state.report_network(reachable);
        if !reachable {
            return event;
        }
        match self.probe_once().await {
            Some(ConnectivityEvent::HealthConfirmed) | None => event,
            checked => checked,
        }
    }

    /// Probe immediately, then every `interval`, until the task is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.probe_once().await;
            }
        })
    }
}
