//! Failover trigger and state polling
//!
//! ```text
//! PUT failover ──> PENDING_UPDATE ──┬──> ACTIVE   (success)
//!                                   ├──> ERROR    (fail immediately)
//!                                   └──> 404      (success only if waiting for DELETED)
//! ```
//!
//! The poll loop sleeps first, then checks the deadline, then asks the
//! control plane for the current state. Time is read through [`Clock`] so the
//! loop can be driven without wall-clock sleeps.

use crate::error::{OrchestratorError, Result};
use async_trait::async_trait;
use osctl_core::{ControlPlane, ProvisioningState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Time source for the poll loop
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed-cadence state poller
#[derive(Clone)]
pub struct Poller {
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl Poller {
    /// Poller on the wall clock
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Arc::new(TokioClock))
    }

    /// Poller on a caller-supplied clock
    pub fn with_clock(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { interval, clock }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the load balancer reaches `desired`, goes to ERROR, or `timeout` passes
    pub async fn wait_for_state<C>(
        &self,
        client: &C,
        target_id: &str,
        desired: &ProvisioningState,
        timeout: Duration,
    ) -> Result<()>
    where
        C: ControlPlane + ?Sized,
    {
        let start = self.clock.now();

        loop {
            self.clock.sleep(self.interval).await;

            if self.clock.now().duration_since(start) >= timeout {
                return Err(OrchestratorError::Timeout {
                    target: target_id.to_string(),
                    desired: desired.to_string(),
                    after: timeout,
                });
            }

            match client.target_state(target_id).await? {
                None if *desired == ProvisioningState::Deleted => return Ok(()),
                None => return Err(OrchestratorError::Disappeared(target_id.to_string())),
                Some(ProvisioningState::Error) => {
                    return Err(OrchestratorError::ErrorState(target_id.to_string()));
                }
                Some(state) if state == *desired => return Ok(()),
                Some(state) => {
                    debug!(loadbalancer = %target_id, status = %state, "Still waiting");
                }
            }
        }
    }

    /// Trigger a failover and wait for the load balancer to be ACTIVE again
    pub async fn failover<C>(&self, client: &C, target_id: &str, timeout: Duration) -> Result<()>
    where
        C: ControlPlane + ?Sized,
    {
        client.trigger_failover(target_id).await?;
        info!(loadbalancer = %target_id, "Failover accepted, waiting for ACTIVE");

        self.wait_for_state(client, target_id, &ProvisioningState::Active, timeout)
            .await
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
