//! In-memory control plane and clock for unit tests

use crate::poller::Clock;
use async_trait::async_trait;
use osctl_core::{
    ComputeInfo, ControlPlane, ControlPlaneError, ImageRef, ProvisioningState, Result, Target,
    UnderlyingResource,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Scripted control plane.
///
/// Unknown load balancers report ACTIVE and have no amphorae; unknown
/// servers fail to resolve.
#[derive(Default)]
pub struct FakeControlPlane {
    fleet: Vec<Target>,
    listing_fails: bool,
    fix_image: Option<String>,
    amphorae: HashMap<String, Vec<UnderlyingResource>>,
    amphora_listing_failures: HashSet<String>,
    servers: HashMap<String, ComputeInfo>,
    states: Mutex<HashMap<String, VecDeque<Option<ProvisioningState>>>>,
    state_lookup_failures: HashSet<String>,
    failover_rejections: HashSet<String>,
    failover_gate: Option<Arc<Semaphore>>,
    failover_calls: Mutex<Vec<String>>,
    polls: Mutex<HashMap<String, usize>>,
    list_calls: AtomicUsize,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fleet(mut self, fleet: Vec<Target>) -> Self {
        self.fleet = fleet;
        self
    }

    pub fn with_fix_image(mut self, image: &str) -> Self {
        self.fix_image = Some(image.to_string());
        self
    }

    pub fn with_amphora(mut self, target: &str, amphora: &str, compute: Option<&str>) -> Self {
        self.amphorae
            .entry(target.to_string())
            .or_default()
            .push(UnderlyingResource {
                id: amphora.to_string(),
                compute_id: compute.map(str::to_string),
                vrrp_port_id: None,
            });
        self
    }

    pub fn with_server(mut self, server: &str, image: Option<&str>) -> Self {
        self.servers.insert(
            server.to_string(),
            ComputeInfo {
                id: server.to_string(),
                image_id: image.map(str::to_string),
            },
        );
        self
    }

    /// States returned by successive polls; the last one repeats
    pub fn with_states<I>(self, target: &str, states: I) -> Self
    where
        I: IntoIterator<Item = Option<ProvisioningState>>,
    {
        self.states
            .lock()
            .unwrap()
            .insert(target.to_string(), states.into_iter().collect());
        self
    }

    /// Fleet listing is rejected as unauthorized
    pub fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn failing_amphora_listing(mut self, target: &str) -> Self {
        self.amphora_listing_failures.insert(target.to_string());
        self
    }

    pub fn failing_state_lookup(mut self, target: &str) -> Self {
        self.state_lookup_failures.insert(target.to_string());
        self
    }

    pub fn rejecting_failover(mut self, target: &str) -> Self {
        self.failover_rejections.insert(target.to_string());
        self
    }

    /// Accepted failovers block until the gate hands out a permit
    pub fn with_failover_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.failover_gate = Some(gate);
        self
    }

    pub fn failover_calls(&self) -> Vec<String> {
        self.failover_calls.lock().unwrap().clone()
    }

    pub fn state_polls(&self, target: &str) -> usize {
        self.polls.lock().unwrap().get(target).copied().unwrap_or(0)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn list_targets(&self, project: Option<&str>) -> Result<Vec<Target>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails {
            return Err(ControlPlaneError::Auth("HTTP 401".to_string()));
        }
        Ok(self
            .fleet
            .iter()
            .filter(|t| project.is_none_or(|p| t.project_id == p))
            .cloned()
            .collect())
    }

    async fn fix_image(&self) -> Result<ImageRef> {
        self.fix_image
            .as_deref()
            .map(ImageRef::new)
            .ok_or_else(|| ControlPlaneError::NotFound("amphora image".to_string()))
    }

    async fn underlying_resources(&self, target_id: &str) -> Result<Vec<UnderlyingResource>> {
        if self.amphora_listing_failures.contains(target_id) {
            return Err(ControlPlaneError::Transport("connection reset".to_string()));
        }
        Ok(self.amphorae.get(target_id).cloned().unwrap_or_default())
    }

    async fn backing_compute(&self, compute_id: &str) -> Result<ComputeInfo> {
        self.servers
            .get(compute_id)
            .cloned()
            .ok_or_else(|| ControlPlaneError::NotFound(format!("server {compute_id}")))
    }

    async fn trigger_failover(&self, target_id: &str) -> Result<()> {
        self.failover_calls
            .lock()
            .unwrap()
            .push(target_id.to_string());

        if self.failover_rejections.contains(target_id) {
            return Err(ControlPlaneError::Api {
                status: 409,
                body: format!("Load Balancer {target_id} is immutable"),
            });
        }

        if let Some(gate) = &self.failover_gate {
            gate.acquire()
                .await
                .map_err(|e| ControlPlaneError::Transport(e.to_string()))?
                .forget();
        }
        Ok(())
    }

    async fn target_state(&self, target_id: &str) -> Result<Option<ProvisioningState>> {
        *self
            .polls
            .lock()
            .unwrap()
            .entry(target_id.to_string())
            .or_default() += 1;

        if self.state_lookup_failures.contains(target_id) {
            return Err(ControlPlaneError::Transport("timed out".to_string()));
        }

        let mut states = self.states.lock().unwrap();
        match states.get_mut(target_id) {
            Some(queue) if queue.len() > 1 => Ok(queue.pop_front().flatten()),
            Some(queue) => Ok(queue.front().cloned().flatten()),
            None => Ok(Some(ProvisioningState::Active)),
        }
    }
}

/// Clock whose `sleep` advances time instantly
pub struct FakeClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.offset.lock().unwrap() += duration;
        tokio::task::yield_now().await;
    }
}
