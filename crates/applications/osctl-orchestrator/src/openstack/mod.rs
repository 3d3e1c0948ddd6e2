//! OpenStack REST backend
//!
//! Thin clients for the five services osctl touches (Keystone, Octavia,
//! Nova, Glance, Neutron) sharing one authenticated session, plus the
//! [`ControlPlane`] implementation the failover orchestrator runs against.

mod client;
pub mod glance;
pub mod keystone;
pub mod neutron;
pub mod nova;
pub mod octavia;

pub use client::{Endpoints, OpenStack};

use async_trait::async_trait;
use osctl_core::{
    ComputeInfo, ControlPlane, ImageRef, ProvisioningState, Result, Target, UnderlyingResource,
};

#[async_trait]
impl ControlPlane for OpenStack {
    async fn list_targets(&self, project: Option<&str>) -> Result<Vec<Target>> {
        self.load_balancers(project).await
    }

    async fn fix_image(&self) -> Result<ImageRef> {
        self.latest_amphora_image().await
    }

    async fn underlying_resources(&self, target_id: &str) -> Result<Vec<UnderlyingResource>> {
        self.amphorae(target_id).await
    }

    async fn backing_compute(&self, compute_id: &str) -> Result<ComputeInfo> {
        self.server(compute_id).await
    }

    async fn trigger_failover(&self, target_id: &str) -> Result<()> {
        self.failover_load_balancer(target_id).await
    }

    async fn target_state(&self, target_id: &str) -> Result<Option<ProvisioningState>> {
        match self.load_balancer(target_id).await {
            Ok(lb) => Ok(Some(lb.provisioning_state)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
