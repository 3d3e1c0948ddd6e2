//! Core traits for osctl
//!
//! The ControlPlane trait is the only way the failover orchestrator talks to
//! the remote load balancer service. The orchestrator works through this
//! interface ONLY - never through the concrete REST client.

use async_trait::async_trait;

use crate::error::ControlPlaneError;
use crate::types::*;

/// Result type for control-plane operations
pub type Result<T> = std::result::Result<T, ControlPlaneError>;

/// Remote load balancer control plane.
///
/// Implementations must be safe to call from several workers at once; every
/// call is an independent request keyed by resource ID.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Fleet listing (all pages), optionally restricted to one owner project
    async fn list_targets(&self, project: Option<&str>) -> Result<Vec<Target>>;

    /// Image the amphorae should be running after failover
    async fn fix_image(&self) -> Result<ImageRef>;

    /// Amphorae implementing a load balancer
    async fn underlying_resources(&self, target_id: &str) -> Result<Vec<UnderlyingResource>>;

    /// Compute server backing an amphora
    async fn backing_compute(&self, compute_id: &str) -> Result<ComputeInfo>;

    /// Ask the control plane to fail the load balancer over
    async fn trigger_failover(&self, target_id: &str) -> Result<()>;

    /// Current provisioning state; `Ok(None)` when the load balancer is gone
    async fn target_state(&self, target_id: &str) -> Result<Option<ProvisioningState>>;
}
