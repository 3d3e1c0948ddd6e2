//! Pre-flight image check
//!
//! A load balancer whose amphorae all run the latest amphora image gains
//! nothing from a failover and is skipped. The check is best effort: any
//! lookup that cannot be completed counts as "needs the fix", never as
//! "already converged".

use osctl_core::{ControlPlane, ImageRef, UnderlyingResource};
use tracing::{debug, info, warn};

/// Result of resolving the image of one amphora
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLookup {
    /// The backing server reported this image
    Resolved(String),
    /// The image could not be determined
    Unknown(String),
}

/// What the worker should do with a load balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every amphora already runs the fix image
    Converged,
    /// No amphorae at all; nothing to fail over
    NoUnderlyingResources,
    /// At least one amphora is (or may be) outdated
    NeedsFailover,
}

impl Verdict {
    pub fn is_skip(&self) -> bool {
        !matches!(self, Self::NeedsFailover)
    }
}

/// Decide whether a load balancer can be skipped
pub async fn check<C>(client: &C, target_id: &str, fix: &ImageRef) -> Verdict
where
    C: ControlPlane + ?Sized,
{
    let amphorae = match client.underlying_resources(target_id).await {
        Ok(amphorae) => amphorae,
        Err(e) => {
            warn!(
                loadbalancer = %target_id,
                error = %e,
                "Failed to list amphorae, assuming failover is needed"
            );
            return Verdict::NeedsFailover;
        }
    };

    if amphorae.is_empty() {
        warn!(loadbalancer = %target_id, "No amphorae found, skip");
        return Verdict::NoUnderlyingResources;
    }

    for amphora in &amphorae {
        match resolve_image(client, amphora).await {
            ImageLookup::Resolved(image) if image == fix.as_str() => {
                debug!(loadbalancer = %target_id, amphora = %amphora.id, "Amphora up to date");
            }
            ImageLookup::Resolved(image) => {
                debug!(
                    loadbalancer = %target_id,
                    amphora = %amphora.id,
                    image = %image,
                    "Amphora runs an old image"
                );
                return Verdict::NeedsFailover;
            }
            ImageLookup::Unknown(reason) => {
                warn!(
                    loadbalancer = %target_id,
                    amphora = %amphora.id,
                    reason = %reason,
                    "Cannot determine amphora image, assuming failover is needed"
                );
                return Verdict::NeedsFailover;
            }
        }
    }

    info!(loadbalancer = %target_id, image = %fix, "Load balancer already upgraded, skip");
    Verdict::Converged
}

/// Look up the image an amphora's server was booted from
pub async fn resolve_image<C>(client: &C, amphora: &UnderlyingResource) -> ImageLookup
where
    C: ControlPlane + ?Sized,
{
    let Some(compute_id) = amphora.compute_id.as_deref() else {
        return ImageLookup::Unknown("amphora has no compute ID".to_string());
    };

    match client.backing_compute(compute_id).await {
        Ok(server) => match server.image_id {
            Some(image) if !image.is_empty() => ImageLookup::Resolved(image),
            _ => ImageLookup::Unknown(format!("server {compute_id} has no image")),
        },
        Err(e) => ImageLookup::Unknown(format!("server {compute_id} lookup failed: {e}")),
    }
}
