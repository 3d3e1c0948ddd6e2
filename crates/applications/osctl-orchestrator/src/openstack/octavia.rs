//! Octavia (load balancer service) calls

use super::client::{join, OpenStack};
use osctl_core::{IdRef, Result, Target, UnderlyingResource};
use serde::Deserialize;
use tracing::debug;

/// Listener of a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Listener {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub protocol: String,
    pub protocol_port: u16,
}

/// Pool of a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pool {
    pub id: String,
    pub protocol: String,
    #[serde(default)]
    pub listeners: Vec<IdRef>,
}

/// Member of a pool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub id: String,
    pub address: String,
    pub protocol_port: u16,
}

#[derive(Deserialize)]
struct LoadBalancerBody {
    loadbalancer: Target,
}

#[derive(Deserialize)]
struct ListenerBody {
    listener: Listener,
}

impl OpenStack {
    fn lbaas(&self, path: &str) -> String {
        join(&self.endpoints().octavia, &format!("v2/lbaas/{path}"))
    }

    /// All load balancers, optionally of one project
    pub async fn load_balancers(&self, project: Option<&str>) -> Result<Vec<Target>> {
        let query: Vec<(&str, &str)> = project.map(|p| ("project_id", p)).into_iter().collect();
        let lbs: Vec<Target> = self
            .list_all(self.lbaas("loadbalancers"), &query, "loadbalancers")
            .await?;
        debug!(count = lbs.len(), "Listed load balancers");
        Ok(lbs)
    }

    pub async fn load_balancer(&self, id: &str) -> Result<Target> {
        let body: LoadBalancerBody = self.get(&self.lbaas(&format!("loadbalancers/{id}"))).await?;
        Ok(body.loadbalancer)
    }

    /// Ask Octavia to fail the load balancer over (202 Accepted)
    pub async fn failover_load_balancer(&self, id: &str) -> Result<()> {
        self.put_empty(&self.lbaas(&format!("loadbalancers/{id}/failover")))
            .await
    }

    /// Amphorae of a load balancer (admin API)
    pub async fn amphorae(&self, lb_id: &str) -> Result<Vec<UnderlyingResource>> {
        let url = join(&self.endpoints().octavia, "v2/octavia/amphorae");
        self.list_all(url, &[("loadbalancer_id", lb_id)], "amphorae")
            .await
    }

    pub async fn listener(&self, id: &str) -> Result<Listener> {
        let body: ListenerBody = self.get(&self.lbaas(&format!("listeners/{id}"))).await?;
        Ok(body.listener)
    }

    /// Every pool of a load balancer; narrow with [`pools_of_listener`] / [`shared_pools`]
    pub async fn pools(&self, lb_id: &str) -> Result<Vec<Pool>> {
        self.list_all(self.lbaas("pools"), &[("loadbalancer_id", lb_id)], "pools")
            .await
    }

    pub async fn members(&self, pool_id: &str) -> Result<Vec<Member>> {
        self.list_all(self.lbaas(&format!("pools/{pool_id}/members")), &[], "members")
            .await
    }
}

/// Pools attached to the given listener.
///
/// Pools can only be listed per load balancer, so listener pools are
/// filtered client side.
pub fn pools_of_listener<'a>(pools: &'a [Pool], listener_id: &str) -> Vec<&'a Pool> {
    pools
        .iter()
        .filter(|p| p.listeners.iter().any(|l| l.id == listener_id))
        .collect()
}

/// Pools not attached to any listener
pub fn shared_pools(pools: &[Pool]) -> Vec<&Pool> {
    pools.iter().filter(|p| p.listeners.is_empty()).collect()
}
