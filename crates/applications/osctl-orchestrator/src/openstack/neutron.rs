//! Neutron (network service) calls

use super::client::{join, OpenStack};
use osctl_core::Result;
use serde::Deserialize;

#[derive(Deserialize)]
struct PortBody {
    port: Port,
}

#[derive(Deserialize)]
struct Port {
    #[serde(default)]
    security_groups: Vec<String>,
}

impl OpenStack {
    /// Security group IDs of a port
    pub async fn port_security_groups(&self, port_id: &str) -> Result<Vec<String>> {
        let body: PortBody = self
            .get(&join(&self.endpoints().neutron, &format!("v2.0/ports/{port_id}")))
            .await?;
        Ok(body.port.security_groups)
    }
}
