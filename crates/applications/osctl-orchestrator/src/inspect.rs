//! Read-only inspection commands
//!
//! `get loadbalancers`, `get loadbalancer <id>` and `get projects`. Each
//! command gathers everything first and returns the report as lines, so the
//! output is not interleaved with log records of a half-finished walk.

use crate::openstack::keystone::Project;
use crate::openstack::octavia::{self, Listener, Member, Pool};
use crate::openstack::OpenStack;
use osctl_core::{Target, UnderlyingResource};
use tracing::debug;

/// Prefix of the Nova server group Octavia creates per load balancer
pub const SERVER_GROUP_PREFIX: &str = "octavia-lb-";

/// Load balancers with their listeners, pools and members
pub async fn load_balancers(client: &OpenStack, project: Option<&str>) -> anyhow::Result<Vec<String>> {
    let mut lines = Vec::new();

    for lb in client.load_balancers(project).await? {
        lines.push(load_balancer_line(&lb));
        let pools = client.pools(&lb.id).await?;

        for listener_ref in &lb.listeners {
            let listener = client.listener(&listener_ref.id).await?;
            lines.push(format!("\t{}", listener_line(&listener)));

            for pool in octavia::pools_of_listener(&pools, &listener.id) {
                lines.push(format!("\t\t{}", pool_line(pool)));
                for member in client.members(&pool.id).await? {
                    lines.push(format!("\t\t\t{}", member_line(&member)));
                }
            }
        }

        for pool in octavia::shared_pools(&pools) {
            lines.push(format!("\t{}", pool_line(pool)));
            for member in client.members(&pool.id).await? {
                lines.push(format!("\t\t{}", member_line(&member)));
            }
        }
    }

    Ok(lines)
}

/// Underlying resources of one load balancer (admin)
pub async fn load_balancer(client: &OpenStack, id: &str) -> anyhow::Result<Vec<String>> {
    let lb = client.load_balancer(id).await?;
    let mut lines = vec![format!(
        "vip port: {}, IP: {}",
        lb.vip_port_id.as_deref().unwrap_or_default(),
        lb.vip_address.as_deref().unwrap_or_default()
    )];

    if let Some(port) = lb.vip_port_id.as_deref() {
        let groups = client.port_security_groups(port).await?;
        lines.push(format!("\tsecurity groups: {}", security_groups(&groups)));
    }

    let expected = server_group_name(&lb);
    let groups = client.server_groups().await?;
    match groups.iter().find(|g| g.name == expected) {
        Some(group) => lines.push(format!("server group: {}", group.id)),
        None => debug!(name = %expected, "No server group found"),
    }

    lines.push("amphorae:".to_string());
    for amphora in client.amphorae(id).await? {
        lines.extend(amphora_lines(&amphora));
        if let Some(port) = amphora.vrrp_port_id.as_deref() {
            let groups = client.port_security_groups(port).await?;
            lines.push(format!("\t\t\tsecurity groups: {}", security_groups(&groups)));
        }
    }

    Ok(lines)
}

pub async fn projects(client: &OpenStack) -> anyhow::Result<Vec<String>> {
    Ok(client.projects().await?.iter().map(project_line).collect())
}

fn load_balancer_line(lb: &Target) -> String {
    let mut parts = vec![
        format!("- LoadBalancer: {}", lb.id),
        format!("status: {}", lb.provisioning_state),
        format!("vip: {}", lb.vip_address.as_deref().unwrap_or_default()),
    ];
    if !lb.name.is_empty() {
        parts.push(format!("name: {}", lb.name));
    }
    parts.join(", ")
}

fn listener_line(listener: &Listener) -> String {
    let mut line = format!(
        "- Listener: {}, protocol: {}, port: {}",
        listener.id, listener.protocol, listener.protocol_port
    );
    if !listener.name.is_empty() {
        line.push_str(&format!(", name: {}", listener.name));
    }
    line
}

fn pool_line(pool: &Pool) -> String {
    format!("- Pool: {}, protocol: {}", pool.id, pool.protocol)
}

fn member_line(member: &Member) -> String {
    format!(
        "- Member: {}, address: {}, port: {}",
        member.id, member.address, member.protocol_port
    )
}

fn amphora_lines(amphora: &UnderlyingResource) -> [String; 2] {
    [
        format!("\t{}", amphora.compute_id.as_deref().unwrap_or_default()),
        format!(
            "\t\tvrrp port: {}",
            amphora.vrrp_port_id.as_deref().unwrap_or_default()
        ),
    ]
}

fn project_line(project: &Project) -> String {
    format!("ID: {}, Name: {}", project.id, project.name)
}

fn server_group_name(lb: &Target) -> String {
    format!("{SERVER_GROUP_PREFIX}{}", lb.name)
}

/// `[sg-1 sg-2]`
fn security_groups(groups: &[String]) -> String {
    format!("[{}]", groups.join(" "))
}
