//! Nova (compute service) calls

use super::client::{join, OpenStack};
use osctl_core::{ComputeInfo, IdRef, Result};
use serde::Deserialize;

/// Nova server group
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerGroup {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct ServerBody {
    server: Server,
}

#[derive(Deserialize)]
struct Server {
    id: String,
    #[serde(default)]
    image: Option<ServerImage>,
}

/// Nova returns `{"id": ...}` for image-booted servers and `""` for volume-booted ones
#[derive(Deserialize)]
#[serde(untagged)]
enum ServerImage {
    Ref(IdRef),
    Empty(#[allow(dead_code)] String),
}

impl From<Server> for ComputeInfo {
    fn from(server: Server) -> Self {
        let image_id = match server.image {
            Some(ServerImage::Ref(image)) => Some(image.id),
            Some(ServerImage::Empty(_)) | None => None,
        };
        ComputeInfo {
            id: server.id,
            image_id,
        }
    }
}

impl OpenStack {
    pub async fn server(&self, id: &str) -> Result<ComputeInfo> {
        let body: ServerBody = self
            .get(&join(&self.endpoints().nova, &format!("servers/{id}")))
            .await?;
        Ok(body.server.into())
    }

    /// Server groups of all projects (admin), every page
    pub async fn server_groups(&self) -> Result<Vec<ServerGroup>> {
        self.list_all(
            join(&self.endpoints().nova, "os-server-groups"),
            &[("all_projects", "True")],
            "server_groups",
        )
        .await
    }
}
