//! Keystone (identity service) calls

use super::client::{join, OpenStack};
use osctl_core::Result;
use serde::Deserialize;

/// Keystone project
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

impl OpenStack {
    /// All projects (admin)
    pub async fn projects(&self) -> Result<Vec<Project>> {
        self.list_all(join(&self.endpoints().identity, "projects"), &[], "projects")
            .await
    }
}
