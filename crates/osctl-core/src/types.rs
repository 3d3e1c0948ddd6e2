//! Core types shared across osctl components

use serde::{Deserialize, Serialize};

/// Provisioning status of a load balancer as reported by the control plane
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProvisioningState {
    Active,
    Error,
    PendingCreate,
    PendingUpdate,
    PendingDelete,
    /// Synthetic state: the resource is gone (404 on lookup)
    Deleted,
    Other(String),
}

impl ProvisioningState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Error => "ERROR",
            Self::PendingCreate => "PENDING_CREATE",
            Self::PendingUpdate => "PENDING_UPDATE",
            Self::PendingDelete => "PENDING_DELETE",
            Self::Deleted => "DELETED",
            Self::Other(s) => s,
        }
    }

    /// Whether the state is one of the PENDING_* transitional states
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::PendingCreate | Self::PendingUpdate | Self::PendingDelete
        )
    }
}

impl From<&str> for ProvisioningState {
    fn from(s: &str) -> Self {
        match s {
            "ACTIVE" => Self::Active,
            "ERROR" => Self::Error,
            "PENDING_CREATE" => Self::PendingCreate,
            "PENDING_UPDATE" => Self::PendingUpdate,
            "PENDING_DELETE" => Self::PendingDelete,
            "DELETED" => Self::Deleted,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ProvisioningState {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ProvisioningState> for String {
    fn from(state: ProvisioningState) -> Self {
        state.as_str().to_string()
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one load balancer taken when the fleet was listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "provisioning_status")]
    pub provisioning_state: ProvisioningState,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub vip_address: Option<String>,
    #[serde(default)]
    pub vip_port_id: Option<String>,
    #[serde(default)]
    pub listeners: Vec<IdRef>,
}

impl Target {
    /// Minimal snapshot, mostly useful for building fleets by hand
    pub fn new(id: impl Into<String>, name: impl Into<String>, state: ProvisioningState) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provisioning_state: state,
            project_id: String::new(),
            updated_at: None,
            vip_address: None,
            vip_port_id: None,
            listeners: Vec::new(),
        }
    }
}

/// `{"id": "..."}` reference embedded in API objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: String,
}

/// Identifier of the image every amphora is expected to run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One amphora: a compute instance implementing a load balancer's data plane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderlyingResource {
    pub id: String,
    /// Nova server backing the amphora; absent while it is being built
    #[serde(default)]
    pub compute_id: Option<String>,
    #[serde(default)]
    pub vrrp_port_id: Option<String>,
}

/// Backing compute server of an amphora
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeInfo {
    pub id: String,
    /// None for servers booted from a volume
    pub image_id: Option<String>,
}
