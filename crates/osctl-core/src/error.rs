//! Error types for control-plane calls

use thiserror::Error;

/// Error returned by any [`ControlPlane`](crate::ControlPlane) operation
#[derive(Error, Debug)]
pub enum ControlPlaneError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Endpoint error: {0}")]
    Endpoint(String),
}

impl ControlPlaneError {
    /// Whether the remote reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::Api { status: 404, .. })
    }
}
