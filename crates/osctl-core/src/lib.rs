//! osctl Core - Shared types and traits
//!
//! This crate defines the core abstractions used across:
//! - the failover orchestrator (bulk load balancer failover)
//! - the read-only inspection commands
//! - the OpenStack REST backend
//!
//! Key types:
//! - ControlPlane trait (interface for the remote load balancer service)
//! - Target snapshots, provisioning states, amphora/compute descriptions
//! - Error types

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
