//! # osctl orchestrator
//!
//! Bulk, concurrent, fail-fast failover of OpenStack Octavia load balancers.
//!
//! ## Architecture
//!
//! ```text
//! list fleet ──► select ──► producer ──► bounded queue ──► workers (1..=6)
//!                                                           │
//!                  CancellationToken ◄── coordinator ◄──────┘ first failure
//!                         ▲
//!                  SIGINT / SIGTERM
//! ```
//!
//! A failover job:
//!
//! 1. **Select**: filter the fleet (fixture names, exclude, include, state)
//! 2. **Check**: skip load balancers whose amphorae already run the latest image
//! 3. **Failover**: trigger the failover and poll until ACTIVE or timeout
//! 4. **Stop**: the first failure or an operator interrupt stops new work;
//!    transitions already in flight are left to finish
//!
//! Everything talks to the control plane through
//! [`ControlPlane`](osctl_core::ControlPlane); [`openstack`] is the REST
//! implementation.

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod failover;
pub mod idempotency;
pub mod inspect;
pub mod openstack;
pub mod poller;
pub mod selector;
pub mod shutdown;

#[cfg(test)]
mod testing;

// Failover job
pub use failover::{
    run_failover, run_failover_with_poller, FailoverJob, JobReport, Outcome, SkipReason, StopCause,
};

// Configuration
pub use config::{EligibilityFilter, JobConfig, OpenStackConfig, StatePolicy};

// Error handling
pub use error::{OrchestratorError, Result};

// Selection and polling
pub use poller::{Clock, Poller, TokioClock};
pub use selector::{select_targets, Selection};

// OpenStack backend
pub use openstack::OpenStack;

// Interrupts
pub use shutdown::spawn_signal_listener;
