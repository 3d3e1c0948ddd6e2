//! Target selection
//!
//! Turns a fleet snapshot into the ordered list of load balancer IDs to fail
//! over. Rules are applied per load balancer, in listing order:
//!
//! ```text
//! fixture name?            -> skip (info)
//! explicitly excluded?     -> skip (info)
//! include set and not in?  -> skip (silent)
//! state not allowed?       -> not eligible (policy decides)
//! otherwise                -> candidate
//! ```

use crate::config::{EligibilityFilter, StatePolicy};
use crate::error::{OrchestratorError, Result};
use osctl_core::Target;
use std::collections::HashSet;
use tracing::{info, warn};

/// Outcome of running the selector over a fleet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Load balancer IDs to fail over, in fleet order, deduplicated
    pub candidates: Vec<String>,

    /// Requested load balancers left out because of their state
    pub not_eligible: Vec<Target>,
}

impl Selection {
    /// Nothing to do
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Apply the filter to a fleet snapshot. Pure: no logging, no policy.
pub fn select(fleet: &[Target], filter: &EligibilityFilter) -> Selection {
    let mut selection = Selection::default();
    let mut seen = HashSet::new();

    for target in fleet {
        if filter.is_fixture_name(&target.name) || filter.exclude.contains(&target.id) {
            continue;
        }
        if !filter.include.is_empty() && !filter.include.contains(&target.id) {
            continue;
        }
        if !seen.insert(target.id.as_str()) {
            continue;
        }

        if filter.allowed_states.contains(&target.provisioning_state) {
            selection.candidates.push(target.id.clone());
        } else {
            selection.not_eligible.push(target.clone());
        }
    }

    selection
}

/// Select candidates, log every decision and enforce the state policy
pub fn select_targets(
    fleet: &[Target],
    filter: &EligibilityFilter,
    policy: StatePolicy,
) -> Result<Selection> {
    for target in fleet {
        if filter.is_fixture_name(&target.name) {
            info!(loadbalancer = %target.id, name = %target.name, "Created by tempest, skip");
        } else if filter.exclude.contains(&target.id) {
            info!(loadbalancer = %target.id, "Excluded");
        }
    }

    let selection = select(fleet, filter);

    if !selection.not_eligible.is_empty() {
        match policy {
            StatePolicy::Strict => {
                for target in &selection.not_eligible {
                    warn!(
                        loadbalancer = %target.id,
                        status = %target.provisioning_state,
                        "Load balancer not in an allowed state"
                    );
                }
                return Err(OrchestratorError::NotEligible(
                    selection.not_eligible.iter().map(|t| t.id.clone()).collect(),
                ));
            }
            StatePolicy::Lenient => {
                for target in &selection.not_eligible {
                    warn!(
                        loadbalancer = %target.id,
                        status = %target.provisioning_state,
                        updated_at = target.updated_at.as_deref().unwrap_or("unknown"),
                        "Load balancer {} not in an allowed state, skipped",
                        target.name
                    );
                }
            }
        }
    }

    Ok(selection)
}
