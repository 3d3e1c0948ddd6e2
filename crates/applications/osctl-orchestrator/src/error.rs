//! Error types for the orchestrator

use osctl_core::ControlPlaneError;
use std::time::Duration;
use thiserror::Error;

/// Orchestrator result type
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors that can occur in the orchestrator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Remote control-plane call failed
    #[error("Control plane error: {0}")]
    ControlPlane(#[from] ControlPlaneError),

    /// A remote lookup needed before any failover could start failed
    #[error("Failed to {stage}: {source}")]
    Precondition {
        stage: &'static str,
        #[source]
        source: ControlPlaneError,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parallelism outside the accepted range
    #[error("Invalid parallelism {0}: must be between {min} and {max}", min = crate::config::MIN_PARALLELISM, max = crate::config::MAX_PARALLELISM)]
    InvalidParallelism(usize),

    /// Strict policy: some selected load balancers are in a disallowed state
    #[error("Load balancers not in an allowed provisioning state: {}", .0.join(", "))]
    NotEligible(Vec<String>),

    /// Polling deadline passed before the desired state was reached
    #[error("Load balancer {target} did not reach {desired} within {after:?}")]
    Timeout {
        target: String,
        desired: String,
        after: Duration,
    },

    /// Remote reported the ERROR provisioning state
    #[error("Load balancer {0} went to ERROR")]
    ErrorState(String),

    /// Resource vanished while waiting for a state other than DELETED
    #[error("Load balancer {0} disappeared while waiting")]
    Disappeared(String),
}

impl OrchestratorError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a control-plane error raised while preparing the job
    pub fn precondition(stage: &'static str, source: ControlPlaneError) -> Self {
        Self::Precondition { stage, source }
    }

    /// Whether this error was raised before any work started
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::ConfigFile(_)
                | Self::Precondition { .. }
                | Self::InvalidParallelism(_)
                | Self::NotEligible(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parallelism_message() {
        let err = OrchestratorError::InvalidParallelism(7);
        assert_eq!(
            err.to_string(),
            "Invalid parallelism 7: must be between 1 and 6"
        );
        assert!(err.is_precondition());
    }

    #[test]
    fn test_not_eligible_lists_ids() {
        let err = OrchestratorError::NotEligible(vec!["lb-1".into(), "lb-2".into()]);
        assert!(err.to_string().ends_with("lb-1, lb-2"));
    }

    #[test]
    fn test_precondition_keeps_source() {
        let err = OrchestratorError::precondition(
            "list load balancers",
            ControlPlaneError::Auth("HTTP 401".into()),
        );
        assert!(err.is_precondition());
        assert_eq!(
            err.to_string(),
            "Failed to list load balancers: Authentication error: HTTP 401"
        );
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<ControlPlaneError>().is_some());
    }

    #[test]
    fn test_control_plane_error_is_not_precondition() {
        let err = OrchestratorError::from(ControlPlaneError::Transport("reset".into()));
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_timeout_is_not_precondition() {
        let err = OrchestratorError::Timeout {
            target: "lb-1".into(),
            desired: "ACTIVE".into(),
            after: Duration::from_secs(600),
        };
        assert!(!err.is_precondition());
    }
}
