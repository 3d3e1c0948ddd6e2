//! Configuration for a failover job and for the OpenStack connection
//!
//! Both structs are built once at startup (CLI flags, `OS_*` environment
//! variables and an optional TOML file) and then passed by reference.

use crate::error::{OrchestratorError, Result};
use osctl_core::ProvisioningState;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Smallest accepted worker count
pub const MIN_PARALLELISM: usize = 1;

/// Largest accepted worker count
pub const MAX_PARALLELISM: usize = 6;

/// Default worker count
pub const DEFAULT_PARALLELISM: usize = 2;

/// Default per-target failover timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Default polling cadence while waiting for a load balancer
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;

/// Name fragment of load balancers created by the tempest test suite
pub const TEMPEST_NAME_PATTERN: &str = "tempest";

/// Default config file name, looked up in `$HOME`
pub const DEFAULT_CONFIG_FILE: &str = ".osctl.toml";

/// What to do with a selected load balancer whose state is not allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatePolicy {
    /// Abort the whole batch before any failover starts
    Strict,
    /// Log a warning and leave the load balancer out
    #[default]
    Lenient,
}

/// Rules deciding which load balancers of the fleet are failed over
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    /// When non-empty, only these IDs are candidates
    pub include: HashSet<String>,

    /// Always removed; wins over `include`
    pub exclude: HashSet<String>,

    /// Provisioning states a candidate may be in
    pub allowed_states: HashSet<ProvisioningState>,

    /// Name fragments of fixture load balancers that are never touched
    pub name_exclusion_patterns: Vec<String>,
}

impl Default for EligibilityFilter {
    fn default() -> Self {
        Self {
            include: HashSet::new(),
            exclude: HashSet::new(),
            allowed_states: [ProvisioningState::Active, ProvisioningState::Error]
                .into_iter()
                .collect(),
            name_exclusion_patterns: vec![TEMPEST_NAME_PATTERN.to_string()],
        }
    }
}

impl EligibilityFilter {
    /// Restrict the batch to the given IDs
    pub fn with_include<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Never touch the given IDs
    pub fn with_exclude<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the allowed provisioning states
    pub fn with_allowed_states<I>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = ProvisioningState>,
    {
        self.allowed_states = states.into_iter().collect();
        self
    }

    /// Whether the name marks a test fixture
    pub fn is_fixture_name(&self, name: &str) -> bool {
        self.name_exclusion_patterns
            .iter()
            .any(|p| !p.is_empty() && name.contains(p.as_str()))
    }
}

/// Configuration of one failover job
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Number of concurrent workers, 1..=6
    pub parallelism: usize,

    /// Max time a single load balancer may take to come back ACTIVE
    pub timeout: Duration,

    /// Delay between two state polls
    pub poll_interval: Duration,

    /// Target selection rules
    pub filter: EligibilityFilter,

    /// Handling of selected load balancers in a disallowed state
    pub policy: StatePolicy,

    /// Skip load balancers whose amphorae already run the latest image
    pub image_check: bool,

    /// Only consider load balancers of this project
    pub project: Option<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            parallelism: DEFAULT_PARALLELISM,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            filter: EligibilityFilter::default(),
            policy: StatePolicy::default(),
            image_check: true,
            project: None,
        }
    }
}

impl JobConfig {
    /// Set worker count
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set per-target timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set polling cadence
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set selection filter
    pub fn with_filter(mut self, filter: EligibilityFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set state policy
    pub fn with_policy(mut self, policy: StatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable the image idempotency check
    pub fn with_image_check(mut self, enabled: bool) -> Self {
        self.image_check = enabled;
        self
    }

    /// Restrict the fleet listing to one project
    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project.filter(|p| !p.is_empty());
        self
    }

    /// Reject configurations that must never reach the worker pool
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PARALLELISM..=MAX_PARALLELISM).contains(&self.parallelism) {
            return Err(OrchestratorError::InvalidParallelism(self.parallelism));
        }
        if self.timeout.is_zero() {
            return Err(OrchestratorError::config("timeout must be greater than zero"));
        }
        if self.poll_interval.is_zero() {
            return Err(OrchestratorError::config(
                "poll interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// OpenStack credentials
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenStackConfig {
    pub username: String,
    pub password: String,
    pub project_name: String,
    pub auth_url: String,
    pub region: String,
    pub domain_name: String,
}

impl OpenStackConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        debug!(file = %path.display(), "Using config file");
        Ok(config)
    }

    /// Load the explicit file, or `$HOME/.osctl.toml` when it exists, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply a non-empty override on top of a file value
    pub fn merge(mut self, overrides: OpenStackConfig) -> Self {
        fn pick(slot: &mut String, value: String) {
            if !value.is_empty() {
                *slot = value;
            }
        }
        pick(&mut self.username, overrides.username);
        pick(&mut self.password, overrides.password);
        pick(&mut self.project_name, overrides.project_name);
        pick(&mut self.auth_url, overrides.auth_url);
        pick(&mut self.region, overrides.region);
        pick(&mut self.domain_name, overrides.domain_name);
        self
    }

    /// Check that authentication can be attempted at all
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("auth_url", &self.auth_url),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(OrchestratorError::config(format!(
                "missing OpenStack credentials: {}",
                missing.join(", ")
            )))
        }
    }

    /// User domain, `default` unless configured
    pub fn domain(&self) -> &str {
        if self.domain_name.is_empty() {
            "default"
        } else {
            &self.domain_name
        }
    }
}

impl std::fmt::Debug for OpenStackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let password = if self.password.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("OpenStackConfig")
            .field("username", &self.username)
            .field("password", &password)
            .field("project_name", &self.project_name)
            .field("auth_url", &self.auth_url)
            .field("region", &self.region)
            .field("domain_name", &self.domain_name)
            .finish()
    }
}

fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILE))
}
