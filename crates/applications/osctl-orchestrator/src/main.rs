//! osctl - OpenStack load balancer operations
//!
//! ## Usage
//!
//! ```bash
//! # Fail over every load balancer not yet on the latest amphora image
//! osctl failover loadbalancers --parallelism 4
//!
//! # Only some of them, aborting if any is not ACTIVE/ERROR
//! osctl failover loadbalancers -i lb-1 -i lb-2 --strict
//!
//! # Inspection
//! osctl get loadbalancers --project <project-id>
//! osctl get loadbalancer <lb-id>
//! osctl get projects
//! ```
//!
//! Credentials come from flags, `OS_*` environment variables or
//! `$HOME/.osctl.toml`, in that order of precedence.

use clap::{Parser, Subcommand};
use osctl_orchestrator::{
    config::{
        DEFAULT_PARALLELISM, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS,
    },
    inspect, run_failover, spawn_signal_listener, EligibilityFilter, JobConfig, OpenStack,
    OpenStackConfig, StatePolicy, StopCause,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "osctl")]
#[command(about = "OpenStack load balancer operations (bulk amphora failover)", long_about = None)]
struct Cli {
    /// Config file (default: $HOME/.osctl.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// OpenStack user name
    #[arg(short = 'u', long, global = true, env = "OS_USERNAME")]
    user_name: Option<String>,

    /// OpenStack password
    #[arg(short = 'p', long, global = true, env = "OS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Project to scope the token to
    #[arg(long, global = true, env = "OS_PROJECT_NAME")]
    project_name: Option<String>,

    /// OpenStack region
    #[arg(short = 'r', long, global = true, env = "OS_REGION_NAME")]
    region: Option<String>,

    /// Keystone URL
    #[arg(short = 'a', long, global = true, env = "OS_AUTH_URL")]
    authurl: Option<String>,

    /// User and project domain (default: "default")
    #[arg(long, global = true, env = "OS_USER_DOMAIN_NAME")]
    domain_name: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fail over resources
    Failover {
        #[command(subcommand)]
        resource: FailoverResource,
    },

    /// Show resources
    Get {
        #[command(subcommand)]
        resource: GetResource,
    },
}

#[derive(Subcommand)]
enum FailoverResource {
    /// Fail over load balancers so their amphorae run the latest image (admin)
    Loadbalancers {
        /// Concurrent failovers (1-6)
        #[arg(long, default_value_t = DEFAULT_PARALLELISM)]
        parallelism: usize,

        /// Only load balancers of this project
        #[arg(long)]
        project: Option<String>,

        /// Only these load balancers
        #[arg(short = 'i', long = "include-loadbalancers", value_delimiter = ',')]
        include: Vec<String>,

        /// Never these load balancers (wins over --include-loadbalancers)
        #[arg(short = 'e', long = "exclude-loadbalancers", value_delimiter = ',')]
        exclude: Vec<String>,

        /// Per load balancer timeout in seconds
        #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Abort when a selected load balancer is not ACTIVE or ERROR
        #[arg(long)]
        strict: bool,

        /// Fail over even when the amphorae already run the latest image
        #[arg(long)]
        no_image_check: bool,

        /// Seconds between provisioning status polls
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
        poll_interval: u64,
    },
}

#[derive(Subcommand)]
enum GetResource {
    /// Load balancers with listeners, pools and members
    Loadbalancers {
        /// Only load balancers of this project (admin)
        #[arg(long)]
        project: Option<String>,
    },

    /// Underlying resources of one load balancer (admin)
    Loadbalancer {
        /// Load balancer ID
        id: String,
    },

    /// All projects (admin)
    Projects,
}

impl Cli {
    fn openstack_config(&self) -> anyhow::Result<OpenStackConfig> {
        let overrides = OpenStackConfig {
            username: self.user_name.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            project_name: self.project_name.clone().unwrap_or_default(),
            auth_url: self.authurl.clone().unwrap_or_default(),
            region: self.region.clone().unwrap_or_default(),
            domain_name: self.domain_name.clone().unwrap_or_default(),
        };
        let config = OpenStackConfig::load(self.config.as_deref())
            .map(|file| file.merge(overrides))
            .and_then(|config| config.validate().map(|()| config))
            .inspect_err(|e| error!(error = %e, "Invalid OpenStack configuration"))?;
        Ok(config)
    }
}

impl FailoverResource {
    /// Job configuration from the flags, rejected before authenticating
    fn job_config(&self) -> anyhow::Result<JobConfig> {
        let FailoverResource::Loadbalancers {
            parallelism,
            project,
            include,
            exclude,
            timeout,
            strict,
            no_image_check,
            poll_interval,
        } = self;

        let filter = EligibilityFilter::default()
            .with_include(include.iter().cloned())
            .with_exclude(exclude.iter().cloned());
        let policy = if *strict {
            StatePolicy::Strict
        } else {
            StatePolicy::Lenient
        };
        let config = JobConfig::default()
            .with_parallelism(*parallelism)
            .with_timeout(Duration::from_secs(*timeout))
            .with_poll_interval(Duration::from_secs(*poll_interval))
            .with_filter(filter)
            .with_policy(policy)
            .with_image_check(!*no_image_check)
            .with_project(project.clone());

        config
            .validate()
            .inspect_err(|e| error!(error = %e, "Invalid failover options"))?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "osctl=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Failover { resource } => {
            let job_config = resource.job_config()?;
            let client = connect(&cli).await?;
            failover_load_balancers(Arc::new(client), job_config).await
        }

        Commands::Get { resource } => {
            let client = connect(&cli).await?;
            let lines = match resource {
                GetResource::Loadbalancers { project } => {
                    inspect::load_balancers(&client, project.as_deref()).await?
                }
                GetResource::Loadbalancer { id } => inspect::load_balancer(&client, id).await?,
                GetResource::Projects => inspect::projects(&client).await?,
            };
            for line in lines {
                println!("{line}");
            }
            Ok(())
        }
    }
}

async fn connect(cli: &Cli) -> anyhow::Result<OpenStack> {
    let config = cli.openstack_config()?;
    OpenStack::connect(&config).await.map_err(|e| {
        error!(error = %e, "Failed to initialize openstack client");
        e.into()
    })
}

async fn failover_load_balancers(client: Arc<OpenStack>, config: JobConfig) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let listener = spawn_signal_listener(cancel.clone());

    let result = run_failover(client, config, cancel).await;
    listener.abort();

    let (_selection, report) = result.inspect_err(|e| error!(error = %e, "Failover aborted"))?;
    report.log_summary();

    if !report.is_success() {
        anyhow::bail!(
            "{} load balancer(s) failed to fail over: {}",
            report.failed().len(),
            report.failed().join(", ")
        );
    }
    if report.stop_cause == StopCause::Interrupted {
        info!("Interrupted by operator");
    }
    Ok(())
}
