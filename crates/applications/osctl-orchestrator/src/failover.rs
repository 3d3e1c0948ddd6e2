//! Bulk load balancer failover
//!
//! Fails over a batch of load balancers with a bounded pool of workers and
//! stops the whole batch on the first failure:
//!
//! ```text
//! candidates ──> producer ──> queue (cap = parallelism)
//!                               │
//!               ┌───────────────┼───────────────┐
//!            worker 0        worker 1   ...  worker N-1
//!               │  image check -> failover -> wait ACTIVE
//!               └──── first failure ──> coordinator ──┐
//!                                                     ├──> CancellationToken
//!                          SIGINT / SIGTERM ──────────┘
//! ```
//!
//! ## Key Design Decisions
//!
//! - **Fail fast**: one failed load balancer cancels everything not yet started
//! - **No interruption**: cancellation never aborts a failover already in progress
//! - **No retries**: a failed load balancer is reported, never reattempted
//! - **Write-once outcomes**: every load balancer gets at most one outcome

use crate::config::JobConfig;
use crate::error::{OrchestratorError, Result};
use crate::idempotency::{self, Verdict};
use crate::poller::Poller;
use crate::selector::{self, Selection};
use chrono::{DateTime, Utc};
use osctl_core::{ControlPlane, ImageRef};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Why a load balancer was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Every amphora already runs the latest image
    AlreadyUpgraded,
    /// The load balancer has no amphorae
    NoAmphorae,
}

/// Final state of one load balancer in a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Skipped(SkipReason),
    Succeeded,
    Failed(String),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// What made the job stop taking new load balancers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCause {
    /// Every candidate was processed
    Completed,
    /// A failover failed
    FailFast,
    /// The operator interrupted the run
    Interrupted,
}

/// Result of one failover job
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// Correlates the job's log lines
    pub job_id: String,

    /// Load balancers offered to the workers, in selection order
    pub candidates: Vec<String>,

    outcomes: HashMap<String, Outcome>,

    /// Why the job stopped
    pub stop_cause: StopCause,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,
}

impl JobReport {
    fn new(candidates: Vec<String>) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            candidates,
            outcomes: HashMap::new(),
            stop_cause: StopCause::Completed,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record an outcome; returns false if the load balancer already had one
    pub fn record(&mut self, target_id: impl Into<String>, outcome: Outcome) -> bool {
        let target_id = target_id.into();
        if self.outcomes.contains_key(&target_id) {
            warn!(loadbalancer = %target_id, "Ignoring second outcome");
            return false;
        }
        self.outcomes.insert(target_id, outcome);
        true
    }

    pub fn outcome(&self, target_id: &str) -> Option<&Outcome> {
        self.outcomes.get(target_id)
    }

    /// Number of recorded outcomes
    pub fn recorded(&self) -> usize {
        self.outcomes.len()
    }

    fn matching(&self, pred: impl Fn(&Outcome) -> bool) -> Vec<&str> {
        self.candidates
            .iter()
            .filter(|id| self.outcomes.get(id.as_str()).is_some_and(&pred))
            .map(String::as_str)
            .collect()
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.matching(|o| *o == Outcome::Succeeded)
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.matching(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn failed(&self) -> Vec<&str> {
        self.matching(Outcome::is_failed)
    }

    /// Candidates no worker ever started
    pub fn never_started(&self) -> Vec<&str> {
        self.candidates
            .iter()
            .filter(|id| !self.outcomes.contains_key(id.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// True when no load balancer failed
    pub fn is_success(&self) -> bool {
        !self.outcomes.values().any(Outcome::is_failed)
    }

    /// Emit the end-of-job summary
    pub fn log_summary(&self) {
        let elapsed_secs = self
            .finished_at
            .map(|f| (f - self.started_at).num_milliseconds() as f64 / 1000.0)
            .unwrap_or_default();

        let never_started = self.never_started();
        if self.is_success() {
            info!(
                job_id = %self.job_id,
                succeeded = self.succeeded().len(),
                skipped = self.skipped().len(),
                not_started = never_started.len(),
                elapsed_secs,
                stop_cause = ?self.stop_cause,
                "Failover job finished"
            );
        } else {
            error!(
                job_id = %self.job_id,
                failed = ?self.failed(),
                succeeded = self.succeeded().len(),
                skipped = self.skipped().len(),
                not_started = ?never_started,
                elapsed_secs,
                "Failover job aborted"
            );
        }
    }
}

/// Per-worker view of the job
struct WorkerContext<C: ?Sized> {
    client: Arc<C>,
    poller: Poller,
    fix_image: Option<ImageRef>,
    timeout: std::time::Duration,
}

impl<C> WorkerContext<C>
where
    C: ControlPlane + ?Sized,
{
    async fn process(&self, target_id: &str) -> Outcome {
        if let Some(fix) = &self.fix_image {
            match idempotency::check(self.client.as_ref(), target_id, fix).await {
                Verdict::Converged => return Outcome::Skipped(SkipReason::AlreadyUpgraded),
                Verdict::NoUnderlyingResources => return Outcome::Skipped(SkipReason::NoAmphorae),
                Verdict::NeedsFailover => {}
            }
        }

        match self
            .poller
            .failover(self.client.as_ref(), target_id, self.timeout)
            .await
        {
            Ok(()) => Outcome::Succeeded,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

/// A validated, ready-to-run failover job
pub struct FailoverJob<C: ?Sized> {
    client: Arc<C>,
    config: JobConfig,
    fix_image: Option<ImageRef>,
    poller: Poller,
}

impl<C> FailoverJob<C>
where
    C: ControlPlane + ?Sized + 'static,
{
    /// Create a job; fails if the configuration is out of range
    pub fn new(client: Arc<C>, config: JobConfig, fix_image: Option<ImageRef>) -> Result<Self> {
        config.validate()?;
        let poller = Poller::new(config.poll_interval);
        Ok(Self {
            client,
            config,
            fix_image,
            poller,
        })
    }

    /// Replace the poller (custom clock)
    pub fn with_poller(mut self, poller: Poller) -> Self {
        self.poller = poller;
        self
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Fail over `candidates` until done, the first failure, or cancellation
    pub async fn run(&self, candidates: Vec<String>, cancel: CancellationToken) -> JobReport {
        let mut report = JobReport::new(candidates);
        let span = info_span!("failover_job", job_id = %report.job_id);

        async {
            if report.candidates.is_empty() {
                info!("No load balancers need to failover.");
            } else {
                info!(
                    loadbalancers = ?report.candidates,
                    parallelism = self.config.parallelism,
                    "Will failover the load balancers."
                );
                self.dispatch(&mut report, &cancel).await;
            }
        }
        .instrument(span)
        .await;

        report.finished_at = Some(Utc::now());
        report
    }

    async fn dispatch(&self, report: &mut JobReport, cancel: &CancellationToken) {
        let parallelism = self.config.parallelism;

        let (queue_tx, queue_rx) = mpsc::channel::<String>(parallelism);
        let queue_rx = Arc::new(Mutex::new(queue_rx));

        // Each worker reports at most one failure, so this never blocks
        let (fail_tx, fail_rx) = mpsc::channel::<String>(parallelism);

        let producer = tokio::spawn(
            produce(report.candidates.clone(), queue_tx, cancel.clone()).in_current_span(),
        );
        let coordinator = tokio::spawn(coordinate(fail_rx, cancel.clone()).in_current_span());

        let ctx = Arc::new(WorkerContext {
            client: self.client.clone(),
            poller: self.poller.clone(),
            fix_image: self.fix_image.clone(),
            timeout: self.config.timeout,
        });

        let mut workers = JoinSet::new();
        for worker_id in 0..parallelism {
            workers.spawn(
                work(
                    ctx.clone(),
                    queue_rx.clone(),
                    fail_tx.clone(),
                    cancel.clone(),
                )
                .instrument(info_span!("worker", worker_id)),
            );
        }
        drop(fail_tx);
        drop(queue_rx);

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcomes) => {
                    for (target_id, outcome) in outcomes {
                        report.record(target_id, outcome);
                    }
                }
                Err(e) => {
                    error!(error = %e, "Worker task died, cancelling remaining load balancers");
                    cancel.cancel();
                }
            }
        }

        if let Err(e) = producer.await {
            warn!(error = %e, "Producer task died");
        }
        let failed_fast = coordinator.await.unwrap_or_default();

        report.stop_cause = if failed_fast || !report.is_success() {
            StopCause::FailFast
        } else if cancel.is_cancelled() {
            StopCause::Interrupted
        } else {
            StopCause::Completed
        };
    }
}

/// Feed candidates into the queue in order; stop on cancellation
async fn produce(candidates: Vec<String>, queue: mpsc::Sender<String>, cancel: CancellationToken) {
    for target_id in candidates {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancelled, no more load balancers will be queued");
                return;
            }
            sent = queue.send(target_id) => {
                if sent.is_err() {
                    // Every worker is gone
                    return;
                }
            }
        }
    }
}

/// Cancel the job on the first reported failure
async fn coordinate(mut failures: mpsc::Receiver<String>, cancel: CancellationToken) -> bool {
    match failures.recv().await {
        Some(target_id) => {
            warn!(
                loadbalancer = %target_id,
                "Failover failed, no further load balancers will be started"
            );
            cancel.cancel();
            true
        }
        None => false,
    }
}

/// Worker loop: take, check, fail over, repeat
async fn work<C>(
    ctx: Arc<WorkerContext<C>>,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
    failures: mpsc::Sender<String>,
    cancel: CancellationToken,
) -> Vec<(String, Outcome)>
where
    C: ControlPlane + ?Sized,
{
    let mut outcomes = Vec::new();

    loop {
        if cancel.is_cancelled() {
            debug!("Cancelled, not taking new load balancers");
            break;
        }

        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = rx.recv() => next,
            }
        };
        let Some(target_id) = next else {
            break;
        };

        info!(loadbalancer = %target_id, "Starting failover load balancer");
        let outcome = ctx.process(&target_id).await;

        match &outcome {
            Outcome::Succeeded => {
                info!(loadbalancer = %target_id, "Finished to failover load balancer");
            }
            Outcome::Skipped(reason) => {
                info!(loadbalancer = %target_id, reason = ?reason, "Skipped load balancer");
            }
            Outcome::Failed(message) => {
                error!(
                    loadbalancer = %target_id,
                    error = %message,
                    "Failed to failover load balancer"
                );
                outcomes.push((target_id.clone(), outcome));
                let _ = failures.send(target_id).await;
                return outcomes;
            }
        }
        outcomes.push((target_id, outcome));
    }

    outcomes
}

/// Full failover flow: validate, list, select, resolve image, run
///
/// Precondition failures (bad configuration, listing or image lookup errors,
/// strict-policy violations) are returned before any failover starts.
pub async fn run_failover<C>(
    client: Arc<C>,
    config: JobConfig,
    cancel: CancellationToken,
) -> Result<(Selection, JobReport)>
where
    C: ControlPlane + ?Sized + 'static,
{
    let poller = Poller::new(config.poll_interval);
    run_failover_with_poller(client, config, poller, cancel).await
}

/// [`run_failover`] polling through a caller-supplied [`Poller`]
pub async fn run_failover_with_poller<C>(
    client: Arc<C>,
    config: JobConfig,
    poller: Poller,
    cancel: CancellationToken,
) -> Result<(Selection, JobReport)>
where
    C: ControlPlane + ?Sized + 'static,
{
    config.validate()?;

    let fleet = client
        .list_targets(config.project.as_deref())
        .await
        .map_err(|e| OrchestratorError::precondition("list load balancers", e))?;
    debug!(count = fleet.len(), "Listed load balancers");

    let selection = selector::select_targets(&fleet, &config.filter, config.policy)?;

    let fix_image = if config.image_check && !selection.is_empty() {
        let image = client
            .fix_image()
            .await
            .map_err(|e| OrchestratorError::precondition("get latest amphora image", e))?;
        info!(image = %image, "Latest amphora image");
        Some(image)
    } else {
        None
    };

    let job = FailoverJob::new(client, config, fix_image)?.with_poller(poller);
    let report = job.run(selection.candidates.clone(), cancel).await;
    Ok((selection, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EligibilityFilter, StatePolicy};
    use crate::testing::{FakeClock, FakeControlPlane};
    use osctl_core::{ControlPlaneError, ProvisioningState, Target};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("L{i}")).collect()
    }

    fn job(cp: Arc<FakeControlPlane>, config: JobConfig, fix: Option<&str>) -> FailoverJob<FakeControlPlane> {
        let poller = Poller::with_clock(config.poll_interval, Arc::new(FakeClock::new()));
        FailoverJob::new(cp, config, fix.map(ImageRef::new))
            .unwrap()
            .with_poller(poller)
    }

    fn no_check() -> JobConfig {
        JobConfig::default().with_image_check(false)
    }

    #[tokio::test]
    async fn test_all_candidates_succeed() {
        let cp = Arc::new(FakeControlPlane::new());
        let job = job(cp.clone(), no_check().with_parallelism(3), None);

        let report = job.run(ids(5), CancellationToken::new()).await;

        assert!(report.is_success());
        assert_eq!(report.succeeded(), vec!["L1", "L2", "L3", "L4", "L5"]);
        assert!(report.never_started().is_empty());
        assert_eq!(report.stop_cause, StopCause::Completed);
        assert_eq!(cp.failover_calls().len(), 5);
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_empty_candidates_is_noop() {
        let cp = Arc::new(FakeControlPlane::new());
        let report = job(cp.clone(), no_check(), None)
            .run(Vec::new(), CancellationToken::new())
            .await;

        assert!(report.is_success());
        assert_eq!(report.recorded(), 0);
        assert!(cp.failover_calls().is_empty());
    }

    #[tokio::test]
    async fn test_converged_target_is_skipped_without_failover() {
        let cp = Arc::new(
            FakeControlPlane::new()
                .with_amphora("L1", "amp-1", Some("srv-1"))
                .with_server("srv-1", Some("img-9")),
        );
        let report = job(cp.clone(), JobConfig::default(), Some("img-9"))
            .run(ids(1), CancellationToken::new())
            .await;

        assert_eq!(
            report.outcome("L1"),
            Some(&Outcome::Skipped(SkipReason::AlreadyUpgraded))
        );
        assert!(cp.failover_calls().is_empty());
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_outdated_target_is_failed_over() {
        let cp = Arc::new(
            FakeControlPlane::new()
                .with_amphora("L1", "amp-1", Some("srv-1"))
                .with_server("srv-1", Some("img-8")),
        );
        let report = job(cp.clone(), JobConfig::default(), Some("img-9"))
            .run(ids(1), CancellationToken::new())
            .await;

        assert_eq!(report.outcome("L1"), Some(&Outcome::Succeeded));
        assert_eq!(cp.failover_calls(), vec!["L1"]);
    }

    #[tokio::test]
    async fn test_second_candidate_fails_fast() {
        let cp = Arc::new(FakeControlPlane::new().rejecting_failover("L2"));
        let report = job(cp.clone(), no_check().with_parallelism(3), None)
            .run(ids(5), CancellationToken::new())
            .await;

        assert!(!report.is_success());
        assert_eq!(report.failed(), vec!["L2"]);
        assert!(report.recorded() <= 5);
        assert_eq!(report.stop_cause, StopCause::FailFast);
        for id in report.candidates.iter().filter(|id| *id != "L2") {
            assert!(!matches!(report.outcome(id), Some(Outcome::Failed(_))));
        }
    }

    #[tokio::test]
    async fn test_no_new_candidate_after_failure() {
        let gate = Arc::new(Semaphore::new(0));
        let cp = Arc::new(
            FakeControlPlane::new()
                .rejecting_failover("L1")
                .with_failover_gate(gate.clone()),
        );
        let cancel = CancellationToken::new();
        let job = job(cp.clone(), no_check().with_parallelism(2), None);

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { job.run(ids(5), cancel).await })
        };

        // L1 fails at once, L2 is held in flight by the gate
        while !(cancel.is_cancelled() && cp.failover_calls().len() >= 2) {
            tokio::task::yield_now().await;
        }
        gate.add_permits(5);

        let report = handle.await.unwrap();
        assert_eq!(report.failed(), vec!["L1"]);
        assert_eq!(report.outcome("L2"), Some(&Outcome::Succeeded));
        assert_eq!(report.never_started(), vec!["L3", "L4", "L5"]);
        assert_eq!(cp.failover_calls(), vec!["L1", "L2"]);
    }

    #[tokio::test]
    async fn test_interrupt_lets_in_flight_finish() {
        let gate = Arc::new(Semaphore::new(0));
        let cp = Arc::new(FakeControlPlane::new().with_failover_gate(gate.clone()));
        let cancel = CancellationToken::new();
        let job = job(cp.clone(), no_check().with_parallelism(2), None);

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { job.run(ids(5), cancel).await })
        };

        while cp.failover_calls().len() < 2 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();
        gate.add_permits(2);

        let report = handle.await.unwrap();
        assert_eq!(report.succeeded(), vec!["L1", "L2"]);
        assert_eq!(report.never_started(), vec!["L3", "L4", "L5"]);
        assert_eq!(report.stop_cause, StopCause::Interrupted);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let cp = Arc::new(FakeControlPlane::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = job(cp.clone(), no_check(), None).run(ids(3), cancel).await;
        assert_eq!(report.recorded(), 0);
        assert_eq!(report.never_started().len(), 3);
        assert!(cp.failover_calls().is_empty());
    }

    #[tokio::test]
    async fn test_poll_timeout_is_failure() {
        let cp = Arc::new(
            FakeControlPlane::new().with_states("L1", [Some(ProvisioningState::PendingUpdate)]),
        );
        let config = no_check()
            .with_parallelism(1)
            .with_timeout(Duration::from_secs(10));
        let report = job(cp.clone(), config, None)
            .run(ids(3), CancellationToken::new())
            .await;

        assert!(matches!(report.outcome("L1"), Some(Outcome::Failed(m)) if m.contains("did not reach ACTIVE")));
        assert_eq!(report.never_started(), vec!["L2", "L3"]);
    }

    #[test]
    fn test_record_is_write_once() {
        let mut report = JobReport::new(ids(1));
        assert!(report.record("L1", Outcome::Succeeded));
        assert!(!report.record("L1", Outcome::Failed("late".into())));
        assert_eq!(report.outcome("L1"), Some(&Outcome::Succeeded));
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&Outcome::Skipped(SkipReason::AlreadyUpgraded)).unwrap();
        assert_eq!(json, r#"{"outcome":"skipped","detail":"already_upgraded"}"#);
    }

    #[tokio::test]
    async fn test_invalid_parallelism_makes_no_calls() {
        let cp = Arc::new(FakeControlPlane::new().with_fleet(vec![Target::new(
            "L1",
            "web",
            ProvisioningState::Active,
        )]));

        for parallelism in [0, 7] {
            let err = run_failover(
                cp.clone(),
                no_check().with_parallelism(parallelism),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, OrchestratorError::InvalidParallelism(_)));
        }
        assert_eq!(cp.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_run_failover_end_to_end() {
        let cp = Arc::new(
            FakeControlPlane::new()
                .with_fleet(vec![
                    Target::new("L1", "web", ProvisioningState::Active),
                    Target::new("L2", "api", ProvisioningState::Active),
                    Target::new("L3", "db", ProvisioningState::Error),
                ])
                .with_fix_image("img-9")
                .with_amphora("L1", "amp-1", Some("srv-1"))
                .with_server("srv-1", Some("img-9"))
                .with_amphora("L2", "amp-2", Some("srv-2"))
                .with_server("srv-2", Some("img-1")),
        );
        let config = JobConfig::default()
            .with_filter(EligibilityFilter::default().with_exclude(["L3"]))
            .with_policy(StatePolicy::Lenient);

        let clock = Arc::new(FakeClock::new());
        let poller = Poller::with_clock(config.poll_interval, clock.clone());

        let (selection, report) =
            run_failover_with_poller(cp.clone(), config, poller, CancellationToken::new())
                .await
                .unwrap();

        assert_eq!(selection.candidates, vec!["L1", "L2"]);
        assert_eq!(report.skipped(), vec!["L1"]);
        assert_eq!(report.succeeded(), vec!["L2"]);
        assert_eq!(cp.failover_calls(), vec!["L2"]);
        // L2 reached ACTIVE on the first poll
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_missing_fix_image_is_precondition_failure() {
        let cp = Arc::new(FakeControlPlane::new().with_fleet(vec![Target::new(
            "L1",
            "web",
            ProvisioningState::Active,
        )]));

        let err = run_failover(cp.clone(), JobConfig::default(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_precondition());
        assert!(matches!(
            err,
            OrchestratorError::Precondition { stage: "get latest amphora image", .. }
        ));
        assert!(cp.failover_calls().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_is_precondition_failure() {
        let cp = Arc::new(
            FakeControlPlane::new()
                .with_fleet(vec![Target::new("L1", "web", ProvisioningState::Active)])
                .failing_listing(),
        );

        let err = run_failover(cp.clone(), JobConfig::default(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_precondition());
        assert!(matches!(
            err,
            OrchestratorError::Precondition {
                stage: "list load balancers",
                source: ControlPlaneError::Auth(_),
            }
        ));
        assert_eq!(cp.list_calls(), 1);
        assert!(cp.failover_calls().is_empty());
    }

    #[tokio::test]
    async fn test_strict_policy_aborts_before_work() {
        let cp = Arc::new(FakeControlPlane::new().with_fleet(vec![
            Target::new("L1", "web", ProvisioningState::Active),
            Target::new("L2", "api", ProvisioningState::PendingUpdate),
        ]));
        let config = no_check().with_policy(StatePolicy::Strict);

        let err = run_failover(cp.clone(), config, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NotEligible(_)));
        assert!(cp.failover_calls().is_empty());
    }
}
