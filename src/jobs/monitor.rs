//! Status polling with exponential backoff

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{JobError, Result};
use crate::jobs::models::{JobState, JobSummary};
use crate::jobs::render::select_renderer;
use crate::jobs::JobResource;

/// Blocking delay between poll ticks
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Monitoring parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorOptions {
    /// First wait between polls
    pub min_interval: Duration,
    /// Ceiling for the doubling wait
    pub max_interval: Duration,
    /// Give up once the accumulated wait would pass this
    pub timeout: Option<Duration>,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(5),
            timeout: None,
        }
    }
}

impl MonitorOptions {
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Doubling backoff between a floor and a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    min: Duration,
    max: Duration,
}

impl BackoffPolicy {
    /// A floor above the ceiling is lowered to the ceiling
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min.is_zero() || max.is_zero() {
            return Err(JobError::tool("poll intervals must be greater than zero"));
        }
        Ok(Self {
            min: min.min(max),
            max,
        })
    }

    pub fn initial(&self) -> Duration {
        self.min
    }

    pub fn next(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max)
    }
}

/// Bookkeeping for a single monitor call
#[derive(Debug)]
pub struct PollState {
    interval: Duration,
    waited: Duration,
    started: Instant,
    fetches: u32,
    last: Option<JobSummary>,
}

impl PollState {
    pub fn new(policy: &BackoffPolicy) -> Self {
        Self {
            interval: policy.initial(),
            waited: Duration::ZERO,
            started: Instant::now(),
            fetches: 0,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn waited(&self) -> Duration {
        self.waited
    }

    pub fn fetches(&self) -> u32 {
        self.fetches
    }

    pub fn last(&self) -> Option<&JobSummary> {
        self.last.as_ref()
    }

    fn record(&mut self, summary: &JobSummary) {
        self.fetches += 1;
        self.last = Some(summary.clone());
    }

    /// Whether the accumulated wait has reached `limit`
    pub fn deadline_reached(&self, limit: Duration) -> bool {
        self.waited >= limit
    }

    /// Next sleep: the current interval, cut short so the wait ends at `limit`
    pub fn next_pause(&self, limit: Option<Duration>) -> Duration {
        match limit {
            Some(limit) => self.interval.min(limit.saturating_sub(self.waited)),
            None => self.interval,
        }
    }

    /// Account for one completed sleep and grow the interval
    pub fn advance(&mut self, policy: &BackoffPolicy, slept: Duration) {
        self.waited += slept;
        self.interval = policy.next(self.interval);
    }
}

impl JobResource {
    /// Poll a job until it finishes, fails or the timeout is reached.
    ///
    /// Returns the `{elapsed, failed, status}` snapshot of a finished job.
    /// A failed job is reported as [`JobError::JobFailure`] after its failure
    /// notice has been rendered. The last sleep before the timeout is
    /// shortened to end exactly at it, and the job is fetched once more
    /// before giving up.
    pub async fn monitor(&self, job_id: u64, options: MonitorOptions) -> Result<JobSummary> {
        let policy = BackoffPolicy::new(options.min_interval, options.max_interval)?;
        let mut renderer = select_renderer((self.is_tty)(), (self.output)());
        let mut state = PollState::new(&policy);

        info!(
            job_id,
            min_interval_ms = policy.initial().as_millis() as u64,
            timeout_ms = options.timeout.map(|t| t.as_millis() as u64),
            "Monitoring job"
        );

        loop {
            let body = match self.fetch_job(job_id).await {
                Ok(body) => body,
                Err(e) => {
                    if e.is_transport() {
                        warn!(job_id, fetch = state.fetches() + 1, error = %e, "Polling aborted");
                    }
                    return Err(e);
                }
            };
            let summary: JobSummary = serde_json::from_value(body)?;
            state.record(&summary);
            renderer.tick(job_id, &summary)?;

            let job_state = summary.state();
            debug!(
                job_id,
                status = %summary.status,
                state = %job_state,
                fetch = state.fetches(),
                "Polled job status"
            );

            match job_state {
                JobState::Failed => {
                    renderer.failure(job_id, &summary)?;
                    return Err(JobError::job_failure(job_id, summary.status));
                }
                terminal if terminal.is_terminal() => {
                    renderer.finish(job_id, &summary)?;
                    info!(
                        job_id,
                        status = %summary.status,
                        wall_ms = state.started.elapsed().as_millis() as u64,
                        "Job finished"
                    );
                    return Ok(summary);
                }
                _ => {}
            }

            if let Some(limit) = options.timeout {
                if state.deadline_reached(limit) {
                    renderer.finish(job_id, &summary)?;
                    warn!(
                        job_id,
                        last_status = state.last().map(|s| s.status.as_str()).unwrap_or(""),
                        waited_ms = state.waited().as_millis() as u64,
                        "Monitoring timed out"
                    );
                    return Err(JobError::timeout(job_id, state.waited().as_secs_f64()));
                }
            }

            let pause = state.next_pause(options.timeout);
            self.sleeper.sleep(pause).await;
            state.advance(&policy, pause);
        }
    }
}
