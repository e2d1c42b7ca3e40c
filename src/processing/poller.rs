//! Job status poller: `Idle -> Polling -> Terminal`.
//!
//! The poller owns at most one timer. The timer only produces ticks; each
//! tick that [`JobPoller::tick`] accepts must be answered with exactly one
//! [`JobPoller::on_status`] or [`JobPoller::on_poll_error`] call, passing
//! back the session number the tick returned. Replies carrying an older
//! session number are dropped.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::api::{ProcessingJob, RefreshStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A repeating timer that can be stopped. Cancelling twice must be harmless.
pub trait PollTimer {
    fn cancel(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollerState {
    #[default]
    Idle,
    Polling,
    Terminal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Job still active; keep the timer running.
    Continue(ProcessingJob),
    /// No active job or a terminal status; the timer has been stopped.
    Finished {
        job: Option<ProcessingJob>,
        refresh_stats: bool,
        message: String,
    },
    /// Report arrived while not polling, or belongs to an earlier session.
    Ignored,
}

#[derive(Debug)]
pub struct JobPoller<T: PollTimer> {
    state: PollerState,
    timer: Option<T>,
    in_flight: bool,
    generation: u64,
    job_id: Option<String>,
    job: Option<ProcessingJob>,
    message: String,
}

impl<T: PollTimer> Default for JobPoller<T> {
    fn default() -> Self {
        Self {
            state: PollerState::Idle,
            timer: None,
            in_flight: false,
            generation: 0,
            job_id: None,
            job: None,
            message: String::new(),
        }
    }
}

impl<T: PollTimer> JobPoller<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn job(&self) -> Option<&ProcessingJob> {
        self.job.as_ref()
    }

    /// Id of the job this session watches: the id the start call returned,
    /// then whatever the server reports.
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// A cancel needs a job id to target.
    pub fn can_cancel(&self) -> bool {
        self.state == PollerState::Polling && self.job_id.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Installs `timer` in place of any existing one and opens a new
    /// session in `Polling`, forgetting the previous job. `job_id` is the
    /// job just started, if known. Returns the session number for the
    /// immediate first poll.
    pub fn start(&mut self, timer: T, job_id: Option<String>) -> Option<u64> {
        self.stop_timer();
        self.timer = Some(timer);
        self.generation += 1;
        self.state = PollerState::Polling;
        self.in_flight = false;
        self.job = None;
        self.job_id = job_id;
        self.message = "Waiting for job status...".into();
        self.tick()
    }

    /// Timer tick. Returns the session number to tag a status request with,
    /// or `None` when no request should go out. Ticks are dropped while a
    /// previous request is still outstanding.
    pub fn tick(&mut self) -> Option<u64> {
        if self.state != PollerState::Polling || self.in_flight {
            return None;
        }
        self.in_flight = true;
        Some(self.generation)
    }

    pub fn on_status(&mut self, generation: u64, report: RefreshStatus) -> PollOutcome {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping stale status reply");
            return PollOutcome::Ignored;
        }
        self.in_flight = false;
        if self.state != PollerState::Polling {
            return PollOutcome::Ignored;
        }

        match report.job {
            Some(job) if job.status.is_active() => {
                self.message = job
                    .message
                    .clone()
                    .or(report.message)
                    .unwrap_or_else(|| {
                        format!(
                            "Processing: {}/{} ({:.0}%)",
                            job.progress.processed, job.progress.total, job.progress.percentage
                        )
                    });
                debug!(job_id = %job.id, status = ?job.status, "job still active");
                self.job_id = Some(job.id.clone());
                self.job = Some(job.clone());
                PollOutcome::Continue(job)
            }
            Some(job) => {
                let refresh_stats = job.status == crate::api::JobStatus::Completed;
                let message = job
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Job {}", status_word(&job)));
                self.finish(message.clone());
                info!(job_id = %job.id, status = ?job.status, "job reached terminal status");
                self.job_id = Some(job.id.clone());
                self.job = Some(job.clone());
                PollOutcome::Finished {
                    job: Some(job),
                    refresh_stats,
                    message,
                }
            }
            None => {
                let message = report
                    .message
                    .unwrap_or_else(|| "No active job".to_string());
                self.finish(message.clone());
                PollOutcome::Finished {
                    job: None,
                    refresh_stats: false,
                    message,
                }
            }
        }
    }

    /// A status request failed; polling continues on the next tick.
    pub fn on_poll_error(&mut self, generation: u64, message: &str) {
        if generation != self.generation {
            return;
        }
        self.in_flight = false;
        if self.state == PollerState::Polling {
            self.message = format!("Status check failed: {message}");
        }
    }

    /// The user's cancel request finished. The session it was sent for
    /// stops whatever the outcome; only the message differs. Returns `None`
    /// when a newer session has started since.
    pub fn cancel_finished(
        &mut self,
        generation: u64,
        result: Result<(), String>,
    ) -> Option<String> {
        if generation != self.generation {
            return None;
        }
        let message = match result {
            Ok(()) => "Job cancelled".to_string(),
            Err(err) => format!("Cancel request failed: {err}"),
        };
        self.finish(message.clone());
        Some(message)
    }

    fn finish(&mut self, message: String) {
        self.stop_timer();
        self.state = PollerState::Terminal;
        self.message = message;
    }

    /// Idempotent.
    pub fn stop_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

fn status_word(job: &ProcessingJob) -> &'static str {
    use crate::api::JobStatus::*;
    match job.status {
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        Pending | Running | Processing => "active",
    }
}

/// Tokio-backed [`PollTimer`]: calls `on_tick` every `period`, first after
/// one full period. The task is aborted on cancel or drop.
#[derive(Debug)]
pub struct IntervalTimer {
    handle: Option<AbortHandle>,
}

impl IntervalTimer {
    pub fn spawn<F>(runtime: &Handle, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let task = runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                on_tick();
            }
        });
        Self {
            handle: Some(task.abort_handle()),
        }
    }
}

impl PollTimer for IntervalTimer {
    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
