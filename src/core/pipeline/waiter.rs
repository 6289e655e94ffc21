//! Polls an analysis task until it finishes or the wait budget runs out.

use std::time::Duration;

use tokio::time::{interval_at, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::TaskStatusSource;
use crate::core::config::QualityGateSettings;
use crate::core::errors::{Result, SonarGateError};
use crate::core::model::{AnalysisTaskRef, TaskDetails, TaskStatus};

/// Fixed-interval poller with a hard deadline.
///
/// The first poll happens one interval after the wait starts. The deadline
/// bounds the whole wait, including a request that is still in flight when
/// it passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskWaiter {
    poll_interval: Duration,
    timeout: Duration,
}

impl Default for TaskWaiter {
    fn default() -> Self {
        Self::from_settings(&QualityGateSettings::default())
    }
}

/// Shortest accepted poll interval; tokio intervals reject a zero period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

impl TaskWaiter {
    /// Waiter with explicit timings. Intervals below [`MIN_POLL_INTERVAL`]
    /// are raised to it.
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            timeout,
        }
    }

    /// Waiter using the configured gate timings
    pub fn from_settings(settings: &QualityGateSettings) -> Self {
        Self::new(settings.poll_interval(), settings.timeout())
    }

    /// Delay between polls
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait budget
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll until the task reaches SUCCESS or ERROR.
    ///
    /// SUCCESS returns the task details. ERROR is [`SonarGateError::GateFailed`].
    /// Running out of time is [`SonarGateError::GateTimeout`]. Any error from the
    /// status source ends the wait immediately.
    pub async fn wait_for_completion<S>(
        &self,
        source: &S,
        task: &AnalysisTaskRef,
    ) -> Result<TaskDetails>
    where
        S: TaskStatusSource + ?Sized,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut ticker = interval_at(started + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_status: Option<TaskStatus> = None;
        let mut polls: u32 = 0;

        info!(
            task = task.id(),
            interval_ms = self.poll_interval.as_millis() as u64,
            timeout_secs = self.timeout.as_secs(),
            "Waiting for analysis task"
        );

        let poll_loop = async {
            loop {
                ticker.tick().await;
                polls += 1;

                let details = source.task_status(task).await?;
                if last_status != Some(details.status) {
                    debug!(
                        task = task.id(),
                        poll = polls,
                        from = last_status.map(TaskStatus::as_str).unwrap_or("NONE"),
                        to = details.status.as_str(),
                        "Task status changed"
                    );
                    if details.status == TaskStatus::Canceled {
                        warn!(task = task.id(), "Task reported CANCELED; still waiting");
                    }
                }
                last_status = Some(details.status);

                match details.status {
                    TaskStatus::Success => return Ok(details),
                    TaskStatus::Error => {
                        return Err(SonarGateError::GateFailed {
                            task_id: task.id().to_string(),
                            status: details.status.to_string(),
                        })
                    }
                    _ => {}
                }
            }
        };

        let outcome = timeout_at(deadline, poll_loop).await;
        match outcome {
            Ok(result) => {
                if result.is_ok() {
                    info!(task = task.id(), polls, "Analysis task completed");
                }
                result
            }
            Err(_) => {
                warn!(task = task.id(), polls, "Gave up waiting for analysis task");
                Err(SonarGateError::GateTimeout {
                    task_id: task.id().to_string(),
                    waited: self.timeout,
                    last_status: last_status.map(|s| s.to_string()),
                })
            }
        }
    }
}
