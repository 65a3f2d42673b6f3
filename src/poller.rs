//! Job poller for long-running generation requests.
//!
//! Turns a started job into a synchronous-looking result: status is queried
//! at a fixed interval until the job succeeds, fails, or the wait budget runs
//! out. Nothing is retried and nothing is persisted; abandoning the wait does
//! not cancel the remote job.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::client::{
    ArtifactRef, ClientResult, JobHandle, JobStatus, JobStatusReport, NotebookClient, PollSchedule,
};
use crate::error::NotebookError;

const MISSING_DIAGNOSTIC: &str = "remote service reported failure without a diagnostic";

/// Time source for the poller; swapped for a manual clock in tests.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Anything that can report the status of a job.
#[async_trait]
pub trait StatusQuery: Send + Sync {
    async fn poll_status(&self, handle: &JobHandle) -> ClientResult<JobStatusReport>;
}

#[async_trait]
impl<T> StatusQuery for T
where
    T: NotebookClient + Send + Sync + ?Sized,
{
    async fn poll_status(&self, handle: &JobHandle) -> ClientResult<JobStatusReport> {
        self.job_status(handle).await
    }
}

/// Poll states. `Succeeded`, `Failed` and `TimedOut` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Pending,
    Running,
    Succeeded(ArtifactRef),
    Failed(String),
    TimedOut,
}

/// Pure transition from the latest remote status and elapsed time.
pub fn next_state(
    handle: &JobHandle,
    report: JobStatusReport,
    elapsed: Duration,
    max_wait: Duration,
) -> PollState {
    match report.status {
        JobStatus::Succeeded => PollState::Succeeded(report.artifact.unwrap_or_else(|| {
            ArtifactRef {
                id: handle.task_id.clone(),
                kind: handle.kind,
                title: None,
                content: None,
            }
        })),
        JobStatus::Failed => PollState::Failed(
            report
                .message
                .unwrap_or_else(|| MISSING_DIAGNOSTIC.to_string()),
        ),
        _ if elapsed >= max_wait => PollState::TimedOut,
        JobStatus::Pending => PollState::Pending,
        JobStatus::Running => PollState::Running,
    }
}

#[derive(Clone)]
pub struct JobPoller {
    clock: Arc<dyn Clock>,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self::new(Arc::new(TokioClock))
    }
}

impl JobPoller {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Wait for `handle` to reach a terminal state.
    ///
    /// A failed status query aborts the wait with the query's own error; it
    /// is never reported as a timeout or a job failure.
    pub async fn wait<Q>(
        &self,
        source: &Q,
        handle: &JobHandle,
        schedule: PollSchedule,
    ) -> Result<ArtifactRef, NotebookError>
    where
        Q: StatusQuery + ?Sized,
    {
        let started = self.clock.now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let report = source.poll_status(handle).await?;
            let elapsed = self.clock.now().saturating_duration_since(started);
            let state = next_state(handle, report, elapsed, schedule.max_wait);

            log::debug!(
                "job {} ({}) poll #{} after {:?}: {:?}",
                handle.task_id,
                handle.kind,
                attempt,
                elapsed,
                state
            );

            match state {
                PollState::Succeeded(artifact) => {
                    log::info!(
                        "job {} ({}) succeeded after {} polls",
                        handle.task_id,
                        handle.kind,
                        attempt
                    );
                    return Ok(artifact);
                }
                PollState::Failed(message) => {
                    log::warn!("job {} ({}) failed: {}", handle.task_id, handle.kind, message);
                    return Err(NotebookError::RemoteJobFailed {
                        task_id: handle.task_id.clone(),
                        message,
                    });
                }
                PollState::TimedOut => {
                    log::warn!(
                        "job {} ({}) still running after {:?}; giving up",
                        handle.task_id,
                        handle.kind,
                        elapsed
                    );
                    return Err(NotebookError::PollTimeout {
                        task_id: handle.task_id.clone(),
                        waited: elapsed,
                    });
                }
                PollState::Pending | PollState::Running => {
                    let remaining = schedule.max_wait.saturating_sub(elapsed);
                    self.clock.sleep(schedule.interval.min(remaining)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ArtifactKind;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Clock that only moves when the poller sleeps.
    struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        fn elapsed(&self) -> Duration {
            *self.offset.lock()
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock()
        }

        async fn sleep(&self, duration: Duration) {
            *self.offset.lock() += duration;
        }
    }

    /// Replays a fixed status script; repeats `pending` once exhausted.
    struct Script {
        steps: Mutex<VecDeque<ClientResult<JobStatusReport>>>,
        calls: AtomicUsize,
    }

    impl Script {
        fn new(steps: Vec<ClientResult<JobStatusReport>>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusQuery for Script {
        async fn poll_status(&self, _handle: &JobHandle) -> ClientResult<JobStatusReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.steps
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(JobStatusReport::pending()))
        }
    }

    fn handle() -> JobHandle {
        JobHandle {
            notebook_id: "nb-1".into(),
            task_id: "task-1".into(),
            kind: ArtifactKind::Audio,
        }
    }

    fn artifact() -> ArtifactRef {
        ArtifactRef {
            id: "art-1".into(),
            kind: ArtifactKind::Audio,
            title: Some("Overview".into()),
            content: None,
        }
    }

    fn poller() -> (JobPoller, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (JobPoller::new(clock.clone()), clock)
    }

    fn schedule(interval: u64, max_wait: u64) -> PollSchedule {
        PollSchedule::new(Duration::from_secs(interval), Duration::from_secs(max_wait))
    }

    #[tokio::test]
    async fn test_returns_artifact_on_third_query() {
        let (poller, clock) = poller();
        let script = Script::new(vec![
            Ok(JobStatusReport::pending()),
            Ok(JobStatusReport::pending()),
            Ok(JobStatusReport::succeeded(artifact())),
        ]);

        let result = poller.wait(&script, &handle(), schedule(10, 600)).await;

        assert_eq!(result.unwrap(), artifact());
        assert_eq!(script.calls(), 3);
        assert!(clock.elapsed() <= Duration::from_secs(600));
        assert_eq!(clock.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_times_out_and_stops_querying() {
        let (poller, clock) = poller();
        let script = Script::new(vec![]);

        let err = poller
            .wait(&script, &handle(), schedule(1, 5))
            .await
            .unwrap_err();

        match err {
            NotebookError::PollTimeout { task_id, waited } => {
                assert_eq!(task_id, "task-1");
                assert_eq!(waited, Duration::from_secs(5));
            }
            other => panic!("expected PollTimeout, got {other:?}"),
        }
        // t = 0, 1, 2, 3, 4, 5
        assert_eq!(script.calls(), 6);
        assert_eq!(clock.elapsed(), Duration::from_secs(5));

        tokio::task::yield_now().await;
        assert_eq!(script.calls(), 6);
    }

    #[tokio::test]
    async fn test_last_sleep_is_clipped_to_budget() {
        let (poller, clock) = poller();
        let script = Script::new(vec![Ok(JobStatusReport::running())]);

        let err = poller
            .wait(&script, &handle(), schedule(10, 15))
            .await
            .unwrap_err();

        assert!(matches!(err, NotebookError::PollTimeout { .. }));
        assert_eq!(script.calls(), 3);
        assert_eq!(clock.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_failed_job_keeps_remote_diagnostic() {
        let (poller, _clock) = poller();
        let diagnostic = "Audio overview limit reached for today (code 8)";
        let script = Script::new(vec![
            Ok(JobStatusReport::running()),
            Ok(JobStatusReport::failed(diagnostic)),
        ]);

        let err = poller
            .wait(&script, &handle(), schedule(10, 600))
            .await
            .unwrap_err();

        match err {
            NotebookError::RemoteJobFailed { task_id, message } => {
                assert_eq!(task_id, "task-1");
                assert_eq!(message, diagnostic);
            }
            other => panic!("expected RemoteJobFailed, got {other:?}"),
        }
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_propagates_immediately() {
        let (poller, clock) = poller();
        let script = Script::new(vec![
            Ok(JobStatusReport::pending()),
            Err(NotebookError::TransportError("connection reset".into())),
            Ok(JobStatusReport::succeeded(artifact())),
        ]);

        let err = poller
            .wait(&script, &handle(), schedule(5, 10))
            .await
            .unwrap_err();

        assert!(matches!(err, NotebookError::TransportError(ref m) if m == "connection reset"));
        assert_eq!(script.calls(), 2);
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn test_next_state_transitions() {
        let h = handle();
        let budget = Duration::from_secs(60);

        assert_eq!(
            next_state(&h, JobStatusReport::pending(), Duration::from_secs(1), budget),
            PollState::Pending
        );
        assert_eq!(
            next_state(&h, JobStatusReport::running(), Duration::from_secs(1), budget),
            PollState::Running
        );
        assert_eq!(
            next_state(&h, JobStatusReport::running(), budget, budget),
            PollState::TimedOut
        );
        // A terminal status wins over an exhausted budget.
        assert_eq!(
            next_state(&h, JobStatusReport::succeeded(artifact()), budget * 2, budget),
            PollState::Succeeded(artifact())
        );
    }

    #[test]
    fn test_success_without_artifact_falls_back_to_task() {
        let report = JobStatusReport {
            status: JobStatus::Succeeded,
            message: None,
            artifact: None,
        };
        let state = next_state(&handle(), report, Duration::ZERO, Duration::from_secs(1));
        match state {
            PollState::Succeeded(artifact) => {
                assert_eq!(artifact.id, "task-1");
                assert_eq!(artifact.kind, ArtifactKind::Audio);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_failure_without_message_gets_placeholder() {
        let report = JobStatusReport {
            status: JobStatus::Failed,
            message: None,
            artifact: None,
        };
        assert_eq!(
            next_state(&handle(), report, Duration::ZERO, Duration::from_secs(1)),
            PollState::Failed(MISSING_DIAGNOSTIC.to_string())
        );
    }
}
