//! Tag-addressed job scheduler backed by tokio tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ember_core::{JobFn, JobHandle, JobSchedule, Scheduler, SchedulerError, SchedulerResult};
use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

struct ScheduledJob {
    handle: JobHandle,
    token: CancellationToken,
}

/// Runs each job in its own tokio task, one task per tag.
///
/// Scheduling a tag that is already in use cancels the old task first, so
/// a tag never fires twice per period.
pub struct TokioScheduler {
    jobs: Mutex<HashMap<String, ScheduledJob>>,
    next_id: AtomicU64,
    root: CancellationToken,
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            root: CancellationToken::new(),
        }
    }

    pub fn is_scheduled(&self, tag: &str) -> bool {
        self.jobs.lock().contains_key(tag)
    }

    /// Number of scheduled jobs.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Cancels every job. Later scheduling attempts fail with
    /// [`SchedulerError::ShutDown`].
    pub fn shutdown(&self) {
        self.root.cancel();
        let cancelled = self.jobs.lock().drain().count();
        debug!(jobs = cancelled, "Scheduler shut down");
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn remove_by_tag(&self, tag: &str) -> SchedulerResult<()> {
        let job = self
            .jobs
            .lock()
            .remove(tag)
            .ok_or_else(|| SchedulerError::NotFound(tag.to_string()))?;
        job.token.cancel();
        debug!(tag, handle = %job.handle, "Job removed");
        Ok(())
    }

    async fn schedule_tagged(&self, tag: &str, schedule: JobSchedule, run: JobFn) -> SchedulerResult<JobHandle> {
        if self.root.is_cancelled() {
            return Err(SchedulerError::ShutDown);
        }
        if schedule.every.is_zero() {
            return Err(SchedulerError::rejected(tag, "period must be greater than zero"));
        }

        let handle = JobHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = self.root.child_token();
        let start = if schedule.run_immediately {
            Instant::now()
        } else {
            Instant::now() + schedule.every
        };

        let task_token = token.clone();
        let task_tag = tag.to_string();
        tokio::spawn(async move {
            let mut ticker = interval_at(start, schedule.every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        trace!(tag = %task_tag, "Job firing");
                        run().await;
                    }
                }
            }
        });

        let previous = self
            .jobs
            .lock()
            .insert(tag.to_string(), ScheduledJob { handle, token });
        if let Some(old) = previous {
            old.token.cancel();
            debug!(tag, old = %old.handle, new = %handle, "Job rescheduled");
        } else {
            debug!(tag, %handle, every_ms = schedule.every.as_millis() as u64, "Job scheduled");
        }
        Ok(handle)
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use ember_core::job_fn;
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    fn counting(counter: &Arc<AtomicUsize>) -> JobFn {
        let counter = counter.clone();
        job_fn(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    fn every(secs: u64) -> JobSchedule {
        JobSchedule::every(Duration::from_secs(secs))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_every_period() {
        let scheduler = TokioScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        assert_ok!(scheduler.schedule_tagged("tick", every(10), counting(&hits)).await);

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_immediately() {
        let scheduler = TokioScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        scheduler
            .schedule_tagged("now", every(10).immediately(), counting(&hits))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_tag_never_doubles() {
        let scheduler = TokioScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let first = scheduler.schedule_tagged("t", every(10), counting(&hits)).await.unwrap();
        let second = scheduler.schedule_tagged("t", every(10), counting(&hits)).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(scheduler.len(), 1);

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_stops_firing() {
        let scheduler = TokioScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_tagged("t", every(10), counting(&hits)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_ok!(scheduler.remove_by_tag("t").await);
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(matches!(
            scheduler.remove_by_tag("t").await,
            Err(SchedulerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_period_rejected() {
        let scheduler = TokioScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let result = scheduler
            .schedule_tagged("z", JobSchedule::every(Duration::ZERO), counting(&hits))
            .await;
        assert!(matches!(result, Err(SchedulerError::Rejected { .. })));
        assert!(!scheduler.is_scheduled("z"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_everything() {
        let scheduler = TokioScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_tagged("a", every(10), counting(&hits)).await.unwrap();
        scheduler.schedule_tagged("b", every(10), counting(&hits)).await.unwrap();

        scheduler.shutdown();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_empty());
        assert_err!(scheduler.schedule_tagged("c", every(10), counting(&hits)).await);
    }
}
