//! Interface to the job scheduler.
//!
//! The scheduler itself is a collaborator: this crate only defines what the
//! plugin registry needs from it. Jobs are identified by a stable *tag*;
//! scheduling a tag that is already scheduled replaces the old schedule, so
//! re-registering never produces two firings.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::SchedulerResult;

/// Callback run on every firing of a job.
pub type JobFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps an async closure as a [`JobFn`].
pub fn job_fn<F, Fut>(f: F) -> JobFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// When a job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSchedule {
    /// Period between firings.
    pub every: Duration,
    /// Fire once right away instead of waiting a full period first.
    pub run_immediately: bool,
}

impl JobSchedule {
    /// Fires every `period`, first after one period has elapsed.
    pub fn every(period: Duration) -> Self {
        Self {
            every: period,
            run_immediately: false,
        }
    }

    /// Also fires once as soon as the job is scheduled.
    pub fn immediately(mut self) -> Self {
        self.run_immediately = true;
        self
    }
}

/// Opaque handle issued by a scheduler for a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(pub u64);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// A scheduler that tracks jobs by tag.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Removes the job scheduled under `tag`.
    ///
    /// Returns [`SchedulerError::NotFound`](crate::SchedulerError::NotFound)
    /// when nothing is scheduled under it.
    async fn remove_by_tag(&self, tag: &str) -> SchedulerResult<()>;

    /// Schedules `run` under `tag`, replacing any job already using the tag.
    async fn schedule_tagged(
        &self,
        tag: &str,
        schedule: JobSchedule,
        run: JobFn,
    ) -> SchedulerResult<JobHandle>;
}

/// Shared scheduler handle.
pub type BoxedScheduler = Arc<dyn Scheduler>;
