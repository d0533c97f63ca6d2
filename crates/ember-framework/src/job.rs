//! Scheduled job descriptors.

use std::fmt;

use ember_core::{JobFn, JobSchedule, job_fn};

/// A job declared by a plugin during registration.
///
/// The registry schedules it under `tag` once installation finishes,
/// unless the job carries a condition that evaluated to `false`.
#[derive(Clone)]
pub struct JobDescriptor {
    tag: String,
    schedule: JobSchedule,
    condition: Option<bool>,
    run: JobFn,
}

impl JobDescriptor {
    /// Creates an unconditional job.
    pub fn new<F, Fut>(tag: impl Into<String>, schedule: JobSchedule, run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            tag: tag.into(),
            schedule,
            condition: None,
            run: job_fn(run),
        }
    }

    /// Only schedule the job if `condition` holds at reload time.
    pub fn when(mut self, condition: bool) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn schedule(&self) -> JobSchedule {
        self.schedule
    }

    pub fn condition(&self) -> Option<bool> {
        self.condition
    }

    /// Returns `false` for a conditional job whose condition is false.
    pub fn should_schedule(&self) -> bool {
        self.condition.unwrap_or(true)
    }

    pub fn run_fn(&self) -> JobFn {
        self.run.clone()
    }
}

impl fmt::Debug for JobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDescriptor")
            .field("tag", &self.tag)
            .field("schedule", &self.schedule)
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}
