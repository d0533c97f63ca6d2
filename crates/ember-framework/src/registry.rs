//! Plugin/job registry and its reload state machine.
//!
//! [`Registry`] owns the active commands, responders and jobs. They live in
//! one immutable [`ActiveSet`] snapshot; readers clone the `Arc` and never
//! wait on a reload in progress.
//!
//! # Reload
//!
//! [`Registry::reload`] runs under a registry-wide async mutex so two
//! reloads never interleave:
//!
//! 1. **Clearing**: every job tag of the current set is removed from the
//!    scheduler. Removal failures are logged and do not stop the phase.
//! 2. **Installing**: each selected plugin registers into its own staging
//!    registrar. A plugin that is unknown, returns an error or panics is
//!    logged and skipped, and nothing it staged is kept. The merged batch
//!    then replaces the live set in one swap.
//! 3. **Scheduling**: each job of the new set is scheduled under its tag,
//!    unless its condition is false.
//!
//! ```rust,ignore
//! let registry = Arc::new(Registry::new(PluginCatalog::builtin(), scheduler, selection));
//! let report = registry.reload().await;
//! assert!(report.failed.is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use ember_core::{BoxedScheduler, JobHandle, SchedulerError, SelectionStore};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::command::CommandDescriptor;
use crate::error::PluginError;
use crate::job::JobDescriptor;
use crate::plugin::{DEFAULT_PLUGINS, PluginCatalog, PluginDescriptor, PluginRegistrar};
use crate::responder::ResponderDescriptor;

// =============================================================================
// Reload bookkeeping
// =============================================================================

/// Where the registry is in the reload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadPhase {
    #[default]
    Idle,
    Clearing,
    Installing,
    Scheduling,
}

impl fmt::Display for ReloadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Clearing => "clearing",
            Self::Installing => "installing",
            Self::Scheduling => "scheduling",
        };
        f.write_str(s)
    }
}

/// Summary of one reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Plugins installed, in selection order.
    pub loaded: Vec<String>,
    /// Plugins that were unknown or failed to register.
    pub failed: Vec<String>,
    /// Active commands after the swap.
    pub commands: usize,
    /// Active responders after the swap.
    pub responders: usize,
    /// Jobs handed to the scheduler successfully.
    pub scheduled: usize,
    /// Jobs left unscheduled because their condition was false.
    pub skipped: usize,
}

/// The live collections, replaced wholesale on every reload.
#[derive(Debug, Default)]
pub struct ActiveSet {
    plugins: Vec<PluginDescriptor>,
    commands: Vec<CommandDescriptor>,
    responders: Vec<ResponderDescriptor>,
    jobs: Vec<JobDescriptor>,
}

impl ActiveSet {
    pub fn commands(&self) -> &[CommandDescriptor] {
        &self.commands
    }

    pub fn responders(&self) -> &[ResponderDescriptor] {
        &self.responders
    }

    pub fn jobs(&self) -> &[JobDescriptor] {
        &self.jobs
    }

    /// Finds a command by name or alias.
    pub fn find_command(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.iter().find(|c| c.matches(name))
    }

    fn merge(&mut self, plugin: PluginDescriptor, staged: PluginRegistrar) {
        for cmd in staged.commands {
            if let Some(existing) = self.commands.iter().find(|c| c.name() == cmd.name()) {
                warn!(
                    plugin = plugin.name,
                    command = %existing.name(),
                    "Command already registered, keeping the first"
                );
                continue;
            }
            self.commands.push(cmd);
        }
        self.responders.extend(staged.responders);
        for job in staged.jobs {
            if let Some(pos) = self.jobs.iter().position(|j| j.tag() == job.tag()) {
                warn!(plugin = plugin.name, tag = %job.tag(), "Job tag declared twice, keeping the later");
                self.jobs.remove(pos);
            }
            self.jobs.push(job);
        }
        self.plugins.push(plugin);
    }
}

/// Resets the phase to `Idle` however the reload exits.
struct PhaseGuard<'a>(&'a Mutex<ReloadPhase>);

impl<'a> PhaseGuard<'a> {
    fn enter(cell: &'a Mutex<ReloadPhase>, phase: ReloadPhase) -> Self {
        *cell.lock() = phase;
        Self(cell)
    }

    fn advance(&self, phase: ReloadPhase) {
        *self.0.lock() = phase;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock() = ReloadPhase::Idle;
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Owns the active commands, responders and jobs.
pub struct Registry {
    catalog: PluginCatalog,
    scheduler: BoxedScheduler,
    selection: Arc<SelectionStore>,
    defaults: Vec<String>,
    reload_section: tokio::sync::Mutex<()>,
    phase: Mutex<ReloadPhase>,
    active: RwLock<Arc<ActiveSet>>,
    handles: Mutex<HashMap<String, JobHandle>>,
}

impl Registry {
    /// Creates an empty registry. Nothing is active until the first reload.
    pub fn new(catalog: PluginCatalog, scheduler: BoxedScheduler, selection: Arc<SelectionStore>) -> Self {
        Self {
            catalog,
            scheduler,
            selection,
            defaults: DEFAULT_PLUGINS.iter().map(|s| s.to_string()).collect(),
            reload_section: tokio::sync::Mutex::new(()),
            phase: Mutex::new(ReloadPhase::Idle),
            active: RwLock::new(Arc::new(ActiveSet::default())),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the plugins installed when the selection is empty.
    pub fn with_default_plugins<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defaults = names.into_iter().map(Into::into).collect();
        self
    }

    /// Plugins installed when the selection is empty.
    pub fn default_plugins(&self) -> &[String] {
        &self.defaults
    }

    /// Current reload phase.
    pub fn phase(&self) -> ReloadPhase {
        *self.phase.lock()
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Arc<SelectionStore> {
        &self.selection
    }

    /// Returns the current live set.
    pub fn snapshot(&self) -> Arc<ActiveSet> {
        self.active.read().clone()
    }

    pub fn find_command(&self, name: &str) -> Option<CommandDescriptor> {
        self.snapshot().find_command(name).cloned()
    }

    pub fn commands(&self) -> Vec<CommandDescriptor> {
        self.snapshot().commands.clone()
    }

    pub fn responders(&self) -> Vec<ResponderDescriptor> {
        self.snapshot().responders.clone()
    }

    /// Tags of every declared job, scheduled or skipped.
    pub fn job_tags(&self) -> Vec<String> {
        self.snapshot().jobs.iter().map(|j| j.tag().to_string()).collect()
    }

    /// Scheduler handle for a scheduled job.
    pub fn job_handle(&self, tag: &str) -> Option<JobHandle> {
        self.handles.lock().get(tag).copied()
    }

    pub fn loaded_plugins(&self) -> Vec<String> {
        self.snapshot().plugins.iter().map(|p| p.name.to_string()).collect()
    }

    /// Clears and re-installs every selected plugin.
    pub async fn reload(&self) -> ReloadReport {
        let _section = self.reload_section.lock().await;
        let started = Instant::now();
        let phase = PhaseGuard::enter(&self.phase, ReloadPhase::Clearing);

        let previous = self.snapshot();
        self.remove_jobs(&previous.jobs).await;

        phase.advance(ReloadPhase::Installing);
        let mut report = ReloadReport::default();
        let next = Arc::new(self.install(&mut report));
        *self.active.write() = next.clone();
        report.commands = next.commands.len();
        report.responders = next.responders.len();

        phase.advance(ReloadPhase::Scheduling);
        for job in &next.jobs {
            if !job.should_schedule() {
                debug!(tag = %job.tag(), "Job condition is false, not scheduling");
                report.skipped += 1;
                continue;
            }
            match self
                .scheduler
                .schedule_tagged(job.tag(), job.schedule(), job.run_fn())
                .await
            {
                Ok(handle) => {
                    self.handles.lock().insert(job.tag().to_string(), handle);
                    report.scheduled += 1;
                }
                Err(e) => error!(tag = %job.tag(), error = %e, "Failed to schedule job"),
            }
        }

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            commands = report.commands,
            responders = report.responders,
            scheduled = report.scheduled,
            skipped = report.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Plugins reloaded"
        );
        report
    }

    /// Removes every job, empties the live set and runs shutdown hooks.
    pub async fn shutdown(&self) {
        let _section = self.reload_section.lock().await;
        let phase = PhaseGuard::enter(&self.phase, ReloadPhase::Clearing);

        let previous = std::mem::take(&mut *self.active.write());
        self.remove_jobs(&previous.jobs).await;
        drop(phase);

        for plugin in &previous.plugins {
            if let Some(hook) = plugin.on_shutdown
                && catch_unwind(hook).is_err()
            {
                error!(plugin = plugin.name, "Shutdown hook panicked");
            }
        }
        info!(plugins = previous.plugins.len(), "Registry shut down");
    }

    async fn remove_jobs(&self, jobs: &[JobDescriptor]) {
        for job in jobs {
            match self.scheduler.remove_by_tag(job.tag()).await {
                Ok(()) => {}
                Err(SchedulerError::NotFound(tag)) => debug!(tag = %tag, "Job was not scheduled"),
                Err(e) => warn!(tag = %job.tag(), error = %e, "Failed to remove job"),
            }
        }
        self.handles.lock().clear();
    }

    fn install(&self, report: &mut ReloadReport) -> ActiveSet {
        let mut names = self.selection.active_plugin_names();
        if names.is_empty() {
            names = self.defaults.clone();
        }

        let mut set = ActiveSet::default();
        for name in names {
            match self.register_one(&name) {
                Ok((plugin, staged)) => {
                    let (commands, responders, jobs) = staged.counts();
                    debug!(plugin = %name, commands, responders, jobs, "Plugin registered");
                    set.merge(plugin, staged);
                    report.loaded.push(name);
                }
                Err(e) => {
                    error!(plugin = %name, error = %e, "Plugin skipped");
                    report.failed.push(name);
                }
            }
        }
        set
    }

    fn register_one(&self, name: &str) -> Result<(PluginDescriptor, PluginRegistrar), PluginError> {
        let plugin = *self
            .catalog
            .get(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        let mut staged = PluginRegistrar::new(plugin.name);
        match catch_unwind(AssertUnwindSafe(|| (plugin.register)(&mut staged))) {
            Ok(Ok(())) => Ok((plugin, staged)),
            Ok(Err(e)) => Err(e),
            Err(payload) => Err(PluginError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("catalog", &self.catalog)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
