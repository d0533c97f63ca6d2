//! Collects what a plugin contributes during registration.

use crate::command::CommandDescriptor;
use crate::job::JobDescriptor;
use crate::responder::ResponderDescriptor;

/// Staging area handed to a plugin's registration callback.
///
/// The registry gives every plugin its own registrar and only merges the
/// contents into the live set when the callback returns `Ok`.
#[derive(Debug)]
pub struct PluginRegistrar {
    plugin: &'static str,
    pub(crate) commands: Vec<CommandDescriptor>,
    pub(crate) responders: Vec<ResponderDescriptor>,
    pub(crate) jobs: Vec<JobDescriptor>,
}

impl PluginRegistrar {
    pub fn new(plugin: &'static str) -> Self {
        Self {
            plugin,
            commands: Vec::new(),
            responders: Vec::new(),
            jobs: Vec::new(),
        }
    }

    /// Name of the plugin being registered.
    pub fn plugin(&self) -> &'static str {
        self.plugin
    }

    pub fn command(&mut self, command: CommandDescriptor) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn responder(&mut self, responder: ResponderDescriptor) -> &mut Self {
        self.responders.push(responder);
        self
    }

    pub fn job(&mut self, job: JobDescriptor) -> &mut Self {
        self.jobs.push(job);
        self
    }

    /// Returns `(commands, responders, jobs)` counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.commands.len(), self.responders.len(), self.jobs.len())
    }
}
