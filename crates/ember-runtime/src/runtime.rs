//! Runtime orchestration.
//!
//! [`EmberRuntime`] wires the stores, the registry and a [`Transport`]
//! together and owns the process lifecycle.
//!
//! Startup:
//! 1. Load the configuration file (fatal if missing or corrupt).
//! 2. Load the plugin selection (missing falls back to defaults).
//! 3. Require a non-empty `bot_token`.
//! 4. Open the transport. Every inbound event is handled on its own task.
//! 5. Set the presence.
//! 6. Reload the registry.
//! 7. Start the periodic config saver.
//!
//! Shutdown (Ctrl+C, SIGTERM or a caller-supplied future) reverses this:
//! the saver stops, the transport closes, in-flight handlers finish, the
//! registry and scheduler shut down, and both files are saved a last time.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use ember_core::{ConfigStore, EventSink, InboundEvent, SelectionStore, Transport};
use ember_framework::{Dispatcher, PluginCatalog, PluginDescriptor, Registry};
use tokio::runtime::Handle;
use tokio::signal;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::config::{Settings, SettingsLoader};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::saver::ConfigSaver;
use crate::scheduler::TokioScheduler;
use crate::storage::ConfigFiles;

/// How long shutdown waits for in-flight handlers.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle state of an [`EmberRuntime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// The Ember service.
///
/// ```rust,ignore
/// let runtime = EmberRuntime::builder().build(Arc::new(MyTransport::new()))?;
/// runtime.run().await?;
/// ```
pub struct EmberRuntime {
    settings: Settings,
    files: Arc<ConfigFiles>,
    catalog: PluginCatalog,
    default_plugins: Option<Vec<String>>,
    transport: Arc<dyn Transport>,
    started: AtomicBool,
    state: watch::Sender<RuntimeState>,
}

impl EmberRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> RuntimeState {
        *self.state.borrow()
    }

    /// Watches lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<RuntimeState> {
        self.state.subscribe()
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyStarted);
        }
        self.state.send_replace(RuntimeState::Starting);

        let result = self.serve(shutdown).await;
        if let Err(e) = &result {
            error!(error = %e, "Runtime failed to start");
        }
        self.state.send_replace(RuntimeState::Stopped);
        result
    }

    async fn serve<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        let config = self.files.load_config()?;
        let selection = self.files.load_selection()?;
        if config.bot_token.trim().is_empty() {
            return Err(RuntimeError::MissingCredential);
        }

        let config = Arc::new(ConfigStore::new(config));
        let selection = Arc::new(SelectionStore::new(selection));
        let scheduler = Arc::new(TokioScheduler::new());
        let mut registry = Registry::new(self.catalog.clone(), scheduler.clone(), selection.clone());
        if let Some(names) = &self.default_plugins {
            registry = registry.with_default_plugins(names.iter().cloned());
        }
        let registry = Arc::new(registry);
        let dispatcher = Arc::new(Dispatcher::new(config.clone(), registry.clone()));
        let tracker = TaskTracker::new();

        let sink = event_sink(
            dispatcher,
            Arc::downgrade(&self.transport),
            tracker.clone(),
            Handle::current(),
        );
        let user = self.transport.open(&config.credential(), sink).await?;
        info!(user = %user.tag(), id = user.id, "Connected");

        let presence = config.presence();
        if !presence.is_empty() {
            match presence.render(&user) {
                Ok(rendered) => {
                    if let Err(e) = self.transport.set_presence(&rendered).await {
                        warn!(error = %e, "Failed to set presence");
                    }
                }
                Err(e) => warn!(error = %e, "Configured presence is invalid"),
            }
        }

        registry.reload().await;

        let saver = ConfigSaver::new(
            self.files.clone(),
            config.clone(),
            selection.clone(),
            self.settings.save_interval(),
        );
        let stop_saver = CancellationToken::new();
        let saver_task = saver.spawn(stop_saver.clone());

        self.state.send_replace(RuntimeState::Running);
        info!(tenants = config.tenant_ids().len(), "Ember is running");
        shutdown.await;
        self.state.send_replace(RuntimeState::Stopping);
        info!("Shutting down");

        stop_saver.cancel();
        if let Err(e) = saver_task.await {
            warn!(error = %e, "Config saver task ended abnormally");
        }
        if let Err(e) = self.transport.close().await {
            warn!(error = %e, "Failed to close transport");
        }
        tracker.close();
        if tokio::time::timeout(DRAIN_TIMEOUT, tracker.wait()).await.is_err() {
            warn!(pending = tracker.len(), "Handlers still running at shutdown");
        }
        registry.shutdown().await;
        scheduler.shutdown();

        let report = saver.save_now();
        if !report.is_complete() {
            warn!(?report, "Final save incomplete");
        }
        info!("Shutdown complete");
        Ok(())
    }
}

/// Builds the sink the transport feeds: one tracked task per event.
fn event_sink(
    dispatcher: Arc<Dispatcher>,
    transport: Weak<dyn Transport>,
    tracker: TaskTracker,
    handle: Handle,
) -> EventSink {
    Arc::new(move |event: InboundEvent| {
        let dispatcher = dispatcher.clone();
        let transport = transport.clone();
        tracker.spawn_on(
            async move {
                let outcome = dispatcher.dispatch(&event).await;
                if outcome.replies.is_empty() {
                    return;
                }
                let Some(transport) = transport.upgrade() else {
                    debug!("Transport dropped, discarding replies");
                    return;
                };
                for reply in &outcome.replies {
                    if let Err(e) = transport.send(&event, reply).await {
                        warn!(channel = event.channel, error = %e, "Failed to send reply");
                    }
                }
            },
            &handle,
        );
    })
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Cannot listen for SIGTERM, waiting for Ctrl+C only"),
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for Ctrl+C, shutting down");
    } else {
        info!("Received Ctrl+C");
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`EmberRuntime`].
///
/// ```rust,ignore
/// let runtime = EmberRuntime::builder()
///     .settings_file("ember.toml")
///     .plugin(MY_PLUGIN)
///     .build(transport)?;
/// ```
pub struct RuntimeBuilder {
    loader: SettingsLoader,
    settings: Option<Settings>,
    catalog: PluginCatalog,
    default_plugins: Option<Vec<String>>,
    init_logging: bool,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            loader: SettingsLoader::new(),
            settings: None,
            catalog: PluginCatalog::builtin(),
            default_plugins: None,
            init_logging: true,
        }
    }

    /// Loads settings from this file instead of searching.
    pub fn settings_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    /// Uses these settings as they are; no files or environment are read.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Makes a plugin available for selection.
    pub fn plugin(mut self, desc: PluginDescriptor) -> Self {
        self.catalog = self.catalog.with(desc);
        self
    }

    /// Plugins to install while the selection file lists none.
    ///
    /// Replaces the built-in default (`base`), so include it when wanted.
    pub fn default_plugins<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_plugins = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the whole catalog, built-ins included.
    pub fn catalog(mut self, catalog: PluginCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Leaves subscriber installation to the caller.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    pub fn build(self, transport: Arc<dyn Transport>) -> RuntimeResult<EmberRuntime> {
        let settings = match self.settings {
            Some(settings) => {
                crate::config::validate_settings(&settings)?;
                settings
            }
            None => self.loader.load()?,
        };
        if self.init_logging {
            logging::init_from_config(&settings.logging);
        }

        let files = Arc::new(ConfigFiles::from_settings(&settings.storage));
        debug!(
            config = %files.config_path().display(),
            plugins = %files.plugin_path().display(),
            available = self.catalog.len(),
            "Runtime built"
        );
        Ok(EmberRuntime {
            settings,
            files,
            catalog: self.catalog,
            default_plugins: self.default_plugins,
            transport,
            started: AtomicBool::new(false),
            state: watch::Sender::new(RuntimeState::Created),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;
    use ember_core::{BotUser, RenderedPresence, TransportError, TransportResult};
    use parking_lot::Mutex;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    use super::*;
    use crate::config::StorageSettings;

    #[derive(Default)]
    struct MockTransport {
        sink: Mutex<Option<EventSink>>,
        sent: Mutex<Vec<String>>,
        presence: Mutex<Option<RenderedPresence>>,
        closed: AtomicBool,
    }

    impl MockTransport {
        fn push(&self, event: InboundEvent) {
            let sink = self.sink.lock().clone();
            if let Some(sink) = sink {
                sink(event);
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn open(&self, credential: &str, sink: EventSink) -> TransportResult<BotUser> {
            if credential != "token" {
                return Err(TransportError::ConnectionFailed("bad token".into()));
            }
            *self.sink.lock() = Some(sink);
            Ok(BotUser {
                id: 99,
                username: "ember".into(),
                discriminator: "0".into(),
            })
        }

        async fn send(&self, _: &InboundEvent, text: &str) -> TransportResult<()> {
            self.sent.lock().push(text.to_string());
            Ok(())
        }

        async fn set_presence(&self, presence: &RenderedPresence) -> TransportResult<()> {
            *self.presence.lock() = Some(presence.clone());
            Ok(())
        }

        async fn close(&self) -> TransportResult<()> {
            self.closed.store(true, Ordering::SeqCst);
            *self.sink.lock() = None;
            Ok(())
        }
    }

    fn settings(dir: &Path) -> Settings {
        Settings {
            storage: StorageSettings {
                config_file: dir.join("config.json"),
                plugin_file: dir.join("plugins.json"),
            },
            ..Default::default()
        }
    }

    fn runtime(dir: &Path, transport: Arc<MockTransport>) -> EmberRuntime {
        EmberRuntime::builder()
            .settings(settings(dir))
            .without_logging()
            .build(transport)
            .unwrap()
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_run_answers_and_saves() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"bot_token": "token", "activity_name": "Serving USER_USERNAME", "activity_type": 3}"#,
        )
        .unwrap();
        let transport = Arc::new(MockTransport::default());
        let runtime = Arc::new(runtime(dir.path(), transport.clone()));
        let mut state = runtime.subscribe_state();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = {
            let runtime = runtime.clone();
            tokio::spawn(async move {
                runtime
                    .run_until(async {
                        let _ = stop_rx.await;
                    })
                    .await
            })
        };
        state.wait_for(|s| *s == RuntimeState::Running).await.unwrap();

        let presence = transport.presence.lock().clone().unwrap();
        assert_eq!(presence.name, "Serving ember");

        transport.push(InboundEvent::new(Some(42), 1, 5, ".prefix !"));
        wait_until(|| !transport.sent.lock().is_empty()).await;
        assert_eq!(transport.sent.lock()[0], "Prefix set to `!`");

        stop_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(runtime.state(), RuntimeState::Stopped);
        assert!(transport.closed.load(Ordering::SeqCst));

        let saved = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
        assert!(saved.contains("\"prefix\": \"!\""));
        assert!(dir.path().join("plugins.json").exists());
    }

    fn register_ping(r: &mut ember_framework::PluginRegistrar) -> Result<(), ember_framework::PluginError> {
        r.command(ember_framework::CommandDescriptor::new("ping", |_| async {
            Ok(Some("Pong!".to_string()))
        }));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_default_plugins_install_without_selection_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"bot_token": "token"}"#).unwrap();
        let transport = Arc::new(MockTransport::default());
        let runtime = Arc::new(
            EmberRuntime::builder()
                .settings(settings(dir.path()))
                .without_logging()
                .plugin(PluginDescriptor::new("ping", register_ping))
                .default_plugins(["base", "ping"])
                .build(transport.clone())
                .unwrap(),
        );
        let mut state = runtime.subscribe_state();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = {
            let runtime = runtime.clone();
            tokio::spawn(async move {
                runtime
                    .run_until(async {
                        let _ = stop_rx.await;
                    })
                    .await
            })
        };
        state.wait_for(|s| *s == RuntimeState::Running).await.unwrap();

        transport.push(InboundEvent::new(None, 1, 5, ".ping"));
        wait_until(|| !transport.sent.lock().is_empty()).await;
        assert_eq!(transport.sent.lock()[0], "Pong!");

        stop_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_missing_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        let runtime = runtime(dir.path(), Arc::new(MockTransport::default()));
        let result = runtime.run_until(async {}).await;
        assert!(matches!(result, Err(RuntimeError::Persist(e)) if e.is_missing()));
    }

    #[tokio::test]
    async fn test_empty_credential_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"bot_token": "  "}"#).unwrap();
        let transport = Arc::new(MockTransport::default());
        let runtime = runtime(dir.path(), transport.clone());

        let result = runtime.run_until(async {}).await;
        assert!(matches!(result, Err(RuntimeError::MissingCredential)));
        assert!(transport.sink.lock().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_selection_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"bot_token": "token"}"#).unwrap();
        std::fs::write(dir.path().join("plugins.json"), "{ nope").unwrap();
        let runtime = runtime(dir.path(), Arc::new(MockTransport::default()));

        let result = runtime.run_until(async {}).await;
        assert!(matches!(result, Err(RuntimeError::Persist(_))));
    }

    #[tokio::test]
    async fn test_run_twice_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"bot_token": "token"}"#).unwrap();
        let runtime = runtime(dir.path(), Arc::new(MockTransport::default()));

        assert!(runtime.run_until(async {}).await.is_ok());
        assert!(matches!(
            runtime.run_until(async {}).await,
            Err(RuntimeError::AlreadyStarted)
        ));
    }

    #[test]
    fn test_invalid_explicit_settings_rejected() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(dir.path());
        settings.save_interval_secs = 0;
        let result = EmberRuntime::builder()
            .settings(settings)
            .without_logging()
            .build(Arc::new(MockTransport::default()));
        assert!(matches!(result, Err(RuntimeError::Settings(_))));
    }
}
