//! Periodic persistence of the configuration and plugin selection.

use std::sync::Arc;
use std::time::Duration;

use ember_core::{ConfigStore, SelectionStore};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::storage::{ConfigFiles, SaveReport};

/// Saves both stores on a fixed interval and once more on demand.
#[derive(Debug, Clone)]
pub struct ConfigSaver {
    files: Arc<ConfigFiles>,
    config: Arc<ConfigStore>,
    selection: Arc<SelectionStore>,
    interval: Duration,
}

impl ConfigSaver {
    pub fn new(
        files: Arc<ConfigFiles>,
        config: Arc<ConfigStore>,
        selection: Arc<SelectionStore>,
        interval: Duration,
    ) -> Self {
        Self {
            files,
            config,
            selection,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts the periodic task. The first save happens one interval from now.
    ///
    /// The task stops when `shutdown` is cancelled; it does not save on its
    /// way out, the caller runs [`save_now`](Self::save_now) once the other
    /// subsystems have stopped.
    pub fn spawn(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let saver = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + saver.interval, saver.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Config saver stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        saver.save_in_background().await;
                    }
                }
            }
        })
    }

    /// Saves both files on the calling thread.
    pub fn save_now(&self) -> SaveReport {
        self.files.save_all(&self.config, &self.selection)
    }

    async fn save_in_background(&self) {
        let saver = self.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || saver.save_now()).await {
            error!(error = %e, "Config save task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use ember_core::GlobalConfig;
    use tempfile::TempDir;

    use super::*;

    fn saver(dir: &TempDir, interval: Duration) -> (ConfigSaver, Arc<ConfigStore>) {
        let files = Arc::new(ConfigFiles::new(
            dir.path().join("config.json"),
            dir.path().join("plugins.json"),
        ));
        let config = Arc::new(ConfigStore::new(GlobalConfig::default()));
        let selection = Arc::new(SelectionStore::default());
        (ConfigSaver::new(files, config.clone(), selection, interval), config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_save_waits_one_interval() {
        let dir = TempDir::new().unwrap();
        let (saver, _) = saver(&dir, Duration::from_secs(300));
        let token = CancellationToken::new();
        let task = saver.spawn(token.clone());

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(!dir.path().join("config.json").exists());

        // the save runs on the blocking pool, poll until it lands
        tokio::time::sleep(Duration::from_secs(2)).await;
        for _ in 0..100 {
            if dir.path().join("config.json").exists() {
                break;
            }
            tokio::task::yield_now().await;
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(dir.path().join("config.json").exists());
        assert!(dir.path().join("plugins.json").exists());

        token.cancel();
        task.await.unwrap();
    }

    /// Lets the blocking pool finish a save started by the ticker.
    async fn settle(done: impl Fn() -> bool) {
        for _ in 0..100 {
            if done() {
                return;
            }
            tokio::task::yield_now().await;
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_is_retried_next_tick() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        let plugin_path = dir.path().join("plugins.json");
        // a non-empty directory at the target makes the rename fail
        std::fs::create_dir_all(config_path.join("occupied")).unwrap();

        let (saver, config) = saver(&dir, Duration::from_secs(60));
        config.set_prefix(3, "!", "test").unwrap();
        let token = CancellationToken::new();
        let task = saver.spawn(token.clone());

        tokio::time::sleep(Duration::from_secs(61)).await;
        settle(|| plugin_path.exists()).await;
        assert!(plugin_path.exists());
        assert!(config_path.is_dir());

        std::fs::remove_dir_all(&config_path).unwrap();
        config.set_prefix(3, "?", "test").unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle(|| config_path.is_file()).await;
        let text = std::fs::read_to_string(&config_path).unwrap();
        assert!(text.contains("\"prefix\": \"?\""));

        token.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_save_now_writes_current_state() {
        let dir = TempDir::new().unwrap();
        let (saver, config) = saver(&dir, Duration::from_secs(300));
        config.set_prefix(9, "?", "test").unwrap();

        assert!(saver.save_now().is_complete());
        let text = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
        assert!(text.contains("\"prefix\": \"?\""));
    }

    #[tokio::test]
    async fn test_cancel_stops_task() {
        let dir = TempDir::new().unwrap();
        let (saver, _) = saver(&dir, Duration::from_secs(3600));
        let token = CancellationToken::new();
        let task = saver.spawn(token.clone());
        token.cancel();
        task.await.unwrap();
        assert!(!dir.path().join("config.json").exists());
    }
}
