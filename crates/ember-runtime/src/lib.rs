//! # Ember Runtime
//!
//! Runs the Ember bot service on tokio.
//!
//! This crate provides:
//! - Runtime settings loaded with figment ([`config`])
//! - Logging setup ([`logging`])
//! - Atomic persistence of the configuration and plugin selection
//!   ([`ConfigFiles`]) and the periodic [`ConfigSaver`]
//! - A tag-addressed job scheduler ([`TokioScheduler`])
//! - The process lifecycle ([`EmberRuntime`])
//!
//! ```ignore
//! use std::sync::Arc;
//! use ember_runtime::EmberRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ember_runtime::RuntimeError> {
//!     let runtime = EmberRuntime::builder().build(Arc::new(MyTransport::new()))?;
//!     runtime.run().await
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod saver;
pub mod scheduler;
pub mod storage;

pub use config::{Settings, SettingsError, SettingsLoader, SettingsResult};
pub use error::{PersistError, RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{EmberRuntime, RuntimeBuilder, RuntimeState};
pub use saver::ConfigSaver;
pub use scheduler::TokioScheduler;
pub use storage::{ConfigFiles, SaveReport};

pub use tracing;
