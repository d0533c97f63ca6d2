//! Console Bot
//!
//! Runs Ember with stdin as the inbound channel and stdout for replies.
//! Every line typed is delivered as a message from `--author` in
//! `--tenant` (or as a direct message when no tenant is given).
//!
//! ```bash
//! mkdir -p config && echo '{"bot_token": "local", "operator_ids": [1]}' > config/config.json
//! cargo run --package console-bot -- --tenant 42 --author 1
//! ```
//!
//! Without a `config/plugins.json` both `base` and `console` are installed.
//! Try `.help`, `.prefix !`, `!echo hi`, `hello`, `!reload`.

mod transport;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use ember::prelude::*;

use crate::transport::ConsoleTransport;

#[derive(Debug, Parser)]
#[command(name = "console-bot", about = "Talk to Ember from the terminal")]
struct Args {
    /// Settings file (ember.toml); searched for when omitted.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Settings profile.
    #[arg(short, long)]
    profile: Option<String>,

    /// Tenant the typed messages belong to.
    #[arg(short, long)]
    tenant: Option<TenantId>,

    /// Author id of the typed messages.
    #[arg(short, long, default_value_t = 1)]
    author: i64,

    /// Schedule the heartbeat job.
    #[arg(long)]
    heartbeat: bool,
}

static HEARTBEAT: AtomicBool = AtomicBool::new(false);

fn register(r: &mut PluginRegistrar) -> Result<(), PluginError> {
    r.command(
        CommandDescriptor::new("echo", |ctx: CommandContext| async move {
            if ctx.args.is_empty() {
                return Err(CommandError::MissingArgument { position: 1 });
            }
            Ok(Some(ctx.rest()))
        })
        .help("Repeats the arguments"),
    )
    .responder(ResponderDescriptor::new(
        "greeting",
        |e: &InboundEvent| e.content.trim().eq_ignore_ascii_case("hello"),
        |_| async { Ok(Some("Hello there!".to_string())) },
    ))
    .job(
        JobDescriptor::new(
            "console.heartbeat",
            JobSchedule::every(Duration::from_secs(60)),
            || async { info!("Still alive") },
        )
        .when(HEARTBEAT.load(Ordering::Relaxed)),
    );
    Ok(())
}

/// Installed while `config/plugins.json` does not exist.
const DEFAULT_SELECTION: [&str; 2] = ["base", "console"];

static CONSOLE: PluginDescriptor = define_plugin! {
    name: "console",
    register: register,
    desc: "Echo, greeting and heartbeat for local testing",
};

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    let args = Args::parse();
    HEARTBEAT.store(args.heartbeat, Ordering::Relaxed);

    let mut builder = EmberRuntime::builder()
        .plugin(CONSOLE)
        .default_plugins(DEFAULT_SELECTION);
    if let Some(path) = &args.settings {
        builder = builder.settings_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }

    let transport = Arc::new(ConsoleTransport::new(args.tenant, args.author));
    builder.build(transport)?.run().await
}

#[cfg(test)]
mod tests {
    use ember::core::SelectionStore;
    use ember::runtime::TokioScheduler;

    use super::*;

    async fn fresh_setup() -> Dispatcher {
        let config = Arc::new(ConfigStore::default());
        let registry = Registry::new(
            PluginCatalog::builtin().with(CONSOLE),
            Arc::new(TokioScheduler::new()),
            Arc::new(SelectionStore::default()),
        )
        .with_default_plugins(DEFAULT_SELECTION);
        let registry = Arc::new(registry);
        registry.reload().await;
        Dispatcher::new(config, registry)
    }

    #[tokio::test]
    async fn test_fresh_setup_answers_echo() {
        let dispatcher = fresh_setup().await;
        assert_eq!(dispatcher.registry().loaded_plugins(), vec!["base", "console"]);

        let outcome = dispatcher.dispatch(&InboundEvent::new(Some(42), 0, 1, ".echo hi there")).await;
        assert_eq!(outcome.replies, vec!["hi there"]);

        let outcome = dispatcher.dispatch(&InboundEvent::new(Some(42), 0, 1, ".echo")).await;
        assert_eq!(outcome.replies, vec!["Error: argument 1 is missing"]);
    }

    #[tokio::test]
    async fn test_greeting_and_heartbeat_condition() {
        let dispatcher = fresh_setup().await;

        let outcome = dispatcher.dispatch(&InboundEvent::new(None, 0, 1, "Hello")).await;
        assert_eq!(outcome.replies, vec!["Hello there!"]);

        // declared but left unscheduled while the flag is off
        let registry = dispatcher.registry();
        assert!(registry.job_tags().contains(&"console.heartbeat".to_string()));
        assert!(registry.job_handle("console.heartbeat").is_none());
    }
}
