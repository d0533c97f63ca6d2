//! The `base` plugin: help, prefix management and plugin administration.

use std::fmt::Write as _;

use linkme::distributed_slice;

use crate::command::{CommandDescriptor, PermissionTier};
use crate::context::CommandContext;
use crate::error::{CommandResult, PluginError};
use crate::plugin::{BUILTIN_PLUGINS, PluginDescriptor, PluginRegistrar};

#[distributed_slice(BUILTIN_PLUGINS)]
pub static BASE: PluginDescriptor = crate::define_plugin! {
    name: "base",
    register: register,
    desc: "Help, prefix and plugin administration",
};

fn register(r: &mut PluginRegistrar) -> Result<(), PluginError> {
    r.command(
        CommandDescriptor::new("help", help)
            .alias("h")
            .help("Lists the available commands"),
    )
    .command(CommandDescriptor::new("prefix", prefix).help("Sets the command prefix for this server"))
    .command(
        CommandDescriptor::new("plugins", plugins)
            .help("Shows selected and loaded plugins")
            .operator_only(),
    )
    .command(
        CommandDescriptor::new("reload", reload)
            .help("Reloads every selected plugin")
            .operator_only(),
    );
    Ok(())
}

async fn help(ctx: CommandContext) -> CommandResult {
    let operator = ctx.is_operator();
    let prefix = ctx.config.prefix_for(ctx.tenant());
    let mut out = String::from("Commands:");
    for cmd in ctx.registry.commands().iter() {
        if cmd.tier() == PermissionTier::Operator && !operator {
            continue;
        }
        let _ = write!(out, "\n{prefix}{}", cmd.name());
        if !cmd.help_text().is_empty() {
            let _ = write!(out, " - {}", cmd.help_text());
        }
    }
    Ok(Some(out))
}

async fn prefix(ctx: CommandContext) -> CommandResult {
    let tenant = ctx.require_tenant(&ctx.name)?;
    let raw = ctx.rest();
    let applied = ctx.config.set_prefix(tenant, &raw, "set prefix")?;
    Ok(Some(format!("Prefix set to `{applied}`")))
}

async fn plugins(ctx: CommandContext) -> CommandResult {
    let selected = ctx.registry.selection().active_plugin_names();
    let loaded = ctx.registry.loaded_plugins();
    Ok(Some(format!(
        "Selected: {}\nLoaded: {}",
        join_or_none(&selected),
        join_or_none(&loaded)
    )))
}

async fn reload(ctx: CommandContext) -> CommandResult {
    let report = ctx.registry.reload().await;
    let mut out = format!(
        "Reloaded {} plugin(s): {} command(s), {} responder(s), {} job(s) scheduled",
        report.loaded.len(),
        report.commands,
        report.responders,
        report.scheduled
    );
    if report.skipped > 0 {
        let _ = write!(out, ", {} skipped", report.skipped);
    }
    if !report.failed.is_empty() {
        let _ = write!(out, "\nFailed: {}", join_or_none(&report.failed));
    }
    Ok(Some(out))
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}
