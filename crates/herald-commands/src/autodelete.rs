//! Per-command auto-deletion of invoking messages and bot responses.
//!
//! Every command looks up its [`AutoDeletePolicy`] by name in the
//! [`AutoDeleteTable`] stored in [`Data`](crate::Data). The invoking message
//! of a prefix command is removed by [`delete_invocation`], which runs as the
//! framework's pre-command hook. Responses sent through [`respond`] or handed
//! to [`expire_reply`] are removed after the command's response delay, or the
//! configured default when the policy leaves it open.

use crate::delivery::status_of;
use crate::framework::{Context, Error};
use poise::serenity_prelude as serenity;
use poise::ReplyHandle;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// When to delete the two messages a command produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoDeletePolicy {
    /// Delay before the invoking message is deleted. `None` keeps it.
    pub command_delay: Option<Duration>,
    /// Delay before responses are deleted. `None` defers to the configured default.
    pub response_delay: Option<Duration>,
}

impl AutoDeletePolicy {
    /// A policy that keeps the invoking message and uses the default response delay.
    pub const fn new() -> Self {
        Self {
            command_delay: None,
            response_delay: None,
        }
    }

    /// Deletes the invoking message after `delay`.
    #[must_use]
    pub const fn delete_command_after(mut self, delay: Duration) -> Self {
        self.command_delay = Some(delay);
        self
    }

    /// Deletes responses after `delay` instead of the configured default.
    #[must_use]
    pub const fn delete_response_after(mut self, delay: Duration) -> Self {
        self.response_delay = Some(delay);
        self
    }
}

/// Policies keyed by command name.
#[derive(Debug, Clone, Default)]
pub struct AutoDeleteTable {
    policies: HashMap<String, AutoDeletePolicy>,
}

impl AutoDeleteTable {
    /// An empty table. Every command falls back to [`AutoDeletePolicy::new`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The table Herald's commands are registered with.
    pub fn standard() -> Self {
        let now = Duration::ZERO;
        Self::new()
            .with(
                "schedule_msg",
                AutoDeletePolicy::new()
                    .delete_command_after(now)
                    .delete_response_after(Duration::from_secs(15)),
            )
            .with(
                "show_scheduled_msgs",
                AutoDeletePolicy::new()
                    .delete_command_after(now)
                    .delete_response_after(Duration::from_secs(10)),
            )
            .with(
                "cancel_scheduled_message",
                AutoDeletePolicy::new().delete_command_after(now),
            )
            .with(
                "set_response_delay",
                AutoDeletePolicy::new()
                    .delete_command_after(now)
                    .delete_response_after(Duration::from_secs(10)),
            )
            .with_each(
                &[
                    "bulk_msg",
                    "pin_msg",
                    "set_archive_channel",
                    "save_msg",
                    "sticky_msg",
                    "stop_sticky",
                ],
                AutoDeletePolicy::new()
                    .delete_command_after(now)
                    .delete_response_after(Duration::from_secs(10)),
            )
    }

    /// Adds or replaces the same policy for several commands.
    #[must_use]
    pub fn with_each(mut self, commands: &[&str], policy: AutoDeletePolicy) -> Self {
        for command in commands {
            self.insert(command, policy);
        }
        self
    }

    /// Adds or replaces the policy for `command`.
    #[must_use]
    pub fn with(mut self, command: &str, policy: AutoDeletePolicy) -> Self {
        self.insert(command, policy);
        self
    }

    /// Adds or replaces the policy for `command`.
    pub fn insert(&mut self, command: &str, policy: AutoDeletePolicy) {
        self.policies.insert(command.to_string(), policy);
    }

    /// The policy for `command`, or the empty policy.
    pub fn policy(&self, command: &str) -> AutoDeletePolicy {
        self.policies.get(command).copied().unwrap_or_default()
    }

    /// Delay before the invoking message of `command` is deleted.
    pub fn command_delay(&self, command: &str) -> Option<Duration> {
        self.policy(command).command_delay
    }

    /// Delay before responses to `command` are deleted.
    pub fn response_delay(&self, command: &str, default: Duration) -> Duration {
        self.policy(command).response_delay.unwrap_or(default)
    }
}

/// Deletes a message after `delay` on a background task.
///
/// A message that is already gone is not an error.
pub fn delete_later(
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    delay: Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match channel_id.delete_message(&http, message_id).await {
            Ok(()) => debug!("Auto-deleted message {} in channel {}", message_id, channel_id),
            Err(e) if is_not_found(&e) => {
                debug!("Message {} was already deleted", message_id);
            }
            Err(e) => warn!(
                "Failed to auto-delete message {} in channel {}: {}",
                message_id, channel_id, e
            ),
        }
    });
}

pub(crate) fn is_not_found(error: &serenity::Error) -> bool {
    status_of(error) == Some(404)
}

/// Pre-command hook: schedules deletion of a prefix command's invoking message.
pub async fn delete_invocation(ctx: Context<'_>) {
    let Some(delay) = ctx.data().auto_delete.command_delay(&ctx.command().name) else {
        return;
    };
    if let poise::Context::Prefix(prefix) = ctx {
        delete_later(
            ctx.serenity_context().http.clone(),
            prefix.msg.channel_id,
            prefix.msg.id,
            delay,
        );
    }
}

/// Response delay that applies to the running command.
pub fn response_delay(ctx: Context<'_>) -> Duration {
    let default = ctx.data().config.get().auto_delete.response_delay();
    ctx.data()
        .auto_delete
        .response_delay(&ctx.command().name, default)
}

/// Schedules deletion of a reply sent by the running command.
///
/// # Errors
///
/// Fails when the sent message cannot be resolved.
pub async fn expire_reply(ctx: Context<'_>, reply: ReplyHandle<'_>) -> Result<(), Error> {
    let message = reply.into_message().await?;
    delete_later(
        ctx.serenity_context().http.clone(),
        message.channel_id,
        message.id,
        response_delay(ctx),
    );
    Ok(())
}

/// Sends `content` and schedules its deletion per the command's policy.
///
/// # Errors
///
/// Fails when the message cannot be sent.
pub async fn respond(ctx: Context<'_>, content: impl Into<String> + Send) -> Result<(), Error> {
    let reply = ctx.say(content).await?;
    expire_reply(ctx, reply).await
}
