//! Pinning and unpinning messages by id.

use crate::autodelete::respond;
use crate::delivery::status_of;
use crate::targets::{fetch_failure_text, parse_message_id};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

const PIN_FORBIDDEN: &str = "❌ I don't have permission to pin messages in this channel.";

/// Reply after toggling a message that was pinned (`true`) or not.
pub const fn toggled_text(was_pinned: bool) -> &'static str {
    if was_pinned {
        "📌 Message unpinned."
    } else {
        "📌 Message pinned."
    }
}

/// Pins the message, or unpins it when it already is. Returns the previous state.
async fn toggle_pin(
    ctx: Context<'_>,
    message_id: serenity::MessageId,
) -> Result<bool, serenity::Error> {
    let message = ctx
        .channel_id()
        .message(ctx.serenity_context(), message_id)
        .await?;
    if message.pinned {
        message.unpin(ctx.serenity_context()).await?;
    } else {
        message.pin(ctx.serenity_context()).await?;
    }
    Ok(message.pinned)
}

/// Pin or unpin a message in this channel
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("pin"),
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn pin_msg(
    ctx: Context<'_>,
    #[description = "ID of the message"] message_id: Option<String>,
) -> Result<(), Error> {
    let Some(message_id) = message_id.as_deref().and_then(parse_message_id) else {
        respond(ctx, "❌ Please provide a message ID to pin or unpin.").await?;
        return Ok(());
    };

    let text = match toggle_pin(ctx, message_id).await {
        Ok(was_pinned) => {
            info!(
                "{} toggled pin on message {} (was pinned: {})",
                ctx.author().name,
                message_id,
                was_pinned
            );
            toggled_text(was_pinned).to_string()
        }
        Err(e) => {
            warn!("Failed to toggle pin on message {}: {}", message_id, e);
            fetch_failure_text(status_of(&e), &e, PIN_FORBIDDEN)
        }
    };
    respond(ctx, text).await
}
