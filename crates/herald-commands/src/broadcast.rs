//! Sending one message to several channels at once.

use crate::autodelete::respond;
use crate::targets::{in_current_guild, parse_channel_list};
use crate::{Context, Error};
use herald_common::ChannelId;
use herald_schedule::{Delivery, DeliveryError};
use tracing::{info, warn};

/// Reply line for a channel the broadcast could not reach.
pub fn failure_line(channel: ChannelId, error: &DeliveryError) -> String {
    match error {
        DeliveryError::Unreachable(_) => format!(
            "❌ I don't have permission to send messages in {}.",
            channel.mention()
        ),
        DeliveryError::Send(e) | DeliveryError::Panicked(e) => {
            format!("❌ An error occurred in {}: {e}", channel.mention())
        }
    }
}

/// Sends `content` to each channel in order. A failing channel does not stop the rest.
///
/// Returns one reply line per failed channel.
pub async fn broadcast(delivery: &dyn Delivery, channels: &[ChannelId], content: &str) -> Vec<String> {
    let mut failures = Vec::new();
    for &channel in channels {
        if let Err(e) = delivery.deliver(channel, content).await {
            warn!(destination = %channel, "Broadcast failed: {}", e);
            failures.push(failure_line(channel, &e));
        }
    }
    failures
}

/// Send a message to several channels
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("broadcast"),
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn bulk_msg(
    ctx: Context<'_>,
    #[description = "Message to send"] content: Option<String>,
    #[description = "Channels to send it to"]
    #[rest]
    channels: Option<String>,
) -> Result<(), Error> {
    let Some(content) = content.filter(|c| !c.is_empty()) else {
        respond(ctx, "❌ Please provide the message content to send.").await?;
        return Ok(());
    };

    let channels = match parse_channel_list(channels.as_deref().unwrap_or_default()) {
        Ok(channels) => channels,
        Err(token) => {
            respond(ctx, format!("❌ `{token}` is not a channel.")).await?;
            return Ok(());
        }
    };
    if channels.is_empty() {
        respond(ctx, "❌ Please specify at least one channel.").await?;
        return Ok(());
    }
    if let Some(foreign) = channels.iter().find(|c| !in_current_guild(ctx, **c)) {
        respond(
            ctx,
            format!("❌ {} is not a channel of this server.", foreign.mention()),
        )
        .await?;
        return Ok(());
    }

    let failures = broadcast(ctx.data().delivery.as_ref(), &channels, &content).await;
    for line in failures {
        respond(ctx, line).await?;
    }
    info!(
        "{} broadcast a message to {} channels",
        ctx.author().name,
        channels.len()
    );
    respond(ctx, format!("✅ Message sent to {} channels.", channels.len())).await
}
