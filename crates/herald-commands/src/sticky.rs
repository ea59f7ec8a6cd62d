//! Sticky messages: a message that is reposted whenever someone writes below it.
//!
//! [`sticky_msg`] records the copy it posts in [`StickyMessages`]. Every later
//! message in the channel reaches [`repost_on_message`] through the framework's
//! event handler, which deletes the previous copy and posts a fresh one.

use crate::autodelete::{is_not_found, respond};
use crate::delivery::status_of;
use crate::targets::{fetch_failure_text, parse_message_id};
use crate::{Context, Data, Error};
use parking_lot::Mutex;
use poise::serenity_prelude as serenity;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Content kept at the bottom of a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Sticky {
    /// Text of the original message.
    pub content: String,
    /// Embeds of the original message.
    pub embeds: Vec<serenity::CreateEmbed>,
    /// The copy currently posted.
    pub posted: serenity::MessageId,
}

impl Sticky {
    /// The message that reposts this sticky.
    pub fn message(&self) -> serenity::CreateMessage {
        serenity::CreateMessage::new()
            .content(&self.content)
            .embeds(self.embeds.clone())
    }
}

/// Active sticky message of each channel, keyed by channel id.
#[derive(Debug, Default)]
pub struct StickyMessages {
    active: Mutex<HashMap<serenity::ChannelId, Sticky>>,
}

impl StickyMessages {
    /// No channel has a sticky message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `sticky` the channel's sticky message.
    ///
    /// Returns `false` and changes nothing when the channel already has one.
    pub fn start(&self, channel: serenity::ChannelId, sticky: Sticky) -> bool {
        let mut active = self.active.lock();
        if active.contains_key(&channel) {
            return false;
        }
        active.insert(channel, sticky);
        true
    }

    /// Whether `channel` has a sticky message.
    pub fn is_active(&self, channel: serenity::ChannelId) -> bool {
        self.active.lock().contains_key(&channel)
    }

    /// The channel's sticky message.
    pub fn get(&self, channel: serenity::ChannelId) -> Option<Sticky> {
        self.active.lock().get(&channel).cloned()
    }

    /// Records `reposted` as the current copy, provided the current copy is still `previous`.
    ///
    /// Returns `false` when the sticky was stopped or another repost won the race.
    pub fn replace_posted(
        &self,
        channel: serenity::ChannelId,
        previous: serenity::MessageId,
        reposted: serenity::MessageId,
    ) -> bool {
        match self.active.lock().get_mut(&channel) {
            Some(sticky) if sticky.posted == previous => {
                sticky.posted = reposted;
                true
            }
            _ => false,
        }
    }

    /// Removes the channel's sticky message and returns it.
    pub fn stop(&self, channel: serenity::ChannelId) -> Option<Sticky> {
        self.active.lock().remove(&channel)
    }
}

async fn delete_quietly(
    ctx: &serenity::Context,
    channel: serenity::ChannelId,
    message: serenity::MessageId,
) {
    match channel.delete_message(ctx, message).await {
        Ok(()) => {}
        Err(e) if is_not_found(&e) => debug!("Sticky copy {} was already deleted", message),
        Err(e) => warn!("Failed to delete sticky copy {}: {}", message, e),
    }
}

/// Event hook: moves a channel's sticky message below a newly posted message.
///
/// Messages written by the bot itself are ignored, so reposts do not trigger reposts.
///
/// # Errors
///
/// Never fails; send errors stop the sticky and are logged.
pub async fn repost_on_message(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    data: &Data,
) -> Result<(), Error> {
    let serenity::FullEvent::Message { new_message } = event else {
        return Ok(());
    };
    if new_message.author.id == ctx.cache.current_user().id {
        return Ok(());
    }
    let channel = new_message.channel_id;
    let Some(sticky) = data.sticky.get(channel) else {
        return Ok(());
    };

    delete_quietly(ctx, channel, sticky.posted).await;
    match channel.send_message(ctx, sticky.message()).await {
        Ok(reposted) => {
            if !data.sticky.replace_posted(channel, sticky.posted, reposted.id) {
                delete_quietly(ctx, channel, reposted.id).await;
            }
        }
        Err(e) => {
            warn!("Error updating sticky message in channel {}: {}", channel, e);
            data.sticky.stop(channel);
        }
    }
    Ok(())
}

/// Keep a message at the bottom of this channel
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("sticky", "stepbro"),
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn sticky_msg(
    ctx: Context<'_>,
    #[description = "ID of the message"] message_id: Option<String>,
) -> Result<(), Error> {
    let Some(message_id) = message_id.as_deref().and_then(parse_message_id) else {
        respond(
            ctx,
            "❌ Please provide the message ID of the message you want to make sticky.",
        )
        .await?;
        return Ok(());
    };

    let channel = ctx.channel_id();
    if ctx.data().sticky.is_active(channel) {
        let prefix = ctx.data().config.get().discord.prefix.clone();
        respond(
            ctx,
            format!(
                "⚠️ A sticky message is already active in this channel. Use `{prefix}stop_sticky` to stop it first."
            ),
        )
        .await?;
        return Ok(());
    }

    let original = match channel.message(ctx.serenity_context(), message_id).await {
        Ok(original) => original,
        Err(e) => {
            let text = fetch_failure_text(
                status_of(&e),
                &e,
                "❌ I don't have permission to access that message.",
            );
            respond(ctx, text).await?;
            return Ok(());
        }
    };
    if original.content.is_empty() && original.embeds.is_empty() {
        respond(ctx, "❌ That message has no text or embeds to keep.").await?;
        return Ok(());
    }

    let mut sticky = Sticky {
        content: original.content.clone(),
        embeds: original
            .embeds
            .iter()
            .cloned()
            .map(serenity::CreateEmbed::from)
            .collect(),
        posted: original.id,
    };
    let posted = match channel
        .send_message(ctx.serenity_context(), sticky.message())
        .await
    {
        Ok(posted) => posted,
        Err(e) => {
            respond(ctx, format!("❌ Failed to send the sticky message: {e}")).await?;
            return Ok(());
        }
    };
    sticky.posted = posted.id;

    if ctx.data().sticky.start(channel, sticky) {
        info!(
            "{} made message {} sticky in channel {}",
            ctx.author().name,
            message_id,
            channel
        );
    } else {
        delete_quietly(ctx.serenity_context(), channel, posted.id).await;
    }
    Ok(())
}

/// Stop the sticky message in this channel
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("unsticky"),
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn stop_sticky(ctx: Context<'_>) -> Result<(), Error> {
    let channel = ctx.channel_id();
    let Some(sticky) = ctx.data().sticky.stop(channel) else {
        respond(ctx, "❌ No sticky message is active in this channel.").await?;
        return Ok(());
    };

    delete_quietly(ctx.serenity_context(), channel, sticky.posted).await;
    info!("{} stopped the sticky message in channel {}", ctx.author().name, channel);
    respond(ctx, "✅ Sticky message stopped.").await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> serenity::ChannelId {
        serenity::ChannelId::new(10)
    }

    fn sticky(posted: u64) -> Sticky {
        Sticky {
            content: "Read the rules first".to_string(),
            embeds: vec![],
            posted: serenity::MessageId::new(posted),
        }
    }

    #[test]
    fn test_one_sticky_per_channel() {
        let stickies = StickyMessages::new();
        assert!(stickies.start(channel(), sticky(1)));
        assert!(!stickies.start(channel(), sticky(2)));
        assert_eq!(stickies.get(channel()), Some(sticky(1)));

        assert!(stickies.start(serenity::ChannelId::new(11), sticky(3)));
        assert!(stickies.is_active(serenity::ChannelId::new(11)));
    }

    #[test]
    fn test_replace_posted_requires_current_copy() {
        let stickies = StickyMessages::new();
        stickies.start(channel(), sticky(1));

        assert!(stickies.replace_posted(
            channel(),
            serenity::MessageId::new(1),
            serenity::MessageId::new(2)
        ));
        assert!(!stickies.replace_posted(
            channel(),
            serenity::MessageId::new(1),
            serenity::MessageId::new(3)
        ));
        assert_eq!(
            stickies.get(channel()).map(|s| s.posted),
            Some(serenity::MessageId::new(2))
        );
    }

    #[test]
    fn test_stop_removes_sticky() {
        let stickies = StickyMessages::new();
        stickies.start(channel(), sticky(1));

        assert_eq!(stickies.stop(channel()), Some(sticky(1)));
        assert_eq!(stickies.stop(channel()), None);
        assert!(!stickies.is_active(channel()));
        assert!(!stickies.replace_posted(
            channel(),
            serenity::MessageId::new(1),
            serenity::MessageId::new(2)
        ));
    }
}
