//! Copying messages into a per-server archive channel.

use crate::autodelete::respond;
use crate::delivery::status_of;
use crate::targets::{fetch_failure_text, parse_message_id};
use crate::{Context, Error};
use herald_common::ChannelId;
use parking_lot::Mutex;
use poise::serenity_prelude as serenity;
use std::collections::HashMap;
use tracing::{info, warn};

const NO_TEXT: &str = "[No Text Content]";

/// Archive channel of each server, keyed by guild id.
#[derive(Debug, Default)]
pub struct ArchiveChannels {
    channels: Mutex<HashMap<u64, ChannelId>>,
}

impl ArchiveChannels {
    /// No server has an archive channel yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or replaces the archive channel of `guild`.
    pub fn set(&self, guild: u64, channel: ChannelId) {
        self.channels.lock().insert(guild, channel);
    }

    /// The archive channel of `guild`, if one was set.
    pub fn get(&self, guild: u64) -> Option<ChannelId> {
        self.channels.lock().get(&guild).copied()
    }
}

/// The parts of a message kept in the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedMessage {
    /// Message text, possibly empty.
    pub content: String,
    /// Name shown for the author.
    pub author_name: String,
    /// Avatar of the author.
    pub author_icon: String,
    /// When the message was originally sent.
    pub sent_at: serenity::Timestamp,
    /// Attachment URLs, in message order.
    pub attachments: Vec<String>,
    /// Name of the channel the message came from.
    pub source_channel: String,
}

impl ArchivedMessage {
    /// Captures `message`, posted in the channel named `source_channel`.
    pub fn capture(message: &serenity::Message, source_channel: impl Into<String>) -> Self {
        Self {
            content: message.content.clone(),
            author_name: message
                .author
                .global_name
                .clone()
                .unwrap_or_else(|| message.author.name.clone()),
            author_icon: message.author.face(),
            sent_at: message.timestamp,
            attachments: message.attachments.iter().map(|a| a.url.clone()).collect(),
            source_channel: source_channel.into(),
        }
    }

    /// The embed posted to the archive channel.
    pub fn embed(&self) -> serenity::CreateEmbed {
        let description = if self.content.is_empty() {
            NO_TEXT
        } else {
            self.content.as_str()
        };
        let mut embed = serenity::CreateEmbed::new()
            .description(description)
            .timestamp(self.sent_at)
            .colour(serenity::Colour::BLUE)
            .author(serenity::CreateEmbedAuthor::new(&self.author_name).icon_url(&self.author_icon))
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Saved from #{}",
                self.source_channel
            )));
        if !self.attachments.is_empty() {
            embed = embed.field("Attachments", self.attachments.join("\n"), false);
        }
        embed
    }
}

/// Set the channel saved messages are copied to
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("set_archive"),
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn set_archive_channel(
    ctx: Context<'_>,
    #[description = "Archive channel"] channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let guild = ctx.guild_id().ok_or("This command only works in a server.")?;
    let Some(channel) = channel.filter(|c| c.guild_id == guild) else {
        respond(ctx, "❌ Please mention a channel to set as the archive channel.").await?;
        return Ok(());
    };

    let archive = ChannelId(channel.id.get());
    ctx.data().archive.set(guild.get(), archive);
    info!(
        "{} set the archive channel of guild {} to {}",
        ctx.author().name,
        guild,
        archive
    );
    respond(ctx, format!("✅ Archive channel set to {}", archive.mention())).await
}

/// Copy a message from this channel into the archive channel
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("archive_msg"),
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn save_msg(
    ctx: Context<'_>,
    #[description = "ID of the message"] message_id: Option<String>,
) -> Result<(), Error> {
    let Some(message_id) = message_id.as_deref().and_then(parse_message_id) else {
        respond(ctx, "❌ Please provide a message ID to save.").await?;
        return Ok(());
    };
    let guild = ctx.guild_id().ok_or("This command only works in a server.")?;
    let Some(archive) = ctx.data().archive.get(guild.get()) else {
        let prefix = ctx.data().config.get().discord.prefix.clone();
        respond(
            ctx,
            format!("❌ Archive channel is not set. Use `{prefix}set_archive_channel <channel>`."),
        )
        .await?;
        return Ok(());
    };

    let source_channel = ctx
        .guild_channel()
        .await
        .map(|c| c.name)
        .unwrap_or_default();
    let saved = async {
        let message = ctx
            .channel_id()
            .message(ctx.serenity_context(), message_id)
            .await?;
        let embed = ArchivedMessage::capture(&message, source_channel).embed();
        serenity::ChannelId::new(archive.0)
            .send_message(ctx.serenity_context(), serenity::CreateMessage::new().embed(embed))
            .await
    }
    .await;

    let text = match saved {
        Ok(_) => {
            info!("{} archived message {}", ctx.author().name, message_id);
            format!("📌 Message saved to {}.", archive.mention())
        }
        Err(e) => {
            warn!("Failed to archive message {}: {}", message_id, e);
            fetch_failure_text(
                status_of(&e),
                &e,
                "❌ I don't have permission to access that message or channel.",
            )
        }
    };
    respond(ctx, text).await
}
