//! Parsing of channel and message references typed by users.

use crate::Context;
use herald_common::ChannelId;
use poise::serenity_prelude as serenity;

/// Reply used whenever a message id does not resolve in the current channel.
pub const MESSAGE_NOT_FOUND: &str =
    "❌ Message not found. Please ensure the ID is correct and the message is in this channel.";

/// Parses a raw message id. Zero is not a valid snowflake.
pub fn parse_message_id(input: &str) -> Option<serenity::MessageId> {
    input
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(serenity::MessageId::new)
}

/// Parses a channel mention (`<#id>`) or a raw channel id.
pub fn parse_channel(token: &str) -> Option<ChannelId> {
    let raw = token
        .strip_prefix("<#")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(token);
    raw.parse::<u64>().ok().filter(|id| *id != 0).map(ChannelId)
}

/// Parses a whitespace separated list of channels, keeping the order given.
///
/// # Errors
///
/// Returns the first token that is not a channel.
pub fn parse_channel_list(input: &str) -> Result<Vec<ChannelId>, String> {
    input
        .split_whitespace()
        .map(|token| parse_channel(token).ok_or_else(|| token.to_string()))
        .collect()
}

/// Whether `channel` belongs to the guild the command runs in.
pub fn in_current_guild(ctx: Context<'_>, channel: ChannelId) -> bool {
    channel.0 != 0
        && ctx.guild().is_some_and(|guild| {
            guild
                .channels
                .contains_key(&serenity::ChannelId::new(channel.0))
        })
}

/// Reply for a failed fetch or edit of a message, keyed on the HTTP status.
pub fn fetch_failure_text(
    status: Option<u16>,
    error: &impl std::fmt::Display,
    forbidden: &str,
) -> String {
    match status {
        Some(404) => MESSAGE_NOT_FOUND.to_string(),
        Some(403) => forbidden.to_string(),
        _ => format!("❌ An error occurred: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids() {
        assert_eq!(
            parse_message_id(" 123456789012345678 "),
            Some(serenity::MessageId::new(123_456_789_012_345_678))
        );
        assert_eq!(parse_message_id("0"), None);
        assert_eq!(parse_message_id("-5"), None);
        assert_eq!(parse_message_id("latest"), None);
    }

    #[test]
    fn test_channel_mentions_and_raw_ids() {
        assert_eq!(parse_channel("<#42>"), Some(ChannelId(42)));
        assert_eq!(parse_channel("42"), Some(ChannelId(42)));
        assert_eq!(parse_channel("<#0>"), None);
        assert_eq!(parse_channel("<@42>"), None);
        assert_eq!(parse_channel("#general"), None);
    }

    #[test]
    fn test_channel_list_keeps_order_and_names_bad_token() {
        assert_eq!(
            parse_channel_list("<#3> 1\n<#2>"),
            Ok(vec![ChannelId(3), ChannelId(1), ChannelId(2)])
        );
        assert_eq!(parse_channel_list(""), Ok(vec![]));
        assert_eq!(parse_channel_list("<#3> general <#2>"), Err("general".to_string()));
    }

    #[test]
    fn test_fetch_failure_text() {
        let forbidden = "❌ I don't have permission to pin messages in this channel.";
        assert_eq!(fetch_failure_text(Some(404), &"gone", forbidden), MESSAGE_NOT_FOUND);
        assert_eq!(fetch_failure_text(Some(403), &"denied", forbidden), forbidden);
        assert_eq!(
            fetch_failure_text(Some(500), &"server error", forbidden),
            "❌ An error occurred: server error"
        );
        assert_eq!(
            fetch_failure_text(None, &"timed out", forbidden),
            "❌ An error occurred: timed out"
        );
    }
}
