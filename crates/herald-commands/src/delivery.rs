//! Posts scheduled payloads to Discord channels.

use async_trait::async_trait;
use herald_common::ChannelId;
use herald_schedule::{Delivery, DeliveryError};
use poise::serenity_prelude as serenity;
use std::fmt;
use std::sync::Arc;

/// [`Delivery`] backed by the Discord REST API.
#[derive(Clone)]
pub struct DiscordDelivery {
    http: Arc<serenity::Http>,
}

impl DiscordDelivery {
    /// Sends through `http`.
    pub const fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

impl fmt::Debug for DiscordDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordDelivery").finish_non_exhaustive()
    }
}

#[async_trait]
impl Delivery for DiscordDelivery {
    async fn deliver(&self, destination: ChannelId, payload: &str) -> Result<(), DeliveryError> {
        serenity::ChannelId::new(destination.0)
            .say(&self.http, payload)
            .await
            .map(|_| ())
            .map_err(|e| classify(destination, &e))
    }
}

/// HTTP status of a failed REST call, if the failure came from Discord.
pub fn status_of(error: &serenity::Error) -> Option<u16> {
    match error {
        serenity::Error::Http(http) => http.status_code().map(|s| s.as_u16()),
        _ => None,
    }
}

/// Maps a REST failure to a [`DeliveryError`].
pub fn classify(destination: ChannelId, error: &serenity::Error) -> DeliveryError {
    match status_of(error) {
        Some(403 | 404) => DeliveryError::Unreachable(destination),
        _ => DeliveryError::Send(error.to_string()),
    }
}
