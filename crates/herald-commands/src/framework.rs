//! Poise framework setup and command registration logic.

use crate::archive::ArchiveChannels;
use crate::autodelete::{self, AutoDeleteTable};
use crate::delivery::DiscordDelivery;
use crate::sticky::{self, StickyMessages};
use herald_config::ConfigCache;
use herald_schedule::{Delivery, ScheduleRegistry};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info};

/// Application data accessible in all commands.
pub struct Data {
    /// Live configuration; `set_response_delay` writes through it.
    pub config: Arc<ConfigCache>,
    /// Pending scheduled messages.
    pub schedules: ScheduleRegistry,
    /// Sends immediate messages; the registry delivers through the same sink.
    pub delivery: Arc<dyn Delivery>,
    /// Auto-delete policy per command.
    pub auto_delete: AutoDeleteTable,
    /// Archive channel per server.
    pub archive: ArchiveChannels,
    /// Active sticky messages.
    pub sticky: StickyMessages,
}

impl Data {
    /// Command data whose scheduled and broadcast messages go out through `delivery`.
    pub fn new(config: Arc<ConfigCache>, delivery: Arc<dyn Delivery>) -> Self {
        let schedules = ScheduleRegistry::new(Arc::clone(&delivery));
        Self::with_schedules(config, schedules, delivery)
    }

    /// Command data for the connected client, sending through its HTTP client.
    pub fn for_client(config: Arc<ConfigCache>, http: Arc<serenity::Http>) -> Self {
        Self::new(config, Arc::new(DiscordDelivery::new(http)))
    }

    /// Command data around an existing registry.
    pub fn with_schedules(
        config: Arc<ConfigCache>,
        schedules: ScheduleRegistry,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            config,
            schedules,
            delivery,
            auto_delete: AutoDeleteTable::standard(),
            archive: ArchiveChannels::new(),
            sticky: StickyMessages::new(),
        }
    }
}

/// Application error type for commands.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Command context type.
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Every command Herald registers.
pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        crate::schedule::schedule_msg(),
        crate::scheduled::show_scheduled_msgs(),
        crate::scheduled::cancel_scheduled_message(),
        crate::response_delay::set_response_delay(),
        crate::broadcast::bulk_msg(),
        crate::pin::pin_msg(),
        crate::archive::set_archive_channel(),
        crate::archive::save_msg(),
        crate::sticky::sticky_msg(),
        crate::sticky::stop_sticky(),
    ]
}

/// Creates a new Poise framework that answers text commands starting with `prefix`.
pub fn create_framework(prefix: &str) -> poise::FrameworkBuilder<Data, Error> {
    poise::Framework::builder().options(poise::FrameworkOptions {
        commands: commands(),
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(prefix.into()),
            ..Default::default()
        },
        pre_command: |ctx| {
            Box::pin(async move {
                info!(
                    "{} invoked '{}'",
                    ctx.author().name,
                    ctx.command().qualified_name
                );
                autodelete::delete_invocation(ctx).await;
            })
        },
        on_error: |error| Box::pin(on_error(error)),
        event_handler: |ctx, event, _framework, data| {
            Box::pin(sticky::repost_on_message(ctx, event, data))
        },
        ..Default::default()
    })
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(
                "Error in command '{}': {:?}",
                ctx.command().qualified_name,
                error
            );
            let text = format!("❌ An unexpected error occurred: {error}");
            if let Err(e) = autodelete::respond(ctx, text).await {
                error!("Failed to report command error: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}
