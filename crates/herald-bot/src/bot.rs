//! Core bot logic using the Poise framework.

use crate::error::BotResult;
use herald_commands::{create_framework, Data};
use herald_config::{Config, ConfigCache};
use herald_schedule::ScheduleRegistry;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info};

/// Main bot structure.
pub struct HeraldBot {
    config: Arc<ConfigCache>,
}

impl HeraldBot {
    /// Creates a new bot instance.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(ConfigCache::new(config)),
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<Config> {
        self.config.get()
    }

    /// Gateway intents: prefix commands and content collection need message content.
    pub fn intents() -> serenity::GatewayIntents {
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT
    }

    /// Starts the bot and runs until the gateway closes or Ctrl-C is received.
    ///
    /// # Errors
    ///
    /// Fails when the client cannot be built or the gateway connection fails.
    pub async fn start(&self) -> BotResult<()> {
        let config = self.config.get();

        let data_config = Arc::clone(&self.config);
        let framework = create_framework(&config.discord.prefix)
            .setup(move |ctx, ready, framework| {
                Box::pin(async move {
                    info!("Bot connected as: {}", ready.user.name);
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!(
                        "Registered {} commands with prefix '{}'",
                        framework.options().commands.len(),
                        data_config.get().discord.prefix
                    );
                    let data = Data::for_client(data_config, ctx.http.clone());
                    tokio::spawn(shutdown_on_ctrl_c(
                        data.schedules.clone(),
                        Arc::clone(framework.shard_manager()),
                    ));
                    Ok(data)
                })
            })
            .build();

        let mut client = serenity::ClientBuilder::new(&config.discord.token, Self::intents())
            .framework(framework)
            .await?;

        client.start().await?;
        info!("Bot stopped");
        Ok(())
    }
}

/// Drops pending scheduled messages and closes the gateway on Ctrl-C.
async fn shutdown_on_ctrl_c(schedules: ScheduleRegistry, shard_manager: Arc<serenity::ShardManager>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
            let dropped = schedules.shutdown();
            if dropped > 0 {
                info!("Dropped {} pending scheduled messages", dropped);
            }
            shard_manager.shutdown_all().await;
        }
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
