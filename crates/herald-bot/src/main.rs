//! Main entry point for Herald.

use herald_bot::{BotResult, HeraldBot};
use herald_common::{init_logging, LoggingConfig};
use herald_config::ConfigLoader;
use tracing::{error, info};

#[tokio::main]
async fn main() -> BotResult<()> {
    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            // Logging settings live in the config, so report with defaults.
            init_logging(&LoggingConfig::default())?;
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    init_logging(&config.logging)?;

    info!("Starting Herald v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Time zone {}, text prefix '{}'",
        config.scheduling.timezone, config.discord.prefix
    );

    let bot = HeraldBot::new(config);
    if let Err(e) = bot.start().await {
        error!("Bot failed: {}", e);
        return Err(e);
    }

    Ok(())
}
