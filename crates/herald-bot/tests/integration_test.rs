//! Integration tests for herald-bot crate.

use herald_bot::{BotError, HeraldBot};
use herald_common::test_utils::{config_fixtures, init_test_logging};
use herald_common::HeraldError;
use herald_config::{ConfigError, ConfigLoader};
use poise::serenity_prelude::GatewayIntents;

#[test]
fn test_bot_holds_loaded_config() {
    init_test_logging();
    let config = ConfigLoader::parse_str(config_fixtures::full_config_yaml()).unwrap();
    let bot = HeraldBot::new(config.clone());
    assert_eq!(*bot.config(), config);
}

#[test]
fn test_intents_include_message_content() {
    let intents = HeraldBot::intents();
    assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
    assert!(intents.contains(GatewayIntents::GUILD_MESSAGES));
    assert!(intents.contains(GatewayIntents::GUILDS));
}

#[test]
fn test_error_conversions() {
    let err: BotError = ConfigError::Invalid("discord.token is required".to_string()).into();
    assert!(matches!(err, BotError::Config(_)));
    assert!(err.to_string().contains("discord.token is required"));

    let err: BotError = HeraldError::Logging("already initialised".to_string()).into();
    assert_eq!(err.to_string(), "Logging error: already initialised");
}
