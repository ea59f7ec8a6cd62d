//! Command wiring that does not need a gateway connection.

use chrono::Utc;
use herald_commands::broadcast::broadcast;
use herald_commands::response_delay::check_response_delay;
use herald_commands::scheduled::pending_lines;
use herald_commands::{commands, Data};
use herald_common::test_utils::{discord_fixtures, mock_timestamp};
use herald_common::{chunk_lines, MESSAGE_LIMIT};
use herald_config::{Config, ConfigCache};
use herald_schedule::testing::RecordingDelivery;
use herald_schedule::{ScheduleRegistry, TokioClock, TracingErrorSink};
use std::sync::Arc;
use std::time::Duration;

fn config() -> Arc<ConfigCache> {
    Arc::new(ConfigCache::new(Config::default()))
}

fn data() -> Data {
    let delivery = Arc::new(RecordingDelivery::new());
    let schedules = ScheduleRegistry::with_parts(
        Arc::new(TokioClock::starting_at(mock_timestamp(2024, 6, 1, 12, 0, 0))),
        delivery.clone(),
        Arc::new(TracingErrorSink),
    );
    Data::with_schedules(config(), schedules, delivery)
}

#[tokio::test]
async fn test_scheduled_and_broadcast_messages_share_the_client_delivery() {
    let delivery = Arc::new(RecordingDelivery::new());
    let data = Data::new(config(), delivery.clone());
    let channels = discord_fixtures::test_channel_ids(2);

    data.schedules
        .schedule(
            channels[0],
            Utc::now() + chrono::Duration::milliseconds(200),
            "later",
            discord_fixtures::test_user_id(),
        )
        .unwrap();
    let failures = broadcast(data.delivery.as_ref(), &channels[1..], "now").await;
    assert!(failures.is_empty());

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(
        delivery.calls(),
        vec![
            (channels[1], "now".to_string()),
            (channels[0], "later".to_string()),
        ]
    );
    assert!(data.schedules.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_response_delay_update_reaches_unlisted_commands() {
    let data = data();
    let default = || data.config.get().auto_delete.response_delay();
    assert_eq!(
        data.auto_delete
            .response_delay("cancel_scheduled_message", default()),
        Duration::from_secs(30)
    );

    let config = data.config.get();
    assert!(check_response_delay(12, &config.auto_delete).is_ok());
    data.config
        .modify(|c| c.auto_delete.response_delay_seconds = 12);

    assert_eq!(
        data.auto_delete
            .response_delay("cancel_scheduled_message", default()),
        Duration::from_secs(12)
    );
    assert_eq!(
        data.auto_delete.response_delay("schedule_msg", default()),
        Duration::from_secs(15)
    );
}

#[test]
fn test_default_minimum_rejects_short_delays() {
    let config = Config::default();
    assert!(check_response_delay(4, &config.auto_delete).is_err());
    assert!(check_response_delay(5, &config.auto_delete).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_listing_reflects_registry_order() {
    let data = data();
    let channel = discord_fixtures::test_channel_id();
    let user = discord_fixtures::test_user_id();
    let later = data
        .schedules
        .schedule(channel, mock_timestamp(2024, 6, 1, 15, 0, 0), "later", user)
        .unwrap();
    let sooner = data
        .schedules
        .schedule(channel, mock_timestamp(2024, 6, 1, 13, 0, 0), "sooner", user)
        .unwrap();

    let lines = pending_lines(&data.schedules.list(), chrono_tz::UTC);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(&format!("**ID:** `{}`", sooner.id)));
    assert!(lines[1].starts_with(&format!("**ID:** `{}`", later.id)));

    let chunks = chunk_lines(lines, MESSAGE_LIMIT);
    assert_eq!(chunks.len(), 1);
}

#[test]
fn test_every_command_supports_prefix_and_slash() {
    for command in commands() {
        assert!(command.prefix_action.is_some(), "{}", command.name);
        assert!(command.slash_action.is_some(), "{}", command.name);
        assert!(command.guild_only, "{}", command.name);
    }
}
