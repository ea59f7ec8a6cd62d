//! Runtime adjustment of the default response auto-delete delay.

use crate::autodelete::respond;
use crate::{Context, Error};
use herald_config::AutoDeleteConfig;
use tracing::info;

/// Checks a requested delay against the configured minimum.
///
/// # Errors
///
/// Returns the user-facing rejection when `seconds` is below the minimum.
pub fn check_response_delay(seconds: u64, config: &AutoDeleteConfig) -> Result<(), String> {
    if seconds < config.min_response_delay_seconds {
        return Err(format!(
            "⏱️ Delay must be at least {} seconds.",
            config.min_response_delay_seconds
        ));
    }
    Ok(())
}

/// Set how long bot responses stay before they are deleted
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn set_response_delay(
    ctx: Context<'_>,
    #[description = "Delay in seconds"] seconds: u64,
) -> Result<(), Error> {
    let current = ctx.data().config.get();
    if let Err(rejection) = check_response_delay(seconds, &current.auto_delete) {
        respond(ctx, rejection).await?;
        return Ok(());
    }

    ctx.data()
        .config
        .modify(|config| config.auto_delete.response_delay_seconds = seconds);
    info!(
        "{} set the response delay to {} seconds",
        ctx.author().name,
        seconds
    );

    respond(
        ctx,
        format!("🕒 Bot response auto-delete delay set to {seconds} seconds."),
    )
    .await
}
