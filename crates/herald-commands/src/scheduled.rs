//! Listing and cancelling pending scheduled messages.

use crate::autodelete::respond;
use crate::targets::in_current_guild;
use crate::{Context, Error};
use chrono_tz::Tz;
use herald_common::{chunk_lines, format_local, HeraldError, MESSAGE_LIMIT};
use herald_schedule::{PendingSend, ScheduleId};
use tracing::info;

/// One line per pending message, in registry order.
pub fn pending_lines(pending: &[PendingSend], tz: Tz) -> Vec<String> {
    pending
        .iter()
        .map(|p| {
            format!(
                "**ID:** `{}` | **Time:** {} | **Channel:** {} | **Author:** {}",
                p.id,
                format_local(p.fire_at, tz),
                p.destination.mention(),
                p.requester.mention()
            )
        })
        .collect()
}

/// Show all scheduled messages for this server
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("list_scheduled_msgs"),
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn show_scheduled_msgs(ctx: Context<'_>) -> Result<(), Error> {
    let tz = ctx
        .data()
        .config
        .get()
        .scheduling
        .tz()
        .map_err(HeraldError::config)?;

    let pending: Vec<PendingSend> = ctx
        .data()
        .schedules
        .list()
        .into_iter()
        .filter(|p| in_current_guild(ctx, p.destination))
        .collect();

    if pending.is_empty() {
        respond(ctx, "ℹ️ There are no scheduled messages.").await?;
        return Ok(());
    }

    for chunk in chunk_lines(pending_lines(&pending, tz), MESSAGE_LIMIT) {
        respond(ctx, chunk).await?;
    }
    Ok(())
}

/// Cancel a scheduled message by its ID
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("cancel_scheduled", "cancel_message"),
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn cancel_scheduled_message(
    ctx: Context<'_>,
    #[description = "ID shown by show_scheduled_msgs"] id: Option<ScheduleId>,
) -> Result<(), Error> {
    let Some(id) = id else {
        respond(
            ctx,
            "❌ Please provide the ID of the scheduled message to cancel.",
        )
        .await?;
        return Ok(());
    };

    let owned = ctx
        .data()
        .schedules
        .get(id)
        .is_some_and(|p| in_current_guild(ctx, p.destination));

    if owned && ctx.data().schedules.cancel(id) {
        info!("{} cancelled scheduled message {}", ctx.author().name, id);
        respond(
            ctx,
            format!("✅ Scheduled message with ID `{id}` has been cancelled."),
        )
        .await?;
    } else {
        respond(ctx, format!("❌ No scheduled message found with ID `{id}`.")).await?;
    }
    Ok(())
}
