//! The interactive `schedule_msg` command.
//!
//! One bot message is edited in place while the user walks through the
//! [`ScheduleWizard`]: select menus for channel, date, hour and minute, a
//! plain chat message for the content, then Confirm/Cancel buttons.

use crate::autodelete::{expire_reply, respond};
use crate::{Context, Error};
use chrono::NaiveDate;
use herald_common::{format_local, truncate_string, HeraldError, UserId, MESSAGE_LIMIT};
use herald_schedule::{ScheduleError, ScheduleRegistry, ScheduleWizard, WizardInput, WizardStep};
use poise::serenity_prelude as serenity;
use poise::CreateReply;
use std::time::Duration;
use tracing::{debug, info};

/// Discord caps select menus at 25 options.
pub const MAX_SELECT_OPTIONS: usize = 25;

/// Discord caps option labels at 100 characters.
const MAX_LABEL_CHARS: usize = 100;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A channel offered by the channel picker.
pub type ChannelChoice = (serenity::ChannelId, String);

/// Component ids scoped to one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentIds {
    prefix: String,
    confirm: String,
    cancel: String,
}

impl ComponentIds {
    /// Ids for the invocation with the given poise id.
    pub fn new(invocation: u64) -> Self {
        let prefix = format!("herald-schedule-{invocation}");
        Self {
            confirm: format!("{prefix}:confirm"),
            cancel: format!("{prefix}:cancel"),
            prefix,
        }
    }

    fn select(&self, step: WizardStep) -> String {
        format!("{}:{step:?}", self.prefix)
    }

    /// Whether a component id belongs to this invocation.
    pub fn owns(&self, custom_id: &str) -> bool {
        custom_id
            .strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

/// Maps a select-menu value or button id to wizard input for `step`.
///
/// Returns `None` when the value does not answer the step.
pub fn parse_selection(step: WizardStep, value: &str, ids: &ComponentIds) -> Option<WizardInput> {
    match step {
        WizardStep::SelectChannel => value
            .parse()
            .ok()
            .map(|id| WizardInput::Channel(herald_common::ChannelId(id))),
        WizardStep::SelectDate => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .ok()
            .map(WizardInput::Date),
        WizardStep::SelectHour => value.parse().ok().map(WizardInput::Hour),
        WizardStep::SelectMinute => value.parse().ok().map(WizardInput::Minute),
        WizardStep::Confirm if value == ids.confirm => Some(WizardInput::Confirm),
        WizardStep::Confirm if value == ids.cancel => Some(WizardInput::Decline),
        _ => None,
    }
}

fn select_menu(
    custom_id: String,
    placeholder: &str,
    options: Vec<(String, String)>,
) -> serenity::CreateActionRow {
    let options = options
        .into_iter()
        .take(MAX_SELECT_OPTIONS)
        .map(|(label, value)| {
            serenity::CreateSelectMenuOption::new(truncate_string(&label, MAX_LABEL_CHARS), value)
        })
        .collect();
    serenity::CreateActionRow::SelectMenu(
        serenity::CreateSelectMenu::new(custom_id, serenity::CreateSelectMenuKind::String { options })
            .placeholder(placeholder),
    )
}

/// The prompt for the wizard's current step, with an optional warning on top.
pub fn prompt(
    wizard: &ScheduleWizard,
    channels: &[ChannelChoice],
    ids: &ComponentIds,
    notice: Option<&str>,
) -> CreateReply {
    let step = wizard.step();
    let tz = wizard.timezone().name();
    let (text, components) = match step {
        WizardStep::SelectChannel => (
            "📢 Please select a channel to send the message in:".to_string(),
            vec![select_menu(
                ids.select(step),
                "Select a channel",
                channels
                    .iter()
                    .map(|(id, name)| (format!("#{name}"), id.to_string()))
                    .collect(),
            )],
        ),
        WizardStep::SelectDate => (
            format!("📅 Please select the date (Time Zone: {tz}):"),
            vec![select_menu(
                ids.select(step),
                "Select a date",
                wizard
                    .date_options()
                    .into_iter()
                    .map(|d| (d.format("%Y-%m-%d (%A)").to_string(), d.format(DATE_FORMAT).to_string()))
                    .collect(),
            )],
        ),
        WizardStep::SelectHour => (
            format!("🕒 Please select the hour (Time Zone: {tz}):"),
            vec![select_menu(
                ids.select(step),
                "Select an hour",
                wizard
                    .hour_options()
                    .into_iter()
                    .map(|h| (format!("{h:02}"), h.to_string()))
                    .collect(),
            )],
        ),
        WizardStep::SelectMinute => (
            "🕒 Please select the minutes:".to_string(),
            vec![select_menu(
                ids.select(step),
                "Select minutes",
                wizard
                    .minute_options()
                    .into_iter()
                    .map(|m| (format!("{m:02}"), m.to_string()))
                    .collect(),
            )],
        ),
        WizardStep::EnterContent => ("💬 Please enter the message content:".to_string(), vec![]),
        WizardStep::Confirm => (
            wizard.summary(),
            vec![serenity::CreateActionRow::Buttons(vec![
                serenity::CreateButton::new(ids.confirm.clone())
                    .label("Confirm")
                    .style(serenity::ButtonStyle::Success),
                serenity::CreateButton::new(ids.cancel.clone())
                    .label("Cancel")
                    .style(serenity::ButtonStyle::Danger),
            ])],
        ),
        WizardStep::Scheduled | WizardStep::Cancelled | WizardStep::TimedOut => {
            (String::new(), vec![])
        }
    };

    let content = match notice {
        Some(notice) => format!("⚠️ {notice}\n{text}"),
        None => text,
    };
    CreateReply::default()
        .content(truncate_string(&content, MESSAGE_LIMIT))
        .components(components)
}

/// Registers the wizard's request, if any, and returns the closing text.
pub fn complete(wizard: &ScheduleWizard, registry: &ScheduleRegistry, requester: UserId) -> String {
    match wizard.step() {
        WizardStep::TimedOut => return "⏳ Operation cancelled due to timeout.".to_string(),
        WizardStep::Cancelled => return "❌ Scheduling cancelled.".to_string(),
        _ => {}
    }

    let request = match wizard.request() {
        Ok(request) => request,
        Err(e) => return format!("❌ {e}"),
    };
    match registry.schedule(request.destination, request.fire_at, request.payload, requester) {
        Ok(pending) => {
            info!(
                "{} scheduled message {} for {} in channel {}",
                requester, pending.id, pending.fire_at, pending.destination
            );
            format!(
                "⏳ Message scheduled for {} with ID `{}`.",
                format_local(pending.fire_at, wizard.timezone()),
                pending.id
            )
        }
        Err(ScheduleError::InvalidSchedule { .. }) => {
            "❌ The scheduled time is in the past. Please choose a future time.".to_string()
        }
        Err(e) => format!("❌ {e}"),
    }
}

/// Text channels the author may post in, in server order.
async fn selectable_channels(ctx: Context<'_>) -> Result<Vec<ChannelChoice>, Error> {
    let member = ctx
        .author_member()
        .await
        .ok_or("Could not resolve your server membership.")?;
    let guild = ctx
        .guild()
        .ok_or("This server is not available in the cache yet.")?;

    let mut channels: Vec<&serenity::GuildChannel> = guild
        .channels
        .values()
        .filter(|c| c.kind == serenity::ChannelType::Text)
        .filter(|c| guild.user_permissions_in(c, &member).send_messages())
        .collect();
    channels.sort_by_key(|c| (c.position, c.id));

    Ok(channels
        .into_iter()
        .take(MAX_SELECT_OPTIONS)
        .map(|c| (c.id, c.name.clone()))
        .collect())
}

/// Waits for the user's answer to `step`. `None` means the answer was not usable.
async fn next_input(
    ctx: Context<'_>,
    step: WizardStep,
    ids: &ComponentIds,
) -> Result<Option<WizardInput>, Error> {
    let timeout = step.timeout().unwrap_or(Duration::from_secs(60));

    if step == WizardStep::EnterContent {
        let message = serenity::MessageCollector::new(ctx.serenity_context())
            .author_id(ctx.author().id)
            .channel_id(ctx.channel_id())
            .timeout(timeout)
            .await;
        let Some(message) = message else {
            return Ok(Some(WizardInput::Timeout));
        };
        let content = message.content.clone();
        if let Err(e) = message.delete(ctx.serenity_context()).await {
            debug!("Could not delete scheduled content message: {}", e);
        }
        return Ok(Some(WizardInput::Content(content)));
    }

    let ids_owned = ids.clone();
    let interaction = serenity::ComponentInteractionCollector::new(ctx.serenity_context())
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(timeout)
        .filter(move |mci| ids_owned.owns(&mci.data.custom_id))
        .await;
    let Some(interaction) = interaction else {
        return Ok(Some(WizardInput::Timeout));
    };
    interaction
        .create_response(
            ctx.serenity_context(),
            serenity::CreateInteractionResponse::Acknowledge,
        )
        .await?;

    let value = match &interaction.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => values.first().cloned(),
        serenity::ComponentInteractionDataKind::Button => Some(interaction.data.custom_id.clone()),
        _ => None,
    };
    Ok(value.and_then(|v| parse_selection(step, &v, ids)))
}

/// Schedule a message to be sent later
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("schedule"),
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn schedule_msg(ctx: Context<'_>) -> Result<(), Error> {
    let config = ctx.data().config.get();
    let tz = config.scheduling.tz().map_err(HeraldError::config)?;

    let channels = selectable_channels(ctx).await?;
    if channels.is_empty() {
        respond(ctx, "❌ There are no channels you can schedule messages in.").await?;
        return Ok(());
    }

    let ids = ComponentIds::new(ctx.id());
    let mut wizard = ScheduleWizard::starting_at(
        tz,
        ctx.data().schedules.clock().now(),
        config.scheduling.selectable_days,
    );
    let reply = ctx.send(prompt(&wizard, &channels, &ids, None)).await?;

    while !wizard.step().is_terminal() {
        let notice = match next_input(ctx, wizard.step(), &ids).await? {
            None => Some("That selection is not available.".to_string()),
            Some(input) => match wizard.advance(input) {
                Ok(step) if step.is_terminal() => break,
                Ok(_) => None,
                Err(e) => {
                    debug!("Rejected wizard input: {}", e);
                    Some(e.to_string())
                }
            },
        };
        reply
            .edit(ctx, prompt(&wizard, &channels, &ids, notice.as_deref()))
            .await?;
    }

    let requester = UserId(ctx.author().id.get());
    let outcome = complete(&wizard, &ctx.data().schedules, requester);
    reply
        .edit(ctx, CreateReply::default().content(outcome).components(vec![]))
        .await?;
    expire_reply(ctx, reply).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_common::test_utils::{discord_fixtures, mock_timestamp};
    use herald_common::ChannelId;
    use herald_schedule::testing::RecordingDelivery;
    use herald_schedule::{TokioClock, TracingErrorSink};
    use std::sync::Arc;

    fn ids() -> ComponentIds {
        ComponentIds::new(42)
    }

    fn wizard() -> ScheduleWizard {
        ScheduleWizard::starting_at(chrono_tz::UTC, mock_timestamp(2024, 6, 1, 12, 0, 0), 7)
    }

    fn advance_to_confirm(wizard: &mut ScheduleWizard, hour: u32) {
        let today = wizard.date_options()[0];
        for input in [
            WizardInput::Channel(discord_fixtures::test_channel_id()),
            WizardInput::Date(today),
            WizardInput::Hour(hour),
            WizardInput::Minute(30),
            WizardInput::Content("announcement".to_string()),
        ] {
            wizard.advance(input).unwrap();
        }
    }

    #[test]
    fn test_parse_selection_per_step() {
        let ids = ids();
        assert_eq!(
            parse_selection(WizardStep::SelectChannel, "123", &ids),
            Some(WizardInput::Channel(ChannelId(123)))
        );
        assert_eq!(
            parse_selection(WizardStep::SelectDate, "2024-06-03", &ids),
            Some(WizardInput::Date(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()))
        );
        assert_eq!(
            parse_selection(WizardStep::SelectHour, "9", &ids),
            Some(WizardInput::Hour(9))
        );
        assert_eq!(
            parse_selection(WizardStep::SelectMinute, "45", &ids),
            Some(WizardInput::Minute(45))
        );
        assert_eq!(
            parse_selection(WizardStep::Confirm, "herald-schedule-42:confirm", &ids),
            Some(WizardInput::Confirm)
        );
        assert_eq!(
            parse_selection(WizardStep::Confirm, "herald-schedule-42:cancel", &ids),
            Some(WizardInput::Decline)
        );
    }

    #[test]
    fn test_parse_selection_rejects_foreign_values() {
        let ids = ids();
        assert_eq!(parse_selection(WizardStep::SelectChannel, "general", &ids), None);
        assert_eq!(parse_selection(WizardStep::SelectDate, "tomorrow", &ids), None);
        assert_eq!(
            parse_selection(WizardStep::Confirm, "herald-schedule-7:confirm", &ids),
            None
        );
        assert_eq!(parse_selection(WizardStep::EnterContent, "text", &ids), None);
    }

    #[test]
    fn test_component_ids_do_not_match_longer_invocations() {
        let ids = ComponentIds::new(4);
        assert!(ids.owns("herald-schedule-4:confirm"));
        assert!(ids.owns("herald-schedule-4:SelectHour"));
        assert!(!ids.owns("herald-schedule-42:confirm"));
        assert!(!ids.owns("herald-schedule-42:SelectHour"));
        assert!(!ids.owns("herald-schedule-4"));
        assert!(!ids.owns("other-4:confirm"));
    }

    #[test]
    fn test_hour_prompt_skips_dst_gap() {
        let mut wizard = ScheduleWizard::new(
            chrono_tz::Europe::Berlin,
            NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(),
            7,
        );
        wizard.advance(WizardInput::Channel(ChannelId(1))).unwrap();
        wizard
            .advance(WizardInput::Date(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()))
            .unwrap();

        let hours: Vec<(String, String)> = (0u32..24)
            .filter(|h| *h != 2)
            .map(|h| (format!("{h:02}"), h.to_string()))
            .collect();
        assert_eq!(hours.len(), 23);
        let expected = select_menu(ids().select(WizardStep::SelectHour), "Select an hour", hours);

        let reply = prompt(&wizard, &[], &ids(), None);
        assert_eq!(reply.components, Some(vec![expected]));
    }

    #[test]
    fn test_prompt_texts_follow_steps() {
        let ids = ids();
        let channels = vec![(serenity::ChannelId::new(1), "general".to_string())];
        let mut wizard = wizard();

        let reply = prompt(&wizard, &channels, &ids, None);
        assert_eq!(
            reply.content.as_deref(),
            Some("📢 Please select a channel to send the message in:")
        );
        assert_eq!(reply.components.map(|c| c.len()), Some(1));

        wizard
            .advance(WizardInput::Channel(ChannelId(1)))
            .unwrap();
        let reply = prompt(&wizard, &channels, &ids, Some("try again"));
        assert_eq!(
            reply.content.as_deref(),
            Some("⚠️ try again\n📅 Please select the date (Time Zone: UTC):")
        );
    }

    #[test]
    fn test_content_prompt_clears_components() {
        let mut wizard = wizard();
        let today = wizard.date_options()[0];
        for input in [
            WizardInput::Channel(ChannelId(1)),
            WizardInput::Date(today),
            WizardInput::Hour(13),
            WizardInput::Minute(0),
        ] {
            wizard.advance(input).unwrap();
        }

        let reply = prompt(&wizard, &[], &ids(), None);
        assert_eq!(
            reply.content.as_deref(),
            Some("💬 Please enter the message content:")
        );
        assert_eq!(reply.components.map(|c| c.len()), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_registers_confirmed_request() {
        let registry = ScheduleRegistry::with_parts(
            Arc::new(TokioClock::starting_at(mock_timestamp(2024, 6, 1, 12, 0, 0))),
            Arc::new(RecordingDelivery::new()),
            Arc::new(TracingErrorSink),
        );
        let mut wizard = wizard();
        advance_to_confirm(&mut wizard, 13);
        wizard.advance(WizardInput::Confirm).unwrap();

        let text = complete(&wizard, &registry, discord_fixtures::test_user_id());

        let pending = registry.list();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].payload, "announcement");
        assert_eq!(pending[0].requester, discord_fixtures::test_user_id());
        assert_eq!(
            text,
            format!(
                "⏳ Message scheduled for 2024-06-01 13:30 UTC with ID `{}`.",
                pending[0].id
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_rejects_past_time() {
        let registry = ScheduleRegistry::with_parts(
            Arc::new(TokioClock::starting_at(mock_timestamp(2024, 6, 1, 12, 0, 0))),
            Arc::new(RecordingDelivery::new()),
            Arc::new(TracingErrorSink),
        );
        let mut wizard = wizard();
        advance_to_confirm(&mut wizard, 9);
        wizard.advance(WizardInput::Confirm).unwrap();

        let text = complete(&wizard, &registry, discord_fixtures::test_user_id());

        assert!(registry.is_empty());
        assert_eq!(
            text,
            "❌ The scheduled time is in the past. Please choose a future time."
        );
    }

    #[tokio::test]
    async fn test_complete_reports_cancel_and_timeout() {
        let registry = ScheduleRegistry::new(Arc::new(RecordingDelivery::new()));

        let mut declined = wizard();
        advance_to_confirm(&mut declined, 13);
        declined.advance(WizardInput::Decline).unwrap();
        assert_eq!(
            complete(&declined, &registry, discord_fixtures::test_user_id()),
            "❌ Scheduling cancelled."
        );

        let mut idle = wizard();
        idle.advance(WizardInput::Timeout).unwrap();
        assert_eq!(
            complete(&idle, &registry, discord_fixtures::test_user_id()),
            "⏳ Operation cancelled due to timeout."
        );
        assert!(registry.is_empty());
    }
}
