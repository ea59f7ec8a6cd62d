//! State machine behind the interactive "schedule a message" flow.
//!
//! The wizard knows nothing about select menus or buttons. A front end shows
//! the options for the current [`WizardStep`], waits up to
//! [`WizardStep::timeout`] for the user, and feeds the answer back as a
//! [`WizardInput`].
//!
//! ```text
//! SelectChannel -> SelectDate -> SelectHour -> SelectMinute -> EnterContent -> Confirm
//!                                                                                 |
//!                                                        Scheduled / Cancelled <--+
//! (any non-terminal step) --Timeout--> TimedOut, --Abort--> Cancelled
//! ```

use chrono::{DateTime, Duration as ChronoDuration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use herald_common::ChannelId;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Minutes offered by the minute picker.
pub const MINUTE_OPTIONS: [u32; 4] = [0, 15, 30, 45];

/// Hours offered by the hour picker.
pub const HOUR_OPTIONS: RangeInclusive<u32> = 0..=23;

/// Where the wizard currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardStep {
    /// Waiting for the destination channel.
    SelectChannel,
    /// Waiting for the day.
    SelectDate,
    /// Waiting for the hour.
    SelectHour,
    /// Waiting for the minute.
    SelectMinute,
    /// Waiting for the message body.
    EnterContent,
    /// Waiting for confirmation.
    Confirm,
    /// Confirmed; the request is ready.
    Scheduled,
    /// Declined or aborted by the user.
    Cancelled,
    /// The user did not answer in time.
    TimedOut,
}

impl WizardStep {
    /// Whether the flow has ended.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Scheduled | Self::Cancelled | Self::TimedOut)
    }

    /// How long the front end waits for input at this step.
    pub const fn timeout(self) -> Option<Duration> {
        match self {
            Self::SelectChannel
            | Self::SelectDate
            | Self::SelectHour
            | Self::SelectMinute
            | Self::Confirm => Some(Duration::from_secs(60)),
            Self::EnterContent => Some(Duration::from_secs(300)),
            Self::Scheduled | Self::Cancelled | Self::TimedOut => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SelectChannel => "channel selection",
            Self::SelectDate => "date selection",
            Self::SelectHour => "hour selection",
            Self::SelectMinute => "minute selection",
            Self::EnterContent => "message entry",
            Self::Confirm => "confirmation",
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

/// An answer from the user, or the absence of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardInput {
    /// A destination channel.
    Channel(ChannelId),
    /// A day in the wizard's time zone.
    Date(NaiveDate),
    /// An hour, 0-23.
    Hour(u32),
    /// A minute, one of [`MINUTE_OPTIONS`].
    Minute(u32),
    /// The message body.
    Content(String),
    /// Confirm the summary.
    Confirm,
    /// Decline the summary.
    Decline,
    /// No answer within the step's timeout.
    Timeout,
    /// The user left the flow.
    Abort,
}

/// Input the wizard refused. The step is unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// The input does not answer the current step.
    #[error("unexpected input during {step}")]
    UnexpectedInput {
        /// Step that was waiting.
        step: WizardStep,
    },
    /// The date is outside the selectable window.
    #[error("date {0} is outside the selectable range")]
    DateOutOfRange(NaiveDate),
    /// Hour outside 0-23.
    #[error("hour {0} is not between 0 and 23")]
    InvalidHour(u32),
    /// Minute not in [`MINUTE_OPTIONS`].
    #[error("minute {0} is not one of 0, 15, 30, 45")]
    InvalidMinute(u32),
    /// Blank message body.
    #[error("message content is empty")]
    EmptyContent,
    /// The chosen wall time is skipped by a DST transition.
    #[error("{0} does not exist in the configured time zone")]
    NonexistentLocalTime(NaiveDateTime),
    /// The flow already ended.
    #[error("the wizard has already finished ({0})")]
    Finished(WizardStep),
    /// A value needed for the request is missing.
    #[error("the wizard has not collected a complete request yet")]
    Incomplete,
}

/// A confirmed request, ready for [`ScheduleRegistry::schedule`](crate::ScheduleRegistry::schedule).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// Destination channel.
    pub destination: ChannelId,
    /// Delivery time in UTC.
    pub fire_at: DateTime<Utc>,
    /// Message body.
    pub payload: String,
}

/// Collects channel, date, time and content, one step at a time.
#[derive(Debug, Clone)]
pub struct ScheduleWizard {
    tz: Tz,
    today: NaiveDate,
    selectable_days: u32,
    step: WizardStep,
    channel: Option<ChannelId>,
    date: Option<NaiveDate>,
    hour: Option<u32>,
    minute: Option<u32>,
    content: Option<String>,
}

impl ScheduleWizard {
    /// Starts a wizard whose date window begins at `today` in `tz`.
    pub fn new(tz: Tz, today: NaiveDate, selectable_days: u32) -> Self {
        Self {
            tz,
            today,
            selectable_days: selectable_days.max(1),
            step: WizardStep::SelectChannel,
            channel: None,
            date: None,
            hour: None,
            minute: None,
            content: None,
        }
    }

    /// Starts a wizard for the local day containing `now`.
    pub fn starting_at(tz: Tz, now: DateTime<Utc>, selectable_days: u32) -> Self {
        Self::new(tz, now.with_timezone(&tz).date_naive(), selectable_days)
    }

    /// Current step.
    pub const fn step(&self) -> WizardStep {
        self.step
    }

    /// Time zone used for dates and times.
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// Days offered by the date picker, starting today.
    pub fn date_options(&self) -> Vec<NaiveDate> {
        (0..self.selectable_days)
            .filter_map(|offset| {
                self.today
                    .checked_add_signed(ChronoDuration::days(i64::from(offset)))
            })
            .collect()
    }

    /// Hours offered for the chosen date. An hour that lies wholly inside a
    /// DST gap is left out.
    pub fn hour_options(&self) -> Vec<u32> {
        HOUR_OPTIONS
            .filter(|hour| MINUTE_OPTIONS.iter().any(|minute| self.exists(*hour, *minute)))
            .collect()
    }

    /// Minutes offered for the chosen date and hour, skipping any inside a DST gap.
    pub fn minute_options(&self) -> Vec<u32> {
        MINUTE_OPTIONS
            .into_iter()
            .filter(|minute| self.hour.map_or(true, |hour| self.exists(hour, *minute)))
            .collect()
    }

    fn exists(&self, hour: u32, minute: u32) -> bool {
        let Some(date) = self.date else {
            return true;
        };
        NaiveTime::from_hms_opt(hour, minute, 0).is_some_and(|time| {
            !matches!(self.tz.from_local_datetime(&date.and_time(time)), LocalResult::None)
        })
    }

    /// Feeds one input and returns the resulting step.
    ///
    /// # Errors
    ///
    /// Rejected input leaves the wizard where it was; see [`WizardError`].
    pub fn advance(&mut self, input: WizardInput) -> Result<WizardStep, WizardError> {
        if self.step.is_terminal() {
            return Err(WizardError::Finished(self.step));
        }

        let next = match (self.step, input) {
            (_, WizardInput::Timeout) => WizardStep::TimedOut,
            (_, WizardInput::Abort) => WizardStep::Cancelled,
            (WizardStep::SelectChannel, WizardInput::Channel(channel)) => {
                self.channel = Some(channel);
                WizardStep::SelectDate
            }
            (WizardStep::SelectDate, WizardInput::Date(date)) => {
                if !self.date_options().contains(&date) {
                    return Err(WizardError::DateOutOfRange(date));
                }
                self.date = Some(date);
                WizardStep::SelectHour
            }
            (WizardStep::SelectHour, WizardInput::Hour(hour)) => {
                if !HOUR_OPTIONS.contains(&hour) {
                    return Err(WizardError::InvalidHour(hour));
                }
                if !self.hour_options().contains(&hour) {
                    let local = self
                        .date
                        .and_then(|date| date.and_hms_opt(hour, 0, 0))
                        .ok_or(WizardError::Incomplete)?;
                    return Err(WizardError::NonexistentLocalTime(local));
                }
                self.hour = Some(hour);
                WizardStep::SelectMinute
            }
            (WizardStep::SelectMinute, WizardInput::Minute(minute)) => {
                if !MINUTE_OPTIONS.contains(&minute) {
                    return Err(WizardError::InvalidMinute(minute));
                }
                if !self.minute_options().contains(&minute) {
                    let local = self
                        .date
                        .zip(self.hour)
                        .and_then(|(date, hour)| date.and_hms_opt(hour, minute, 0))
                        .ok_or(WizardError::Incomplete)?;
                    return Err(WizardError::NonexistentLocalTime(local));
                }
                self.minute = Some(minute);
                WizardStep::EnterContent
            }
            (WizardStep::EnterContent, WizardInput::Content(content)) => {
                if content.trim().is_empty() {
                    return Err(WizardError::EmptyContent);
                }
                self.content = Some(content);
                WizardStep::Confirm
            }
            (WizardStep::Confirm, WizardInput::Confirm) => WizardStep::Scheduled,
            (WizardStep::Confirm, WizardInput::Decline) => WizardStep::Cancelled,
            (step, _) => return Err(WizardError::UnexpectedInput { step }),
        };

        self.step = next;
        Ok(next)
    }

    /// Chosen wall-clock time in the wizard's zone, once date, hour and minute are known.
    pub fn local_time(&self) -> Option<NaiveDateTime> {
        let time = NaiveTime::from_hms_opt(self.hour?, self.minute?, 0)?;
        Some(self.date?.and_time(time))
    }

    /// The chosen time converted to UTC.
    ///
    /// During a DST fall-back the earlier of the two instants is used.
    ///
    /// # Errors
    ///
    /// [`WizardError::Incomplete`] before the time is chosen,
    /// [`WizardError::NonexistentLocalTime`] inside a DST gap.
    pub fn fire_at(&self) -> Result<DateTime<Utc>, WizardError> {
        let local = self.local_time().ok_or(WizardError::Incomplete)?;
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => Ok(at.with_timezone(&Utc)),
            LocalResult::None => Err(WizardError::NonexistentLocalTime(local)),
        }
    }

    /// The confirmed request.
    ///
    /// # Errors
    ///
    /// [`WizardError::Incomplete`] unless the wizard reached
    /// [`WizardStep::Scheduled`], or the errors of [`ScheduleWizard::fire_at`].
    pub fn request(&self) -> Result<ScheduleRequest, WizardError> {
        if self.step != WizardStep::Scheduled {
            return Err(WizardError::Incomplete);
        }
        let destination = self.channel.ok_or(WizardError::Incomplete)?;
        let payload = self.content.clone().ok_or(WizardError::Incomplete)?;
        Ok(ScheduleRequest {
            destination,
            fire_at: self.fire_at()?,
            payload,
        })
    }

    /// Text shown at the confirmation step.
    pub fn summary(&self) -> String {
        let channel = self
            .channel
            .map_or_else(|| "?".to_string(), ChannelId::mention);
        let date = self
            .date
            .map_or_else(|| "?".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let time = match (self.hour, self.minute) {
            (Some(h), Some(m)) => format!("{h:02}:{m:02}"),
            _ => "?".to_string(),
        };
        format!(
            "📋 **Please confirm the scheduled message:**\n\
             **Channel:** {channel}\n\
             **Date:** {date}\n\
             **Time:** {time} {}\n\
             **Message:** {}",
            self.tz.name(),
            self.content.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Berlin;
    use herald_common::test_utils::discord_fixtures;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn wizard_at(today: NaiveDate) -> ScheduleWizard {
        ScheduleWizard::new(Berlin, today, 7)
    }

    fn fill(wizard: &mut ScheduleWizard, date: NaiveDate, hour: u32, minute: u32) {
        wizard
            .advance(WizardInput::Channel(discord_fixtures::test_channel_id()))
            .unwrap();
        wizard.advance(WizardInput::Date(date)).unwrap();
        wizard.advance(WizardInput::Hour(hour)).unwrap();
        wizard.advance(WizardInput::Minute(minute)).unwrap();
    }

    #[test]
    fn test_happy_path() {
        let today = day(2024, 6, 1);
        let mut wizard = wizard_at(today);
        assert_eq!(wizard.step(), WizardStep::SelectChannel);

        fill(&mut wizard, day(2024, 6, 3), 14, 30);
        assert_eq!(wizard.step(), WizardStep::EnterContent);
        assert_eq!(
            wizard.advance(WizardInput::Content("Maintenance tonight".to_string())),
            Ok(WizardStep::Confirm)
        );
        assert!(wizard.summary().contains("**Time:** 14:30 Europe/Berlin"));
        assert!(wizard.summary().contains("Maintenance tonight"));

        assert_eq!(wizard.advance(WizardInput::Confirm), Ok(WizardStep::Scheduled));
        let request = wizard.request().unwrap();
        assert_eq!(request.destination, discord_fixtures::test_channel_id());
        assert_eq!(request.payload, "Maintenance tonight");
        // Berlin is UTC+2 in June.
        assert_eq!(
            request.fire_at,
            Utc.with_ymd_and_hms(2024, 6, 3, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_date_options_window() {
        let wizard = wizard_at(day(2024, 12, 29));
        let options = wizard.date_options();
        assert_eq!(options.len(), 7);
        assert_eq!(options[0], day(2024, 12, 29));
        assert_eq!(options[6], day(2025, 1, 4));
    }

    #[test]
    fn test_starting_at_uses_local_day() {
        // 23:30 UTC on May 31 is already June 1 in Berlin.
        let now = Utc.with_ymd_and_hms(2024, 5, 31, 23, 30, 0).unwrap();
        let wizard = ScheduleWizard::starting_at(Berlin, now, 7);
        assert_eq!(wizard.date_options()[0], day(2024, 6, 1));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let today = day(2024, 6, 1);
        let mut wizard = wizard_at(today);
        wizard
            .advance(WizardInput::Channel(discord_fixtures::test_channel_id()))
            .unwrap();

        assert_eq!(
            wizard.advance(WizardInput::Date(day(2024, 6, 8))),
            Err(WizardError::DateOutOfRange(day(2024, 6, 8)))
        );
        assert_eq!(
            wizard.advance(WizardInput::Date(day(2024, 5, 31))),
            Err(WizardError::DateOutOfRange(day(2024, 5, 31)))
        );
        wizard.advance(WizardInput::Date(today)).unwrap();

        assert_eq!(wizard.advance(WizardInput::Hour(24)), Err(WizardError::InvalidHour(24)));
        wizard.advance(WizardInput::Hour(0)).unwrap();

        assert_eq!(wizard.advance(WizardInput::Minute(10)), Err(WizardError::InvalidMinute(10)));
        assert_eq!(wizard.step(), WizardStep::SelectMinute);
        wizard.advance(WizardInput::Minute(45)).unwrap();

        assert_eq!(
            wizard.advance(WizardInput::Content("  ".to_string())),
            Err(WizardError::EmptyContent)
        );
        assert_eq!(wizard.step(), WizardStep::EnterContent);
    }

    #[test]
    fn test_unexpected_input_keeps_step() {
        let mut wizard = wizard_at(day(2024, 6, 1));
        assert_eq!(
            wizard.advance(WizardInput::Hour(3)),
            Err(WizardError::UnexpectedInput {
                step: WizardStep::SelectChannel
            })
        );
        assert_eq!(wizard.step(), WizardStep::SelectChannel);
    }

    #[test]
    fn test_timeout_from_any_open_step() {
        let mut wizard = wizard_at(day(2024, 6, 1));
        fill(&mut wizard, day(2024, 6, 2), 9, 0);
        assert_eq!(wizard.advance(WizardInput::Timeout), Ok(WizardStep::TimedOut));
        assert_eq!(
            wizard.advance(WizardInput::Content("late".to_string())),
            Err(WizardError::Finished(WizardStep::TimedOut))
        );
        assert_eq!(wizard.request(), Err(WizardError::Incomplete));
    }

    #[test]
    fn test_decline_and_abort_cancel() {
        let mut declined = wizard_at(day(2024, 6, 1));
        fill(&mut declined, day(2024, 6, 2), 9, 0);
        declined
            .advance(WizardInput::Content("hi".to_string()))
            .unwrap();
        assert_eq!(declined.advance(WizardInput::Decline), Ok(WizardStep::Cancelled));

        let mut aborted = wizard_at(day(2024, 6, 1));
        assert_eq!(aborted.advance(WizardInput::Abort), Ok(WizardStep::Cancelled));
        assert!(aborted.step().is_terminal());
    }

    #[test]
    fn test_step_timeouts() {
        assert_eq!(WizardStep::SelectHour.timeout(), Some(Duration::from_secs(60)));
        assert_eq!(WizardStep::EnterContent.timeout(), Some(Duration::from_secs(300)));
        assert_eq!(WizardStep::Scheduled.timeout(), None);
    }

    #[test]
    fn test_dst_gap_hour_is_rejected_at_hour_step() {
        // Berlin skips 02:00-03:00 on 2024-03-31.
        let mut wizard = wizard_at(day(2024, 3, 30));
        wizard
            .advance(WizardInput::Channel(discord_fixtures::test_channel_id()))
            .unwrap();
        wizard.advance(WizardInput::Date(day(2024, 3, 31))).unwrap();

        let hours = wizard.hour_options();
        assert_eq!(hours.len(), 23);
        assert!(!hours.contains(&2));
        assert_eq!(
            wizard.advance(WizardInput::Hour(2)),
            Err(WizardError::NonexistentLocalTime(
                day(2024, 3, 31).and_hms_opt(2, 0, 0).unwrap()
            ))
        );
        assert_eq!(wizard.step(), WizardStep::SelectHour);

        assert_eq!(wizard.advance(WizardInput::Hour(3)), Ok(WizardStep::SelectMinute));
        assert_eq!(wizard.minute_options(), MINUTE_OPTIONS.to_vec());
    }

    #[test]
    fn test_dst_gap_minutes_are_rejected_at_minute_step() {
        // Lord Howe Island moves from 02:00 straight to 02:30 on 2024-10-06.
        let tz = chrono_tz::Australia::Lord_Howe;
        let mut wizard = ScheduleWizard::new(tz, day(2024, 10, 5), 7);
        wizard
            .advance(WizardInput::Channel(discord_fixtures::test_channel_id()))
            .unwrap();
        wizard.advance(WizardInput::Date(day(2024, 10, 6))).unwrap();
        assert!(wizard.hour_options().contains(&2));
        wizard.advance(WizardInput::Hour(2)).unwrap();

        assert_eq!(wizard.minute_options(), vec![30, 45]);
        assert_eq!(
            wizard.advance(WizardInput::Minute(15)),
            Err(WizardError::NonexistentLocalTime(
                day(2024, 10, 6).and_hms_opt(2, 15, 0).unwrap()
            ))
        );
        assert_eq!(wizard.step(), WizardStep::SelectMinute);
        assert_eq!(wizard.local_time(), None);

        assert_eq!(wizard.advance(WizardInput::Minute(30)), Ok(WizardStep::EnterContent));
        assert!(wizard.fire_at().is_ok());
    }

    #[test]
    fn test_dst_overlap_takes_earlier_instant() {
        // 02:30 happens twice in Berlin on 2024-10-27; the first is 00:30 UTC.
        let mut wizard = wizard_at(day(2024, 10, 26));
        fill(&mut wizard, day(2024, 10, 27), 2, 30);
        assert_eq!(
            wizard.fire_at().unwrap(),
            Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap()
        );
    }

    proptest! {
        #[test]
        fn test_fire_at_round_trips_to_local_time(
            offset in 0u32..7,
            hour in 4u32..=23,
            minute_index in 0usize..4,
        ) {
            let today = day(2024, 7, 1);
            let date = today + ChronoDuration::days(i64::from(offset));
            let minute = MINUTE_OPTIONS[minute_index];
            let mut wizard = wizard_at(today);
            fill(&mut wizard, date, hour, minute);

            let local = wizard.fire_at().unwrap().with_timezone(&Berlin).naive_local();
            prop_assert_eq!(Some(local), wizard.local_time());
        }
    }
}
