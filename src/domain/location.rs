//! Venue model: identity, capacity, and weekly opening hours
//!
//! Opening hours come off the wire as `"HH:MM"` wall-clock strings keyed
//! by 1-based weekday (1=Monday..7=Sunday). A missing weekday key means
//! the venue is closed that day. The page encodes "open until midnight"
//! as a `24:xx` end time, which is not a valid time of day; it is
//! resolved at decode time into [`CloseTime::Midnight`].

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use tracing::debug;

/// Close-of-day wall time for one opening-hours entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTime {
    /// Regular time of day on the same date as the opening time.
    At(NaiveTime),
    /// The `24:xx` sentinel: 00:00 of the following calendar day.
    Midnight,
}

/// One day's opening window, as listed in the weekly table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OpeningHour {
    #[serde(deserialize_with = "deserialize_wall_time")]
    pub time_start: NaiveTime,
    #[serde(deserialize_with = "deserialize_close_time")]
    pub time_end: CloseTime,
}

/// One venue from the `locations` blob of the populartimes page.
#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub location_id: u32,
    pub name: String,
    pub max_capacity: u32,
    /// 1-based weekday index -> opening window; missing key = closed
    pub opening_hours: HashMap<u8, OpeningHour>,
}

impl Location {
    /// Opening and closing instants for the given calendar date.
    ///
    /// `None` means the venue is closed all day, which is the normal
    /// representation of a missing weekday entry, not an error. A
    /// `24:xx` end time resolves to midnight of the following day, so
    /// the close instant is always later than the open instant even
    /// across the date rollover.
    pub fn opening_window_for(&self, date: NaiveDate, tz: Tz) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
        let weekday = date.weekday().number_from_monday() as u8;
        let Some(hours) = self.opening_hours.get(&weekday) else {
            debug!(
                location_id = self.location_id,
                date = %date,
                weekday = weekday,
                "no_opening_hours_today"
            );
            return None;
        };

        let open = localize(tz, date, hours.time_start)?;
        let close = match hours.time_end {
            CloseTime::At(end) => localize(tz, date, end)?,
            CloseTime::Midnight => localize(tz, date.succ_opt()?, NaiveTime::MIN)?,
        };
        Some((open, close))
    }

    /// Whether the venue is open at the given instant.
    ///
    /// `None` when there is no window for that instant's calendar date.
    /// Both window ends are inclusive, so a venue closing at midnight is
    /// still open at the rollover instant itself.
    pub fn is_open_at(&self, now: DateTime<Tz>) -> Option<bool> {
        let (open, close) = self.opening_window_for(now.date_naive(), now.timezone())?;
        Some(open <= now && now <= close)
    }

    /// Whether the venue is open right now in the target timezone.
    pub fn is_open_now(&self, tz: Tz) -> Option<bool> {
        self.is_open_at(Utc::now().with_timezone(&tz))
    }
}

/// Attach a timezone to a naive date + time. A DST gap resolves to the
/// earliest valid instant after the gap.
fn localize(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_time(time)).earliest()
}

fn parse_wall_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

fn deserialize_wall_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_wall_time(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid opening time {s:?}")))
}

fn deserialize_close_time<'de, D>(deserializer: D) -> Result<CloseTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.starts_with("24:") {
        return Ok(CloseTime::Midnight);
    }
    parse_wall_time(&s)
        .map(CloseTime::At)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid closing time {s:?}")))
}
