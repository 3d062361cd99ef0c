//! Trigger — when a schedule fires.
//!
//! Concrete next-fire instants are always recomputed from the trigger
//! definition; they are never cached past one firing, because solar
//! anchors drift from day to day and across seasons.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::solar::{self, SolarAnchor, SunTimes};

/// A day of the week for recurring triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// All seven days, Monday first.
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Monday through Friday.
    pub const WEEKDAYS: [Self; 5] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
    ];

    /// Saturday and Sunday.
    pub const WEEKEND: [Self; 2] = [Self::Saturday, Self::Sunday];

    #[must_use]
    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

/// The time-of-day component of a recurring trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurringTime {
    /// A fixed local clock time.
    Clock { hour: u8, minute: u8 },
    /// A solar anchor plus a signed offset in minutes.
    Solar {
        anchor: SolarAnchor,
        offset_minutes: i32,
    },
}

/// When a schedule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires once at a fixed instant.
    Absolute { at: DateTime<Utc> },
    /// Fires once at the next occurrence of a solar anchor ± offset.
    SolarRelative {
        anchor: SolarAnchor,
        offset_minutes: i32,
    },
    /// Fires on matching weekdays at a clock time or solar anchor.
    Recurring {
        time: RecurringTime,
        days: Vec<DayOfWeek>,
    },
}

impl Trigger {
    /// Whether this trigger fires at most once.
    #[must_use]
    pub fn is_one_shot(&self) -> bool {
        matches!(self, Self::Absolute { .. } | Self::SolarRelative { .. })
    }

    /// The first instant strictly after `after` at which this trigger is
    /// due, or `None` for a one-shot trigger whose moment has passed.
    ///
    /// Solar anchors are re-derived for each candidate date through the
    /// solar calculator in the location's timezone; dates without a
    /// sunrise/sunset use the fixed 06:00/18:00 fallback.
    #[must_use]
    pub fn next_fire(&self, after: DateTime<Utc>, location: &Location) -> Option<DateTime<Utc>> {
        match self {
            Self::Absolute { at } => (*at > after).then_some(*at),
            Self::SolarRelative {
                anchor,
                offset_minutes,
            } => {
                // The candidate drifts by minutes per day, so today and
                // the next two days always contain the answer.
                let start = location.local_date(after);
                for offset_days in 0..=2 {
                    let date = start + Duration::days(offset_days);
                    let candidate = solar_event(date, location, *anchor)
                        + Duration::minutes(i64::from(*offset_minutes));
                    if candidate > after {
                        return Some(candidate);
                    }
                }
                None
            }
            Self::Recurring { time, days } => {
                let start = location.local_date(after);
                for offset_days in 0..=8 {
                    let date = start + Duration::days(offset_days);
                    if !days.contains(&DayOfWeek::from_chrono(date.weekday())) {
                        continue;
                    }
                    let candidate = match time {
                        RecurringTime::Clock { hour, minute } => {
                            let civil = NaiveTime::from_hms_opt(
                                u32::from(*hour),
                                u32::from(*minute),
                                0,
                            )?;
                            location.instant_at(date, civil)
                        }
                        RecurringTime::Solar {
                            anchor,
                            offset_minutes,
                        } => {
                            solar_event(date, location, *anchor)
                                + Duration::minutes(i64::from(*offset_minutes))
                        }
                    };
                    if candidate > after {
                        return Some(candidate);
                    }
                }
                None
            }
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absolute { at } => write!(f, "at {}", at.to_rfc3339()),
            Self::SolarRelative {
                anchor,
                offset_minutes,
            } => write!(f, "{anchor}{offset_minutes:+}m"),
            Self::Recurring { time, days } => {
                match time {
                    RecurringTime::Clock { hour, minute } => {
                        write!(f, "recurring {hour:02}:{minute:02}")?;
                    }
                    RecurringTime::Solar {
                        anchor,
                        offset_minutes,
                    } => write!(f, "recurring {anchor}{offset_minutes:+}m")?,
                }
                write!(f, " on {} day(s)", days.len())
            }
        }
    }
}

/// A solar anchor instant for a local date, in UTC.
fn solar_event(
    date: chrono::NaiveDate,
    location: &Location,
    anchor: SolarAnchor,
) -> DateTime<Utc> {
    let times =
        solar::sun_times(date, location).unwrap_or_else(|| SunTimes::fallback(date, location));
    times.event(anchor).with_timezone(&Utc)
}
