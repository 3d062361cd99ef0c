//! Schedule phrase parser — raw time/date/recurrence phrases to triggers.
//!
//! The NLU collaborator hands schedule timing through verbatim
//! (`"sunset+15m"`, `"9pm"`, `"15 minutes after sunset"`, `"daily"`); this
//! module is the deterministic grammar that turns those phrases into a
//! [`Trigger`]. Ambiguous or unparseable phrases fail with a typed error —
//! they are never silently defaulted to "now" or "today".

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use shadehub_domain::error::SchedulePhraseError;
use shadehub_domain::intent::ScheduleDraft;
use shadehub_domain::location::Location;
use shadehub_domain::schedule::{DayOfWeek, RecurringTime, Trigger};
use shadehub_domain::solar::SolarAnchor;

use crate::duration::count_token;

/// The time-of-day part of a phrase, before recurrence is applied.
#[derive(Debug, PartialEq, Eq)]
enum TimeSpec {
    Clock { hour: u8, minute: u8 },
    Solar {
        anchor: SolarAnchor,
        offset_minutes: i32,
    },
    /// "in 2 hours", "now+30m" — only meaningful for one-shot schedules.
    FromNow { minutes: i64 },
}

#[derive(Debug, PartialEq, Eq)]
enum Recurrence {
    Once,
    Days(Vec<DayOfWeek>),
}

/// Parse a schedule draft's phrases into a concrete trigger.
///
/// # Errors
///
/// Returns [`SchedulePhraseError`] when the time phrase is missing, any
/// phrase is unrecognized, or a one-shot clock time lands on a date that
/// has already passed.
pub fn parse_trigger(
    draft: &ScheduleDraft,
    now: DateTime<Utc>,
    location: &Location,
) -> Result<Trigger, SchedulePhraseError> {
    let time_phrase = draft
        .time_phrase
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SchedulePhraseError::MissingTimePhrase)?;

    let time = parse_time_phrase(time_phrase)?;
    let has_duration = draft
        .duration_phrase
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());
    let recurrence = parse_recurrence(draft.recurrence_phrase.as_deref(), has_duration)?;

    match (recurrence, time) {
        (Recurrence::Once, TimeSpec::Solar {
            anchor,
            offset_minutes,
        }) => Ok(Trigger::SolarRelative {
            anchor,
            offset_minutes,
        }),
        (Recurrence::Once, TimeSpec::FromNow { minutes }) => Ok(Trigger::Absolute {
            at: now + Duration::minutes(minutes),
        }),
        (Recurrence::Once, TimeSpec::Clock { hour, minute }) => {
            let at = resolve_one_shot_clock(
                hour,
                minute,
                draft.date_phrase.as_deref(),
                now,
                location,
            )?;
            Ok(Trigger::Absolute { at })
        }
        (Recurrence::Days(days), TimeSpec::Clock { hour, minute }) => Ok(Trigger::Recurring {
            time: RecurringTime::Clock { hour, minute },
            days,
        }),
        (Recurrence::Days(days), TimeSpec::Solar {
            anchor,
            offset_minutes,
        }) => Ok(Trigger::Recurring {
            time: RecurringTime::Solar {
                anchor,
                offset_minutes,
            },
            days,
        }),
        (Recurrence::Days(_), TimeSpec::FromNow { .. }) => Err(
            SchedulePhraseError::UnrecognizedTime(time_phrase.to_string()),
        ),
    }
}

/// Resolve a one-shot clock time against the date phrase. A time already
/// past today (with no explicit future date) rolls to tomorrow.
fn resolve_one_shot_clock(
    hour: u8,
    minute: u8,
    date_phrase: Option<&str>,
    now: DateTime<Utc>,
    location: &Location,
) -> Result<DateTime<Utc>, SchedulePhraseError> {
    let civil = NaiveTime::from_hms_opt(u32::from(hour), u32::from(minute), 0)
        .ok_or_else(|| SchedulePhraseError::UnrecognizedTime(format!("{hour}:{minute:02}")))?;
    let today = location.local_date(now);

    let phrase = date_phrase.map(str::trim).filter(|s| !s.is_empty());
    match phrase.map(str::to_lowercase).as_deref() {
        None | Some("today") => {
            let candidate = location.instant_at(today, civil);
            if candidate > now {
                Ok(candidate)
            } else {
                Ok(location.instant_at(today + Duration::days(1), civil))
            }
        }
        Some("tomorrow") => Ok(location.instant_at(today + Duration::days(1), civil)),
        Some(other) => {
            let date = NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map_err(|_| SchedulePhraseError::UnrecognizedDate(other.to_string()))?;
            let candidate = location.instant_at(date, civil);
            if candidate > now {
                Ok(candidate)
            } else {
                Err(SchedulePhraseError::UnrecognizedDate(other.to_string()))
            }
        }
    }
}

fn parse_time_phrase(phrase: &str) -> Result<TimeSpec, SchedulePhraseError> {
    let lower = phrase.to_lowercase();
    let text = lower.trim();

    if let Some(spec) = parse_symbolic_solar(text) {
        return Ok(spec);
    }
    if let Some(spec) = parse_verbal_solar(text) {
        return Ok(spec);
    }
    if let Some(minutes) = parse_from_now(text) {
        return Ok(TimeSpec::FromNow { minutes });
    }
    if let Some((hour, minute)) = parse_clock(text) {
        return Ok(TimeSpec::Clock { hour, minute });
    }
    Err(SchedulePhraseError::UnrecognizedTime(phrase.to_string()))
}

/// `sunset`, `sunrise`, `sunset+15m`, `sunrise-30m`, `sunset + 2h`.
fn parse_symbolic_solar(text: &str) -> Option<TimeSpec> {
    let (anchor, rest) = if let Some(rest) = text.strip_prefix("sunrise") {
        (SolarAnchor::Sunrise, rest)
    } else if let Some(rest) = text.strip_prefix("sunset") {
        (SolarAnchor::Sunset, rest)
    } else {
        return None;
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return Some(TimeSpec::Solar {
            anchor,
            offset_minutes: 0,
        });
    }

    let (sign, magnitude) = match rest.split_at(1) {
        ("+", magnitude) => (1, magnitude),
        ("-", magnitude) => (-1, magnitude),
        _ => return None,
    };
    let minutes = parse_offset_magnitude(magnitude.trim())?;
    Some(TimeSpec::Solar {
        anchor,
        offset_minutes: sign * minutes,
    })
}

/// `15 minutes after sunset`, `half an hour before sunrise`, `after sunset`.
fn parse_verbal_solar(text: &str) -> Option<TimeSpec> {
    let (quantity, direction, anchor_word) = if let Some((lhs, rhs)) = text.split_once(" after ") {
        (lhs, 1, rhs)
    } else if let Some((lhs, rhs)) = text.split_once(" before ") {
        (lhs, -1, rhs)
    } else if let Some(rhs) = text.strip_prefix("after ") {
        ("", 1, rhs)
    } else if let Some(rhs) = text.strip_prefix("at ") {
        ("", 1, rhs)
    } else {
        return None;
    };

    let anchor = match anchor_word.trim() {
        "sunrise" => SolarAnchor::Sunrise,
        "sunset" => SolarAnchor::Sunset,
        _ => return None,
    };

    let quantity = quantity.trim();
    let minutes = if quantity.is_empty() {
        0
    } else {
        parse_verbal_quantity(quantity)?
    };
    Some(TimeSpec::Solar {
        anchor,
        offset_minutes: direction * minutes,
    })
}

/// `15 minutes`, `2 hours`, `an hour`, `half an hour`, `fifteen minutes`.
fn parse_verbal_quantity(text: &str) -> Option<i32> {
    match text {
        "half an hour" | "half hour" => return Some(30),
        "an hour" | "one hour" => return Some(60),
        _ => {}
    }

    let (count_text, unit) = text.rsplit_once(' ')?;
    let count = count_token(count_text.trim())?;
    let count = i32::try_from(count).ok()?;
    match unit {
        "minute" | "minutes" | "min" | "mins" => Some(count),
        "hour" | "hours" => Some(count * 60),
        _ => None,
    }
}

/// `now+2h`, `now+30m`, `in 2 hours`, `in 30 minutes`.
fn parse_from_now(text: &str) -> Option<i64> {
    if let Some(rest) = text.strip_prefix("now+") {
        return parse_offset_magnitude(rest.trim()).map(i64::from);
    }
    if let Some(rest) = text.strip_prefix("in ") {
        return parse_verbal_quantity(rest.trim()).map(i64::from);
    }
    None
}

/// `15m`, `2h`, `90m`.
fn parse_offset_magnitude(text: &str) -> Option<i32> {
    let (digits, unit) = text.split_at(text.len().checked_sub(1)?);
    let value: i32 = digits.trim().parse().ok()?;
    match unit {
        "m" => Some(value),
        "h" => Some(value * 60),
        _ => None,
    }
}

/// `21:00`, `9:30pm`, `9pm`, `9 pm`, `12am`.
fn parse_clock(text: &str) -> Option<(u8, u8)> {
    let (body, meridiem) = if let Some(body) = text.strip_suffix("am") {
        (body.trim(), Some("am"))
    } else if let Some(body) = text.strip_suffix("pm") {
        (body.trim(), Some("pm"))
    } else {
        (text, None)
    };

    let (hour_text, minute_text) = match body.split_once(':') {
        Some((h, m)) => (h, m),
        None => (body, "0"),
    };
    let hour: u8 = hour_text.trim().parse().ok()?;
    let minute: u8 = minute_text.trim().parse().ok()?;
    if minute > 59 {
        return None;
    }

    let hour = match meridiem {
        Some("pm") if hour != 12 => hour.checked_add(12)?,
        Some("am") if hour == 12 => 0,
        Some(_) if hour > 12 => return None,
        _ => hour,
    };
    (hour < 24).then_some((hour, minute))
}

fn parse_recurrence(
    phrase: Option<&str>,
    has_duration: bool,
) -> Result<Recurrence, SchedulePhraseError> {
    let Some(text) = phrase.map(str::trim).filter(|s| !s.is_empty()) else {
        // A bounded duration with no stated recurrence means daily
        // ("for the next week, close at sunset").
        return Ok(if has_duration {
            Recurrence::Days(DayOfWeek::ALL.to_vec())
        } else {
            Recurrence::Once
        });
    };

    let lower = text.to_lowercase();
    match lower.as_str() {
        "once" | "one time" => return Ok(Recurrence::Once),
        "daily" | "everyday" | "every day" | "each day" | "every morning" | "every evening"
        | "every afternoon" | "every night" => {
            return Ok(Recurrence::Days(DayOfWeek::ALL.to_vec()));
        }
        "weekdays" | "every weekday" => return Ok(Recurrence::Days(DayOfWeek::WEEKDAYS.to_vec())),
        "weekends" | "every weekend" => return Ok(Recurrence::Days(DayOfWeek::WEEKEND.to_vec())),
        _ => {}
    }

    let day_word = lower
        .strip_prefix("every ")
        .or_else(|| lower.strip_prefix("each "))
        .unwrap_or(&lower);
    let day_word = day_word.strip_suffix('s').unwrap_or(day_word);
    let day = match day_word {
        "monday" => DayOfWeek::Monday,
        "tuesday" => DayOfWeek::Tuesday,
        "wednesday" => DayOfWeek::Wednesday,
        "thursday" => DayOfWeek::Thursday,
        "friday" => DayOfWeek::Friday,
        "saturday" => DayOfWeek::Saturday,
        "sunday" => DayOfWeek::Sunday,
        _ => return Err(SchedulePhraseError::UnrecognizedRecurrence(text.to_string())),
    };
    Ok(Recurrence::Days(vec![day]))
}
