//! Duration parser — natural-language duration phrases to expiry rules.
//!
//! "for the next week" bounds a recurring schedule to seven days from
//! creation; "3 times" bounds it to a firing count. Absence of a duration
//! phrase means the schedule never self-expires.

use chrono::Duration;

use shadehub_domain::error::SchedulePhraseError;
use shadehub_domain::schedule::Expiry;
use shadehub_domain::time::Timestamp;

/// Parse an optional duration phrase into an expiry rule anchored at
/// `created_at`.
///
/// # Errors
///
/// Returns [`SchedulePhraseError::UnrecognizedDuration`] when a phrase is
/// present but not understood — never silently defaulted.
pub fn parse_expiry(
    phrase: Option<&str>,
    created_at: Timestamp,
) -> Result<Expiry, SchedulePhraseError> {
    let Some(text) = phrase.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Expiry::Never);
    };

    let lower = text.to_lowercase();
    let normalized = strip_filler(&lower);

    if let Some(n) = parse_firing_count(normalized) {
        return Ok(Expiry::AfterFirings { n });
    }
    if let Some(days) = parse_day_span(normalized) {
        return Ok(Expiry::At {
            at: created_at + Duration::days(days),
        });
    }
    Err(SchedulePhraseError::UnrecognizedDuration(text.to_string()))
}

/// Drop the leading filler words of phrases like "for the next 3 days".
fn strip_filler(text: &str) -> &str {
    let mut rest = text;
    for filler in ["for ", "the ", "next ", "coming "] {
        if let Some(stripped) = rest.strip_prefix(filler) {
            rest = stripped;
        }
    }
    rest.trim()
}

/// `once`, `twice`, `3 times`.
fn parse_firing_count(text: &str) -> Option<u32> {
    match text {
        "once" | "one time" => return Some(1),
        "twice" | "two times" => return Some(2),
        _ => {}
    }
    let (count_text, unit) = text.rsplit_once(' ')?;
    if matches!(unit, "times" | "firings") {
        count_token(count_text.trim())
    } else {
        None
    }
}

/// `3 days`, `two weeks`, `a month`, `week`.
fn parse_day_span(text: &str) -> Option<i64> {
    // A bare unit means one of it: "week" is "for the next week".
    if let Some(days) = unit_days(text) {
        return Some(days);
    }

    let (count_text, unit) = text.rsplit_once(' ')?;
    let count = i64::from(count_token(count_text.trim())?);
    let per_unit = unit_days(unit.trim())?;
    Some(count * per_unit)
}

/// Days per unit word, with the original's 7/30-day expansions.
fn unit_days(unit: &str) -> Option<i64> {
    match unit {
        "day" | "days" => Some(1),
        "week" | "weeks" => Some(7),
        "month" | "months" => Some(30),
        _ => None,
    }
}

/// A count written as digits or as a small number word.
pub(crate) fn count_token(text: &str) -> Option<u32> {
    if let Ok(value) = text.parse::<u32>() {
        return Some(value);
    }
    match text {
        "a" | "an" | "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn created() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 8, 7, 12, 0, 0).unwrap()
    }

    #[test]
    fn should_default_to_never_without_a_phrase() {
        assert_eq!(parse_expiry(None, created()).unwrap(), Expiry::Never);
        assert_eq!(parse_expiry(Some("  "), created()).unwrap(), Expiry::Never);
    }

    #[test]
    fn should_parse_week_phrases_to_seven_day_deadlines() {
        for phrase in ["for the next week", "for a week", "week", "1 week"] {
            let expiry = parse_expiry(Some(phrase), created()).unwrap();
            assert_eq!(
                expiry,
                Expiry::At {
                    at: created() + Duration::days(7)
                },
                "phrase: {phrase}"
            );
        }
    }

    #[test]
    fn should_parse_counted_day_phrases() {
        let expiry = parse_expiry(Some("for 3 days"), created()).unwrap();
        assert_eq!(
            expiry,
            Expiry::At {
                at: created() + Duration::days(3)
            }
        );

        let expiry = parse_expiry(Some("for the next 5 days"), created()).unwrap();
        assert_eq!(
            expiry,
            Expiry::At {
                at: created() + Duration::days(5)
            }
        );
    }

    #[test]
    fn should_parse_number_words() {
        let expiry = parse_expiry(Some("for two weeks"), created()).unwrap();
        assert_eq!(
            expiry,
            Expiry::At {
                at: created() + Duration::days(14)
            }
        );
    }

    #[test]
    fn should_expand_months_to_thirty_days() {
        let expiry = parse_expiry(Some("for a month"), created()).unwrap();
        assert_eq!(
            expiry,
            Expiry::At {
                at: created() + Duration::days(30)
            }
        );
    }

    #[test]
    fn should_parse_firing_counts() {
        assert_eq!(
            parse_expiry(Some("once"), created()).unwrap(),
            Expiry::AfterFirings { n: 1 }
        );
        assert_eq!(
            parse_expiry(Some("3 times"), created()).unwrap(),
            Expiry::AfterFirings { n: 3 }
        );
        assert_eq!(
            parse_expiry(Some("twice"), created()).unwrap(),
            Expiry::AfterFirings { n: 2 }
        );
    }

    #[test]
    fn should_fail_on_unrecognized_phrases() {
        assert_eq!(
            parse_expiry(Some("until the heat death of the universe"), created()),
            Err(SchedulePhraseError::UnrecognizedDuration(
                "until the heat death of the universe".to_string()
            ))
        );
        assert_eq!(
            parse_expiry(Some("for 3 fortnights"), created()),
            Err(SchedulePhraseError::UnrecognizedDuration(
                "for 3 fortnights".to_string()
            ))
        );
    }
}
