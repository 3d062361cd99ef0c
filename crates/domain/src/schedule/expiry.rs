//! Expiry — when a schedule stops firing on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Self-expiry rule for a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expiry {
    /// The schedule lives until cancelled.
    Never,
    /// The schedule expires at a fixed instant, regardless of trigger.
    At { at: DateTime<Utc> },
    /// The schedule expires after its n-th firing.
    AfterFirings { n: u32 },
}

impl Expiry {
    /// Whether the deadline (if any) has passed.
    #[must_use]
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        matches!(self, Self::At { at } if *at <= now)
    }

    /// Whether a schedule that has fired `firings` times is spent.
    #[must_use]
    pub fn firings_spent(&self, firings: u32) -> bool {
        matches!(self, Self::AfterFirings { n } if firings >= *n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn should_never_expire_without_a_rule() {
        let now = Utc.with_ymd_and_hms(2025, 8, 9, 12, 0, 0).unwrap();
        assert!(!Expiry::Never.deadline_passed(now));
        assert!(!Expiry::Never.firings_spent(u32::MAX));
    }

    #[test]
    fn should_expire_at_the_deadline_inclusive() {
        let at = Utc.with_ymd_and_hms(2025, 8, 9, 12, 0, 0).unwrap();
        let expiry = Expiry::At { at };
        assert!(!expiry.deadline_passed(at - chrono::Duration::seconds(1)));
        assert!(expiry.deadline_passed(at));
        assert!(expiry.deadline_passed(at + chrono::Duration::days(1)));
    }

    #[test]
    fn should_expire_once_firing_count_is_reached() {
        let expiry = Expiry::AfterFirings { n: 2 };
        assert!(!expiry.firings_spent(1));
        assert!(expiry.firings_spent(2));
        assert!(expiry.firings_spent(3));
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let expiries = vec![
            Expiry::Never,
            Expiry::At {
                at: Utc.with_ymd_and_hms(2025, 8, 16, 0, 0, 0).unwrap(),
            },
            Expiry::AfterFirings { n: 1 },
        ];
        for expiry in &expiries {
            let json = serde_json::to_string(expiry).unwrap();
            let parsed: Expiry = serde_json::from_str(&json).unwrap();
            assert_eq!(&parsed, expiry);
        }
    }
}
