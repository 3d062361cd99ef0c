//! Location — where the house is, for solar math and local-time triggers.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ShadeHubError, ValidationError};

/// The process-wide site location, read-only after load.
///
/// All civil-time conversions (trigger times, "today", DST shifts) go
/// through `timezone` — never naive UTC.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Tz,
}

impl Location {
    /// Create a location, validating coordinate ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ShadeHubError::Validation`] when latitude is outside
    /// ±90° or longitude outside ±180°.
    pub fn new(latitude: f64, longitude: f64, timezone: Tz) -> Result<Self, ShadeHubError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude).into());
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude).into());
        }
        Ok(Self {
            latitude,
            longitude,
            timezone,
        })
    }

    /// The local calendar date at this location for a given instant.
    #[must_use]
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// Resolve a local civil time on a local date to an instant.
    ///
    /// During a DST gap the time does not exist; the earliest valid
    /// mapping after the gap is used. During a fold the earlier of the
    /// two instants is chosen.
    #[must_use]
    pub fn instant_at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        match self.timezone.from_local_datetime(&naive) {
            chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
                dt.with_timezone(&Utc)
            }
            chrono::LocalResult::None => {
                // Skipped by a DST transition; step forward past the gap.
                let shifted = naive + chrono::Duration::hours(1);
                self.timezone
                    .from_local_datetime(&shifted)
                    .earliest()
                    .map_or_else(
                        || Utc.from_utc_datetime(&naive),
                        |dt| dt.with_timezone(&Utc),
                    )
            }
        }
    }
}
