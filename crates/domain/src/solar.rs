//! Solar calculator — sunrise, sunset, solar noon and sun position.
//!
//! Deterministic, side-effect-free functions of (date, location) using the
//! NOAA solar equations. Callers may cache per-date results but must not
//! reuse them across the location's local midnight; nothing here caches.
//!
//! Under polar day or polar night no sunrise/sunset exists and
//! [`sun_times`] returns `None`; schedule triggers then fall back to
//! [`SunTimes::fallback`] (06:00/18:00 local).

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::location::Location;

/// Sunrise or sunset, as a reference point for relative-time triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolarAnchor {
    Sunrise,
    Sunset,
}

impl std::fmt::Display for SolarAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sunrise => f.write_str("sunrise"),
            Self::Sunset => f.write_str("sunset"),
        }
    }
}

/// The sun's place in the sky at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    /// Degrees clockwise from north, 0–360.
    pub azimuth: f64,
    /// Degrees above the horizon; negative when the sun is down.
    pub elevation: f64,
}

impl SolarPosition {
    /// Whether the sun is above the horizon.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.elevation > 0.0
    }
}

/// The day's solar events, in the location's local timezone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunTimes {
    pub sunrise: DateTime<Tz>,
    pub solar_noon: DateTime<Tz>,
    pub sunset: DateTime<Tz>,
}

impl SunTimes {
    /// The instant of a given anchor.
    #[must_use]
    pub fn event(&self, anchor: SolarAnchor) -> DateTime<Tz> {
        match anchor {
            SolarAnchor::Sunrise => self.sunrise,
            SolarAnchor::Sunset => self.sunset,
        }
    }

    /// Fixed 06:00/12:00/18:00 local fallback for dates without a
    /// sunrise/sunset (polar day or night).
    #[must_use]
    pub fn fallback(date: NaiveDate, location: &Location) -> Self {
        let at = |hour| {
            location
                .instant_at(date, NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time"))
                .with_timezone(&location.timezone)
        };
        Self {
            sunrise: at(6),
            solar_noon: at(12),
            sunset: at(18),
        }
    }
}

/// Solar zenith used for sunrise/sunset, including refraction and the
/// solar disc radius.
const SUNRISE_ZENITH_DEG: f64 = 90.833;

/// Sunrise, solar noon and sunset for a local calendar date.
///
/// Returns `None` when the sun never crosses the horizon that day.
#[must_use]
pub fn sun_times(date: NaiveDate, location: &Location) -> Option<SunTimes> {
    // Evaluate the slowly-varying orbital terms at local solar noon.
    let approx_noon = julian_day(date) + 0.5 - location.longitude / 360.0;
    let terms = OrbitalTerms::at(approx_noon);

    let lat = location.latitude.to_radians();
    let decl = terms.declination_deg.to_radians();

    let cos_ha = SUNRISE_ZENITH_DEG.to_radians().cos() / (lat.cos() * decl.cos())
        - lat.tan() * decl.tan();
    if !(-1.0..=1.0).contains(&cos_ha) {
        return None;
    }
    let ha_deg = cos_ha.acos().to_degrees();

    // Minutes after UTC midnight of `date`.
    let noon_minutes = 720.0 - 4.0 * location.longitude - terms.equation_of_time_min;
    let sunrise_minutes = noon_minutes - 4.0 * ha_deg;
    let sunset_minutes = noon_minutes + 4.0 * ha_deg;

    let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("valid midnight"));
    let at = |minutes: f64| {
        #[allow(clippy::cast_possible_truncation)]
        let secs = (minutes * 60.0).round() as i64;
        (midnight + Duration::seconds(secs)).with_timezone(&location.timezone)
    };

    Some(SunTimes {
        sunrise: at(sunrise_minutes),
        solar_noon: at(noon_minutes),
        sunset: at(sunset_minutes),
    })
}

/// The sun's azimuth and elevation at an instant.
#[must_use]
pub fn solar_position(instant: DateTime<Utc>, location: &Location) -> SolarPosition {
    let jd = julian_day_at(instant);
    let terms = OrbitalTerms::at(jd);

    let minutes_utc = f64::from(instant.time().num_seconds_from_midnight()) / 60.0;
    let true_solar_time =
        (minutes_utc + terms.equation_of_time_min + 4.0 * location.longitude).rem_euclid(1440.0);
    let hour_angle_deg = if true_solar_time / 4.0 < 0.0 {
        true_solar_time / 4.0 + 180.0
    } else {
        true_solar_time / 4.0 - 180.0
    };

    let lat = location.latitude.to_radians();
    let decl = terms.declination_deg.to_radians();
    let ha = hour_angle_deg.to_radians();

    let cos_zenith = (lat.sin() * decl.sin() + lat.cos() * decl.cos() * ha.cos()).clamp(-1.0, 1.0);
    let zenith = cos_zenith.acos();
    let elevation = 90.0 - zenith.to_degrees();

    let azimuth = if zenith.sin().abs() < 1e-9 {
        // Sun at the zenith/nadir; azimuth is undefined, pick north.
        0.0
    } else {
        let cos_az =
            ((lat.sin() * zenith.cos() - decl.sin()) / (lat.cos() * zenith.sin())).clamp(-1.0, 1.0);
        let az = cos_az.acos().to_degrees();
        if hour_angle_deg > 0.0 {
            (az + 180.0).rem_euclid(360.0)
        } else {
            (540.0 - az).rem_euclid(360.0)
        }
    };

    SolarPosition { azimuth, elevation }
}

/// Slowly-varying orbital quantities shared by both calculations.
struct OrbitalTerms {
    declination_deg: f64,
    equation_of_time_min: f64,
}

impl OrbitalTerms {
    fn at(julian_day: f64) -> Self {
        let jc = (julian_day - 2_451_545.0) / 36_525.0;

        let mean_long = (280.466_46 + jc * (36_000.769_83 + jc * 0.000_303_2)).rem_euclid(360.0);
        let mean_anom = 357.529_11 + jc * (35_999.050_29 - 0.000_153_7 * jc);
        let eccentricity = 0.016_708_634 - jc * (0.000_042_037 + 0.000_000_126_7 * jc);

        let m = mean_anom.to_radians();
        let eq_of_center = m.sin() * (1.914_602 - jc * (0.004_817 + 0.000_014 * jc))
            + (2.0 * m).sin() * (0.019_993 - 0.000_101 * jc)
            + (3.0 * m).sin() * 0.000_289;

        let true_long = mean_long + eq_of_center;
        let omega = (125.04 - 1_934.136 * jc).to_radians();
        let apparent_long = true_long - 0.005_69 - 0.004_78 * omega.sin();

        let mean_obliquity = 23.0
            + (26.0 + (21.448 - jc * (46.815 + jc * (0.000_59 - jc * 0.001_813))) / 60.0) / 60.0;
        let obliquity = mean_obliquity + 0.002_56 * omega.cos();

        let declination_deg = (obliquity.to_radians().sin() * apparent_long.to_radians().sin())
            .asin()
            .to_degrees();

        let var_y = (obliquity / 2.0).to_radians().tan().powi(2);
        let l = mean_long.to_radians();
        let equation_of_time_min = 4.0
            * (var_y * (2.0 * l).sin() - 2.0 * eccentricity * m.sin()
                + 4.0 * eccentricity * var_y * m.sin() * (2.0 * l).cos()
                - 0.5 * var_y * var_y * (4.0 * l).sin()
                - 1.25 * eccentricity * eccentricity * (2.0 * m).sin())
            .to_degrees();

        Self {
            declination_deg,
            equation_of_time_min,
        }
    }
}

/// Julian day number of a calendar date at 00:00 UT.
fn julian_day(date: NaiveDate) -> f64 {
    f64::from(julian_day_number(date)) - 0.5
}

/// Julian day including the time-of-day fraction.
fn julian_day_at(instant: DateTime<Utc>) -> f64 {
    let day_fraction = f64::from(instant.time().num_seconds_from_midnight()) / 86_400.0;
    julian_day(instant.date_naive()) + day_fraction
}

/// Integer Julian day number (valid for the Gregorian calendar).
#[allow(clippy::cast_possible_wrap)]
fn julian_day_number(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    let year = date.year();
    let month = date.month() as i32;
    let day = date.day() as i32;
    let a = (14 - month) / 12;
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    day + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32_045
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn greenwich() -> Location {
        Location::new(51.48, 0.0, Tz::UTC).unwrap()
    }

    fn minutes_of(dt: DateTime<Tz>) -> i64 {
        i64::from(dt.hour()) * 60 + i64::from(dt.minute())
    }

    #[test]
    fn should_place_equinox_sunrise_and_sunset_near_six_o_clock() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let times = sun_times(date, &greenwich()).unwrap();

        let sunrise = minutes_of(times.sunrise);
        let sunset = minutes_of(times.sunset);
        assert!((sunrise - 6 * 60).abs() <= 15, "sunrise {sunrise} min");
        assert!((sunset - 18 * 60).abs() <= 15, "sunset {sunset} min");
    }

    #[test]
    fn should_give_longer_days_in_summer_than_in_winter() {
        let loc = greenwich();
        let june = sun_times(NaiveDate::from_ymd_opt(2025, 6, 21).unwrap(), &loc).unwrap();
        let december = sun_times(NaiveDate::from_ymd_opt(2025, 12, 21).unwrap(), &loc).unwrap();

        let june_len = june.sunset - june.sunrise;
        let december_len = december.sunset - december.sunrise;
        assert!(june_len > december_len + Duration::hours(6));
    }

    #[test]
    fn should_return_none_during_polar_day() {
        let tromso = Location::new(69.65, 18.96, Tz::Europe__Oslo).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
        assert!(sun_times(date, &tromso).is_none());
    }

    #[test]
    fn should_return_none_during_polar_night() {
        let tromso = Location::new(69.65, 18.96, Tz::Europe__Oslo).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 12, 21).unwrap();
        assert!(sun_times(date, &tromso).is_none());
    }

    #[test]
    fn should_express_sun_times_in_the_local_timezone() {
        let la = Location::new(34.05, -118.24, Tz::America__Los_Angeles).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        let times = sun_times(date, &la).unwrap();

        assert_eq!(times.sunrise.date_naive(), date);
        assert_eq!(times.sunset.date_naive(), date);
        // A Los Angeles July sunrise is before 07:00 and sunset after 19:00.
        assert!(times.sunrise.hour() < 7);
        assert!(times.sunset.hour() >= 19);
    }

    #[test]
    fn should_point_south_with_high_elevation_at_midsummer_noon() {
        let loc = greenwich();
        let noon = Utc
            .with_ymd_and_hms(2025, 6, 21, 12, 0, 0)
            .unwrap();
        let position = solar_position(noon, &loc);

        assert!((position.azimuth - 180.0).abs() < 15.0, "azimuth {}", position.azimuth);
        // ~90 − 51.48 + 23.4 degrees, minus a little for being slightly
        // off true solar noon.
        assert!(position.elevation > 55.0 && position.elevation < 65.0);
        assert!(position.is_up());
    }

    #[test]
    fn should_point_east_in_the_morning() {
        let loc = greenwich();
        let morning = Utc.with_ymd_and_hms(2025, 6, 21, 6, 0, 0).unwrap();
        let position = solar_position(morning, &loc);

        assert!(position.azimuth > 50.0 && position.azimuth < 120.0);
        assert!(position.is_up());
    }

    #[test]
    fn should_report_sun_below_horizon_at_night() {
        let loc = greenwich();
        let midnight = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        let position = solar_position(midnight, &loc);
        assert!(!position.is_up());
    }

    #[test]
    fn should_be_deterministic_for_identical_inputs() {
        let loc = greenwich();
        let instant = Utc.with_ymd_and_hms(2025, 4, 1, 9, 30, 0).unwrap();
        assert_eq!(solar_position(instant, &loc), solar_position(instant, &loc));

        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(sun_times(date, &loc), sun_times(date, &loc));
    }

    #[test]
    fn should_shift_sunset_between_solstice_and_equinox() {
        let loc = greenwich();
        let solstice = sun_times(NaiveDate::from_ymd_opt(2025, 6, 21).unwrap(), &loc).unwrap();
        let equinox = sun_times(NaiveDate::from_ymd_opt(2025, 9, 22).unwrap(), &loc).unwrap();
        assert!(solstice.sunset.time() > equinox.sunset.time());
    }

    #[test]
    fn should_build_fallback_times_at_fixed_local_hours() {
        let tromso = Location::new(69.65, 18.96, Tz::Europe__Oslo).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
        let times = SunTimes::fallback(date, &tromso);
        assert_eq!(times.sunrise.hour(), 6);
        assert_eq!(times.solar_noon.hour(), 12);
        assert_eq!(times.sunset.hour(), 18);
        assert_eq!(times.event(SolarAnchor::Sunset), times.sunset);
    }
}
