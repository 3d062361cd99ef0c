//! Tunable thresholds — loaded once at startup, immutable afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configurable knobs for intent resolution and execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Half-width of the sun's azimuth arc when deciding whether a window
    /// is sunny, in degrees.
    pub sun_arc_tolerance_deg: f64,

    /// Qualitative position terms and the position they map to.
    pub qualitative_positions: HashMap<String, u8>,

    /// Closure applied by "block the sun" when the sun sits on the
    /// horizon, in percent of travel.
    pub block_sun_min_closure: u8,

    /// Closure applied by "block the sun" at or above
    /// [`block_sun_max_elevation_deg`](Self::block_sun_max_elevation_deg).
    pub block_sun_max_closure: u8,

    /// Elevation at which block-the-sun closure saturates, in degrees.
    pub block_sun_max_elevation_deg: f64,

    /// Upper bound on a single device command, in seconds.
    pub device_timeout_secs: u64,

    /// Retries granted to a timed-out device command.
    pub device_retries: u32,

    /// Backoff before a device retry, in milliseconds.
    pub device_retry_backoff_ms: u64,

    /// Upper bound on the NLU collaborator call, in seconds.
    pub nlu_timeout_secs: u64,

    /// Cadence of the scheduling loop, in seconds.
    pub tick_period_secs: u64,

    /// How long cancelled/expired schedules are kept before the tick
    /// purges them, in days.
    pub schedule_retention_days: i64,
}

impl Default for Tunables {
    fn default() -> Self {
        let qualitative_positions = [
            ("fully open", 100),
            ("open", 100),
            ("fully closed", 0),
            ("closed", 0),
            ("halfway", 50),
            ("half", 50),
            ("quarter", 25),
            ("most of the way", 90),
        ]
        .into_iter()
        .map(|(term, pos)| (term.to_string(), pos))
        .collect();

        Self {
            sun_arc_tolerance_deg: 45.0,
            qualitative_positions,
            block_sun_min_closure: 50,
            block_sun_max_closure: 95,
            block_sun_max_elevation_deg: 60.0,
            device_timeout_secs: 10,
            device_retries: 1,
            device_retry_backoff_ms: 500,
            nlu_timeout_secs: 10,
            tick_period_secs: 60,
            schedule_retention_days: 14,
        }
    }
}

impl Tunables {
    /// Resolve a qualitative position term (case/whitespace insensitive).
    #[must_use]
    pub fn qualitative_position(&self, term: &str) -> Option<u8> {
        let normalized = term.trim().to_lowercase();
        self.qualitative_positions.get(&normalized).copied()
    }

    /// Target position for "block the sun" at a given solar elevation.
    ///
    /// Closure grows linearly with elevation between the configured
    /// bounds; the returned value is openness (100 − closure), so a
    /// higher sun yields a more closed blind.
    #[must_use]
    pub fn block_sun_position(&self, elevation_deg: f64) -> u8 {
        let ceiling = self.block_sun_max_elevation_deg.max(f64::EPSILON);
        let fraction = (elevation_deg / ceiling).clamp(0.0, 1.0);
        let span = f64::from(self.block_sun_max_closure) - f64::from(self.block_sun_min_closure);
        let closure = f64::from(self.block_sun_min_closure) + span * fraction;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let closure = closure.round().clamp(0.0, 100.0) as u8;
        100 - closure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_resolve_qualitative_terms_ignoring_case_and_whitespace() {
        let tunables = Tunables::default();
        assert_eq!(tunables.qualitative_position("Halfway"), Some(50));
        assert_eq!(tunables.qualitative_position("  fully open "), Some(100));
        assert_eq!(tunables.qualitative_position("most of the way"), Some(90));
        assert_eq!(tunables.qualitative_position("sideways"), None);
    }

    #[test]
    fn should_close_more_as_the_sun_climbs() {
        let tunables = Tunables::default();
        let low = tunables.block_sun_position(5.0);
        let high = tunables.block_sun_position(55.0);
        assert!(high < low, "higher sun should leave the blind more closed");
    }

    #[test]
    fn should_saturate_block_sun_closure_at_the_elevation_ceiling() {
        let tunables = Tunables::default();
        assert_eq!(
            tunables.block_sun_position(60.0),
            tunables.block_sun_position(80.0)
        );
        assert_eq!(tunables.block_sun_position(60.0), 5);
    }

    #[test]
    fn should_apply_minimum_closure_at_the_horizon() {
        let tunables = Tunables::default();
        assert_eq!(tunables.block_sun_position(0.0), 50);
        // Below the horizon clamps to the minimum closure too.
        assert_eq!(tunables.block_sun_position(-10.0), 50);
    }
}
