//! Orientation — the compass direction a window faces.

use serde::{Deserialize, Serialize};

/// One of the 8 cardinal/intercardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl Orientation {
    /// The compass azimuth this direction faces, in degrees clockwise
    /// from north.
    #[must_use]
    pub fn azimuth(self) -> f64 {
        match self {
            Self::North => 0.0,
            Self::Northeast => 45.0,
            Self::East => 90.0,
            Self::Southeast => 135.0,
            Self::South => 180.0,
            Self::Southwest => 225.0,
            Self::West => 270.0,
            Self::Northwest => 315.0,
        }
    }

    /// The direction whose 45° sector contains `azimuth` (degrees,
    /// any real value; normalized internally).
    #[must_use]
    pub fn from_azimuth(azimuth: f64) -> Self {
        let normalized = azimuth.rem_euclid(360.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let sector = (((normalized + 22.5) / 45.0).floor() as usize) % 8;
        [
            Self::North,
            Self::Northeast,
            Self::East,
            Self::Southeast,
            Self::South,
            Self::Southwest,
            Self::West,
            Self::Northwest,
        ][sector]
    }

    /// Smallest angular distance (degrees, 0–180) between this facing
    /// direction and `azimuth`.
    #[must_use]
    pub fn angular_distance(self, azimuth: f64) -> f64 {
        let diff = (azimuth.rem_euclid(360.0) - self.azimuth()).abs();
        diff.min(360.0 - diff)
    }

    /// Whether a window facing this direction is inside the sun's azimuth
    /// arc, i.e. within `tolerance` degrees of the sun.
    #[must_use]
    pub fn within_sun_arc(self, sun_azimuth: f64, tolerance: f64) -> bool {
        self.angular_distance(sun_azimuth) <= tolerance
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::North => "north",
            Self::Northeast => "northeast",
            Self::East => "east",
            Self::Southeast => "southeast",
            Self::South => "south",
            Self::Southwest => "southwest",
            Self::West => "west",
            Self::Northwest => "northwest",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Orientation {
    type Err = UnknownOrientation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Self::North),
            "northeast" | "north-east" | "ne" => Ok(Self::Northeast),
            "east" | "e" => Ok(Self::East),
            "southeast" | "south-east" | "se" => Ok(Self::Southeast),
            "south" | "s" => Ok(Self::South),
            "southwest" | "south-west" | "sw" => Ok(Self::Southwest),
            "west" | "w" => Ok(Self::West),
            "northwest" | "north-west" | "nw" => Ok(Self::Northwest),
            _ => Err(UnknownOrientation(s.to_string())),
        }
    }
}

/// An orientation name that did not match any of the 8 directions.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown orientation '{0}'")]
pub struct UnknownOrientation(pub String);
