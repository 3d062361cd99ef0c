//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `shadehub.toml` in the working directory. Server, database
//! and logging fields have defaults so a minimal file only declares the
//! registry, the location, and the collaborator endpoints. Environment
//! variables take precedence over file values.

use std::str::FromStr;

use serde::Deserialize;

use shadehub_adapter_hub_http::HubConfig;
use shadehub_adapter_nlu_http::NluConfig;
use shadehub_domain::id::{BlindId, RoomId};
use shadehub_domain::location::Location;
use shadehub_domain::orientation::Orientation;
use shadehub_domain::registry::{Blind, BlindRegistry, Room};
use shadehub_domain::tunables::Tunables;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Device hub collaborator.
    pub hub: HubMode,
    /// Text-understanding collaborator.
    pub nlu: Option<NluConfig>,
    /// Site location.
    pub location: LocationConfig,
    /// Tunable thresholds.
    pub tunables: Tunables,
    /// Room/blind registry.
    pub rooms: Vec<RoomConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Which hub implementation to wire.
#[derive(Debug, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HubMode {
    /// Simulated shades, no hardware required.
    #[default]
    Virtual,
    /// A real Maker-API style hub.
    Http(HubConfig),
}

/// Site location as written in the file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone name, e.g. `America/Los_Angeles`.
    pub timezone: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            timezone: "UTC".to_string(),
        }
    }
}

/// One room and its blinds.
#[derive(Debug, Deserialize)]
pub struct RoomConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub blinds: Vec<BlindConfig>,
}

/// One blind entry.
#[derive(Debug, Deserialize)]
pub struct BlindConfig {
    /// Stable device identifier, as known to the hub.
    pub id: String,
    /// Friendly name, matched against command keywords.
    pub name: String,
    /// Compass direction the window faces.
    pub orientation: String,
}

impl Config {
    /// Load configuration from `shadehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("shadehub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SHADEHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("SHADEHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("SHADEHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("SHADEHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if chrono_tz::Tz::from_str(&self.location.timezone).is_err() {
            return Err(ConfigError::Validation(format!(
                "unknown timezone '{}'",
                self.location.timezone
            )));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Build the validated blind registry from the room tables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for unknown orientations,
    /// duplicate blind ids, or dangling room references.
    pub fn build_registry(&self) -> Result<BlindRegistry, ConfigError> {
        let rooms = self
            .rooms
            .iter()
            .map(|room| Room {
                id: RoomId::new(&room.id),
                name: room.name.clone(),
            })
            .collect();

        let mut blinds = Vec::new();
        for room in &self.rooms {
            for blind in &room.blinds {
                let orientation = Orientation::from_str(&blind.orientation)
                    .map_err(|err| ConfigError::Validation(err.to_string()))?;
                blinds.push(Blind {
                    id: BlindId::new(&blind.id),
                    name: blind.name.clone(),
                    orientation,
                    room_id: RoomId::new(&room.id),
                });
            }
        }

        BlindRegistry::new(rooms, blinds).map_err(|err| ConfigError::Validation(err.to_string()))
    }

    /// Build the validated location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for out-of-range coordinates.
    /// The timezone was already checked by [`Config::load`].
    pub fn build_location(&self) -> Result<Location, ConfigError> {
        let timezone = chrono_tz::Tz::from_str(&self.location.timezone)
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        Location::new(self.location.latitude, self.location.longitude, timezone)
            .map_err(|err| ConfigError::Validation(err.to_string()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:shadehub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "shadehubd=info,shadehub=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        port = 8080

        [location]
        latitude = 47.6
        longitude = -122.3
        timezone = "America/Los_Angeles"

        [hub]
        mode = "virtual"

        [nlu]
        url = "http://localhost:8090/interpret"

        [[rooms]]
        id = "guest_bedroom"
        name = "Guest Bedroom"

        [[rooms.blinds]]
        id = "guest-front"
        name = "Guest Front Window"
        orientation = "south"

        [[rooms.blinds]]
        id = "guest-side"
        name = "Guest Side Window"
        orientation = "east"
    "#;

    #[test]
    fn should_parse_full_sample_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.location.timezone, "America/Los_Angeles");
        assert!(matches!(config.hub, HubMode::Virtual));
        assert_eq!(
            config.nlu.as_ref().unwrap().url,
            "http://localhost:8090/interpret"
        );

        let registry = config.build_registry().unwrap();
        assert_eq!(registry.rooms().len(), 1);
        assert_eq!(registry.blinds().len(), 2);
    }

    #[test]
    fn should_apply_defaults_for_missing_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:shadehub.db?mode=rwc");
        assert!(config.rooms.is_empty());
        assert_eq!(config.tunables.sun_arc_tolerance_deg, 45.0);
    }

    #[test]
    fn should_parse_http_hub_mode() {
        let config: Config = toml::from_str(
            r#"
            [hub]
            mode = "http"
            base_url = "http://hub.local"
            app_id = "12"
            access_token = "secret"
        "#,
        )
        .unwrap();
        assert!(matches!(config.hub, HubMode::Http(_)));
    }

    #[test]
    fn should_reject_unknown_orientation() {
        let config: Config = toml::from_str(
            r#"
            [[rooms]]
            id = "den"
            name = "Den"

            [[rooms.blinds]]
            id = "den-1"
            name = "Den Window"
            orientation = "sideways"
        "#,
        )
        .unwrap();
        assert!(matches!(
            config.build_registry(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_reject_unknown_timezone() {
        let mut config: Config = toml::from_str("").unwrap();
        config.location.timezone = "Mars/Olympus_Mons".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_format_bind_address() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }
}
