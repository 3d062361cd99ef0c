//! # shadehub-adapter-hub-http
//!
//! HTTP implementation of the [`ShadeHub`] port against a Maker-API style
//! hub: `GET …/devices/{id}/setPosition/{pos}?access_token=…` to command
//! a shade, `GET …/devices/{id}?access_token=…` to read its state. The
//! hub reports device state as an attribute array; shades expose either a
//! `position` or a `level` attribute.
//!
//! ## Dependency rule
//!
//! Depends on `shadehub-app` (port traits) and `shadehub-domain` only.

use std::time::Duration;

use serde::Deserialize;

use shadehub_app::ports::{HubCommandFailure, ShadeHub};
use shadehub_domain::id::BlindId;

/// Configuration for the hub client.
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Base URL of the hub, e.g. `http://192.168.1.10`.
    pub base_url: String,
    /// Maker API app id.
    pub app_id: String,
    /// Access token appended to every request.
    pub access_token: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

/// Errors building the hub client.
#[derive(Debug, thiserror::Error)]
pub enum HubClientError {
    #[error("failed to build HTTP client")]
    Client(#[from] reqwest::Error),
}

/// HTTP-backed shade hub.
pub struct HttpShadeHub {
    client: reqwest::Client,
    config: HubConfig,
}

impl HttpShadeHub {
    /// Build a client with the configured per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HubClientError`] if the underlying client cannot be
    /// constructed.
    pub fn new(config: HubConfig) -> Result<Self, HubClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn device_url(&self, blind: &BlindId, command: Option<&str>) -> String {
        let HubConfig {
            base_url,
            app_id,
            access_token,
            ..
        } = &self.config;
        match command {
            Some(command) => format!(
                "{base_url}/apps/api/{app_id}/devices/{blind}/{command}?access_token={access_token}"
            ),
            None => {
                format!("{base_url}/apps/api/{app_id}/devices/{blind}?access_token={access_token}")
            }
        }
    }
}

impl ShadeHub for HttpShadeHub {
    async fn set_position(&self, blind: &BlindId, position: u8) -> Result<(), HubCommandFailure> {
        let url = self.device_url(blind, Some(&format!("setPosition/{position}")));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(%blind, position, "hub accepted set-position");
            Ok(())
        } else {
            Err(classify_status(status))
        }
    }

    async fn get_position(&self, blind: &BlindId) -> Result<Option<u8>, HubCommandFailure> {
        let url = self.device_url(blind, None);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let payload: DevicePayload = response.json().await.map_err(|err| {
            HubCommandFailure::Rejected {
                reason: format!("unreadable device payload: {err}"),
            }
        })?;
        Ok(position_from_attributes(&payload))
    }
}

/// Map transport-level errors onto the device failure taxonomy.
fn classify_transport(err: reqwest::Error) -> HubCommandFailure {
    if err.is_timeout() || err.is_connect() {
        HubCommandFailure::Timeout
    } else {
        HubCommandFailure::Rejected {
            reason: err.to_string(),
        }
    }
}

/// Map HTTP status codes onto the device failure taxonomy.
fn classify_status(status: reqwest::StatusCode) -> HubCommandFailure {
    if status == reqwest::StatusCode::NOT_FOUND {
        HubCommandFailure::UnknownDevice
    } else {
        HubCommandFailure::Rejected {
            reason: format!("hub answered {status}"),
        }
    }
}

/// The slice of the hub's device JSON this adapter reads.
#[derive(Debug, Deserialize)]
struct DevicePayload {
    #[serde(default)]
    attributes: Vec<DeviceAttribute>,
}

#[derive(Debug, Deserialize)]
struct DeviceAttribute {
    name: String,
    #[serde(rename = "currentValue")]
    current_value: Option<serde_json::Value>,
}

/// Extract a shade position from the attribute array: `position` wins,
/// `level` is the dimmer-style fallback. Values arrive as numbers or
/// numeric strings depending on hub firmware.
fn position_from_attributes(payload: &DevicePayload) -> Option<u8> {
    for name in ["position", "level"] {
        let value = payload
            .attributes
            .iter()
            .find(|attr| attr.name == name)
            .and_then(|attr| attr.current_value.as_ref())
            .and_then(numeric_value);
        if let Some(value) = value {
            return Some(value.min(100));
        }
    }
    None
}

fn numeric_value(value: &serde_json::Value) -> Option<u8> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> DevicePayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn should_read_numeric_position_attribute() {
        let payload = payload(
            r#"{"attributes": [{"name": "position", "currentValue": 40},
                              {"name": "level", "currentValue": 90}]}"#,
        );
        assert_eq!(position_from_attributes(&payload), Some(40));
    }

    #[test]
    fn should_fall_back_to_level_attribute() {
        let payload = payload(r#"{"attributes": [{"name": "level", "currentValue": "75"}]}"#);
        assert_eq!(position_from_attributes(&payload), Some(75));
    }

    #[test]
    fn should_parse_string_values_from_older_firmware() {
        let payload = payload(r#"{"attributes": [{"name": "position", "currentValue": " 25 "}]}"#);
        assert_eq!(position_from_attributes(&payload), Some(25));
    }

    #[test]
    fn should_return_none_without_position_attributes() {
        let battery = payload(r#"{"attributes": [{"name": "battery", "currentValue": 80}]}"#);
        assert_eq!(position_from_attributes(&battery), None);
        assert_eq!(position_from_attributes(&payload(r"{}")), None);
    }

    #[test]
    fn should_clamp_out_of_range_reported_positions() {
        let payload = payload(r#"{"attributes": [{"name": "position", "currentValue": 140}]}"#);
        assert_eq!(position_from_attributes(&payload), Some(100));
    }

    #[test]
    fn should_classify_not_found_as_unknown_device() {
        assert_eq!(
            classify_status(reqwest::StatusCode::NOT_FOUND),
            HubCommandFailure::UnknownDevice
        );
        assert!(matches!(
            classify_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            HubCommandFailure::Rejected { .. }
        ));
    }

    #[test]
    fn should_build_maker_api_urls() {
        let hub = HttpShadeHub::new(HubConfig {
            base_url: "http://hub.local".to_string(),
            app_id: "12".to_string(),
            access_token: "secret".to_string(),
            request_timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            hub.device_url(&BlindId::new("42"), Some("setPosition/80")),
            "http://hub.local/apps/api/12/devices/42/setPosition/80?access_token=secret"
        );
        assert_eq!(
            hub.device_url(&BlindId::new("42"), None),
            "http://hub.local/apps/api/12/devices/42?access_token=secret"
        );
    }
}
