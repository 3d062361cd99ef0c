//! # shadehub-adapter-nlu-http
//!
//! HTTP implementation of the [`IntentInterpreter`] port. Posts the raw
//! command text plus the room hint to the external text-understanding
//! service and deserializes the returned [`IntentDraft`].
//!
//! The adapter never invents draft fields: whatever the service omits
//! stays unresolved, and the core's structural validation decides whether
//! the draft is usable. The router applies the overall deadline; the
//! client-level timeout here is a safety net for hung connections.
//!
//! ## Dependency rule
//!
//! Depends on `shadehub-app` (port traits) and `shadehub-domain` only.

use std::time::Duration;

use serde::Serialize;

use shadehub_app::ports::IntentInterpreter;
use shadehub_domain::error::NluError;
use shadehub_domain::id::RoomId;
use shadehub_domain::intent::IntentDraft;

/// Configuration for the interpreter client.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NluConfig {
    /// Endpoint that accepts an interpretation request, e.g.
    /// `http://localhost:8090/interpret`.
    pub url: String,
    /// Client-level timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Errors building the interpreter client.
#[derive(Debug, thiserror::Error)]
pub enum NluClientError {
    #[error("failed to build HTTP client")]
    Client(#[from] reqwest::Error),
}

/// Request body sent to the interpretation service.
#[derive(Debug, Serialize)]
struct InterpretRequest<'a> {
    command: &'a str,
    room: &'a str,
}

/// HTTP-backed intent interpreter.
pub struct HttpIntentInterpreter {
    client: reqwest::Client,
    config: NluConfig,
}

impl HttpIntentInterpreter {
    /// Build a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`NluClientError`] if the underlying client cannot be
    /// constructed.
    pub fn new(config: NluConfig) -> Result<Self, NluClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

impl IntentInterpreter for HttpIntentInterpreter {
    async fn interpret(&self, command: &str, room_hint: &RoomId) -> Result<IntentDraft, NluError> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&InterpretRequest {
                command,
                room: room_hint.as_str(),
            })
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() || err.is_connect() {
                    NluError::Timeout
                } else {
                    NluError::Malformed(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "interpretation service refused the request");
            return Err(NluError::Malformed(format!(
                "interpretation service answered {status}"
            )));
        }

        response
            .json::<IntentDraft>()
            .await
            .map_err(|err| NluError::Malformed(format!("unreadable intent draft: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_interpretation_requests() {
        let request = InterpretRequest {
            command: "close the blinds",
            room: "guest_bedroom",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"command": "close the blinds", "room": "guest_bedroom"})
        );
    }

    #[test]
    fn should_deserialize_partial_drafts_from_the_service() {
        let draft: IntentDraft = serde_json::from_str(
            r#"{"timing": "scheduled",
                "schedule": {"time_phrase": "sunset", "recurrence_phrase": "daily"}}"#,
        )
        .unwrap();
        assert!(draft.directives.is_none());
        let schedule = draft.schedule.unwrap();
        assert_eq!(schedule.time_phrase.as_deref(), Some("sunset"));
        assert!(schedule.duration_phrase.is_none());
    }

    #[test]
    fn should_apply_default_timeout_when_config_omits_it() {
        let config: NluConfig =
            serde_json::from_str(r#"{"url": "http://localhost:8090/interpret"}"#).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
    }
}
