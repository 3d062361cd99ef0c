//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ShadeHubError`] via `#[from]`; adapters wrap their sources in the
//! boxed `Storage` variant. The [`Diagnostic`] enum is the stable,
//! machine-readable code surfaced to callers — raw collaborator errors
//! never cross the API boundary.

use crate::id::RoomId;

/// Top-level error for the shadehub core.
#[derive(Debug, thiserror::Error)]
pub enum ShadeHubError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The planner could not produce any actions.
    #[error("planning error")]
    Plan(#[from] PlanError),

    /// A schedule time/recurrence/duration phrase could not be parsed.
    #[error("schedule phrase error")]
    SchedulePhrase(#[from] SchedulePhraseError),

    /// The NLU collaborator failed or returned an unusable draft.
    #[error("intent interpretation error")]
    Nlu(#[from] NluError),

    /// The persistence layer failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ShadeHubError {
    /// The diagnostic code for this error, when it maps to one.
    ///
    /// `Validation` and `NotFound` are request-shape concerns handled at
    /// the API boundary and carry no router diagnostic.
    #[must_use]
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            Self::Validation(_) | Self::NotFound(_) => None,
            Self::Plan(err) => Some(match err {
                PlanError::InvalidScope { .. } => Diagnostic::InvalidScope,
                PlanError::NoTargetResolved => Diagnostic::NoTargetResolved,
            }),
            Self::SchedulePhrase(_) => Some(Diagnostic::ScheduleParseError),
            Self::Nlu(err) => Some(match err {
                NluError::Timeout => Diagnostic::NluTimeout,
                NluError::Malformed(_) | NluError::AmbiguousTiming => Diagnostic::NluMalformed,
            }),
            Self::Storage(_) => Some(Diagnostic::StorageFailure),
        }
    }
}

/// Violations of domain invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("blind '{0}' is declared more than once")]
    DuplicateBlind(String),

    #[error("blind '{blind}' references unknown room '{room}'")]
    UnknownRoom { blind: String, room: String },

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("schedule action template must not be empty")]
    EmptyActionTemplate,

    #[error("recurring trigger needs at least one weekday")]
    EmptyDays,
}

/// A lookup that found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} '{id}' not found")]
pub struct NotFoundError {
    /// Kind of record that was looked up (e.g. `"Schedule"`).
    pub entity: &'static str,
    /// The identifier that failed to resolve.
    pub id: String,
}

/// Failures from the blind execution planner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The command's scope expanded to an empty candidate set.
    #[error("scope '{room}' matches no configured room")]
    InvalidScope { room: RoomId },

    /// Every directive in the command resolved to zero blinds.
    #[error("no directive matched any blind in scope")]
    NoTargetResolved,
}

/// Failures from the schedule phrase and duration parsers.
///
/// Ambiguous or unparseable phrases fail loudly — they are never silently
/// defaulted to "now" or "today".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulePhraseError {
    #[error("could not parse time phrase '{0}'")]
    UnrecognizedTime(String),

    #[error("could not parse date phrase '{0}'")]
    UnrecognizedDate(String),

    #[error("could not parse recurrence phrase '{0}'")]
    UnrecognizedRecurrence(String),

    #[error("could not parse duration phrase '{0}'")]
    UnrecognizedDuration(String),

    #[error("scheduled command carries no time phrase")]
    MissingTimePhrase,
}

/// Failures from the NLU collaborator or from structural validation of
/// its draft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NluError {
    /// The collaborator did not answer within the configured bound.
    #[error("intent interpretation timed out")]
    Timeout,

    /// The draft is structurally incomplete for its timing class.
    #[error("malformed intent draft: {0}")]
    Malformed(String),

    /// The collaborator could not classify the command's timing.
    #[error("could not tell whether the command is immediate or scheduled")]
    AmbiguousTiming,
}

/// Stable diagnostic codes surfaced in user-facing error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Diagnostic {
    InvalidScope,
    NoTargetResolved,
    ScheduleParseError,
    DeviceTimeout,
    DeviceRejected,
    UnknownDevice,
    NluTimeout,
    NluMalformed,
    StorageFailure,
}

impl Diagnostic {
    /// The wire representation of this code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidScope => "INVALID_SCOPE",
            Self::NoTargetResolved => "NO_TARGET_RESOLVED",
            Self::ScheduleParseError => "SCHEDULE_PARSE_ERROR",
            Self::DeviceTimeout => "DEVICE_TIMEOUT",
            Self::DeviceRejected => "DEVICE_REJECTED",
            Self::UnknownDevice => "UNKNOWN_DEVICE",
            Self::NluTimeout => "NLU_TIMEOUT",
            Self::NluMalformed => "NLU_MALFORMED",
            Self::StorageFailure => "STORAGE_FAILURE",
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_plan_errors_to_their_diagnostics() {
        let err = ShadeHubError::from(PlanError::InvalidScope {
            room: RoomId::new("attic"),
        });
        assert_eq!(err.diagnostic(), Some(Diagnostic::InvalidScope));

        let err = ShadeHubError::from(PlanError::NoTargetResolved);
        assert_eq!(err.diagnostic(), Some(Diagnostic::NoTargetResolved));
    }

    #[test]
    fn should_map_nlu_errors_to_their_diagnostics() {
        let err = ShadeHubError::from(NluError::Timeout);
        assert_eq!(err.diagnostic(), Some(Diagnostic::NluTimeout));

        let err = ShadeHubError::from(NluError::AmbiguousTiming);
        assert_eq!(err.diagnostic(), Some(Diagnostic::NluMalformed));
    }

    #[test]
    fn should_map_phrase_errors_to_schedule_parse_error() {
        let err = ShadeHubError::from(SchedulePhraseError::UnrecognizedTime(
            "half past never".to_string(),
        ));
        assert_eq!(err.diagnostic(), Some(Diagnostic::ScheduleParseError));
    }

    #[test]
    fn should_carry_no_diagnostic_for_validation_errors() {
        let err = ShadeHubError::from(ValidationError::EmptyName);
        assert_eq!(err.diagnostic(), None);
    }

    #[test]
    fn should_render_diagnostic_codes_in_screaming_snake_case() {
        assert_eq!(Diagnostic::NoTargetResolved.to_string(), "NO_TARGET_RESOLVED");
        let json = serde_json::to_string(&Diagnostic::InvalidScope).unwrap();
        assert_eq!(json, "\"INVALID_SCOPE\"");
    }
}
