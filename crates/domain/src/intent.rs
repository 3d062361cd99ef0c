//! Structured intents — the validated output of the NLU collaborator.
//!
//! The collaborator returns an [`IntentDraft`] with every field optional;
//! drafts are a best-effort reading of noisy language and may be partial
//! or wrong. The core never assumes defaults on the collaborator's behalf:
//! [`StructuredIntent::from_draft`] checks structural completeness for the
//! draft's timing class and fails with a typed NLU error otherwise.

use serde::{Deserialize, Serialize};

use crate::error::NluError;
use crate::id::{RoomId, ScheduleId};

/// When the command should take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Immediate,
    Scheduled,
    /// The collaborator could not decide; routed to the error state.
    Ambiguous,
}

/// The set of blinds a command or schedule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandScope {
    /// A single room.
    Room(RoomId),
    /// Every room in the house.
    House,
}

impl std::fmt::Display for CommandScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Room(room) => write!(f, "room:{room}"),
            Self::House => f.write_str("house"),
        }
    }
}

/// How a directive picks blinds out of the candidate set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selector {
    /// Every blind in scope.
    All,
    /// Case-insensitive substring match against blind names; multiple
    /// matches apply to all of them.
    Keywords { keywords: Vec<String> },
    /// Blinds whose orientation currently faces the sun.
    Sunny,
}

/// The position a directive asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionSpec {
    /// An explicit percentage; clamped to 0–100 at resolution time.
    Percent { value: u8 },
    /// A qualitative term ("halfway", "fully open", …) resolved through
    /// the configured lookup table.
    Qualitative { term: String },
    /// Computed from the sun's current elevation — the higher the sun,
    /// the more closed the blind.
    BlockSun,
}

/// One (selector, position) pair extracted from a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub selector: Selector,
    pub position: PositionSpec,
}

/// Raw schedule phrases, exactly as the collaborator drafted them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    /// Time phrase: `"21:00"`, `"9pm"`, `"sunset"`, `"sunset+15m"`, ….
    #[serde(default)]
    pub time_phrase: Option<String>,
    /// Date phrase: `"today"`, `"tomorrow"`, `"2025-08-09"`.
    #[serde(default)]
    pub date_phrase: Option<String>,
    /// Recurrence phrase: `"daily"`, `"weekdays"`, `"every monday"`, ….
    #[serde(default)]
    pub recurrence_phrase: Option<String>,
    /// Duration phrase: `"for the next week"`, `"for 3 days"`, ….
    #[serde(default)]
    pub duration_phrase: Option<String>,
    /// Present when the command cancels an existing schedule.
    #[serde(default)]
    pub cancel_id: Option<ScheduleId>,
}

/// What the NLU collaborator actually returns: everything optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentDraft {
    #[serde(default)]
    pub timing: Option<Timing>,
    /// Whether the command targets the whole house instead of the room
    /// it was issued from.
    #[serde(default)]
    pub house_wide: Option<bool>,
    #[serde(default)]
    pub directives: Option<Vec<Directive>>,
    #[serde(default)]
    pub schedule: Option<ScheduleDraft>,
}

/// A validated command intent. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredIntent {
    pub timing: Timing,
    pub scope: CommandScope,
    pub directives: Vec<Directive>,
    pub schedule_draft: Option<ScheduleDraft>,
}

impl StructuredIntent {
    /// Validate a draft against the structural requirements of its timing
    /// class and pin its scope to the room the command was issued from.
    ///
    /// # Errors
    ///
    /// - [`NluError::AmbiguousTiming`] when the draft's timing is absent
    ///   or ambiguous
    /// - [`NluError::Malformed`] when required fields for the timing
    ///   class are missing
    pub fn from_draft(draft: IntentDraft, room_hint: RoomId) -> Result<Self, NluError> {
        let timing = match draft.timing {
            None | Some(Timing::Ambiguous) => return Err(NluError::AmbiguousTiming),
            Some(timing) => timing,
        };

        let scope = if draft.house_wide.unwrap_or(false) {
            CommandScope::House
        } else {
            CommandScope::Room(room_hint)
        };

        let directives = draft.directives.unwrap_or_default();

        if timing == Timing::Immediate {
            if directives.is_empty() {
                return Err(NluError::Malformed(
                    "immediate command carries no position directives".to_string(),
                ));
            }
            return Ok(Self {
                timing,
                scope,
                directives,
                schedule_draft: None,
            });
        }

        let Some(schedule) = draft.schedule else {
            return Err(NluError::Malformed(
                "scheduled command carries no schedule draft".to_string(),
            ));
        };
        if schedule.cancel_id.is_none() {
            if schedule.time_phrase.as_deref().unwrap_or("").is_empty() {
                return Err(NluError::Malformed(
                    "scheduled command carries no time phrase".to_string(),
                ));
            }
            if directives.is_empty() {
                return Err(NluError::Malformed(
                    "scheduled command carries no position directives".to_string(),
                ));
            }
        }
        Ok(Self {
            timing,
            scope,
            directives,
            schedule_draft: Some(schedule),
        })
    }
}
