//! Schedule — a persisted rule that executes an action template later.
//!
//! A schedule stores its *unresolved* action template: "block the sun"
//! schedules are re-resolved against current solar state at every firing,
//! so they stay correct as seasons change. The concrete next-fire instant
//! is recomputed from the trigger on demand and never persisted.

mod expiry;
mod trigger;

pub use expiry::Expiry;
pub use trigger::{DayOfWeek, RecurringTime, Trigger};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ShadeHubError, ValidationError};
use crate::id::ScheduleId;
use crate::intent::{CommandScope, Directive};
use crate::location::Location;
use crate::time::Timestamp;

/// Lifecycle state of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Active,
    Expired,
    Cancelled,
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Expired => f.write_str("expired"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A persisted schedule record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub room_scope: CommandScope,
    /// Unresolved directives, re-planned at each firing.
    pub action_template: Vec<Directive>,
    pub trigger: Trigger,
    pub expiry: Expiry,
    pub created_at: Timestamp,
    pub status: ScheduleStatus,
    pub last_fired: Option<Timestamp>,
    pub firings: u32,
    /// Set when the most recent firing failed; a failed one-shot is
    /// expired rather than silently retried forever.
    pub last_firing_failed: bool,
}

impl Schedule {
    /// Create a builder for constructing a [`Schedule`].
    #[must_use]
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ShadeHubError::Validation`] when the action template is
    /// empty or a recurring trigger has no weekdays.
    pub fn validate(&self) -> Result<(), ShadeHubError> {
        if self.action_template.is_empty() {
            return Err(ValidationError::EmptyActionTemplate.into());
        }
        if let Trigger::Recurring { days, .. } = &self.trigger {
            if days.is_empty() {
                return Err(ValidationError::EmptyDays.into());
            }
        }
        Ok(())
    }

    /// Whether the schedule can still fire.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ScheduleStatus::Active
    }

    /// The instant the last evaluation period started: the previous
    /// firing, or creation for a schedule that has never fired.
    #[must_use]
    pub fn fire_basis(&self) -> Timestamp {
        self.last_fired.unwrap_or(self.created_at)
    }

    /// The next due instant, recomputed from the trigger.
    #[must_use]
    pub fn next_fire(&self, location: &Location) -> Option<DateTime<Utc>> {
        self.trigger.next_fire(self.fire_basis(), location)
    }

    /// Record one firing and apply the resulting status transitions:
    /// one-shot triggers expire after their single firing (failed or
    /// not), and `AfterFirings` expiry is applied.
    pub fn record_firing(&mut self, now: Timestamp, failed: bool) {
        self.last_fired = Some(now);
        self.firings += 1;
        self.last_firing_failed = failed;

        if self.trigger.is_one_shot() || self.expiry.firings_spent(self.firings) {
            self.status = ScheduleStatus::Expired;
        }
    }

    /// Expire the schedule if its deadline has passed.
    ///
    /// Returns `true` when the status changed.
    pub fn apply_deadline(&mut self, now: Timestamp) -> bool {
        if self.is_active() && self.expiry.deadline_passed(now) {
            self.status = ScheduleStatus::Expired;
            true
        } else {
            false
        }
    }

    /// Cancel the schedule. Only an active schedule can be cancelled.
    ///
    /// Returns `true` when the status changed.
    pub fn cancel(&mut self) -> bool {
        if self.is_active() {
            self.status = ScheduleStatus::Cancelled;
            true
        } else {
            false
        }
    }
}

/// Step-by-step builder for [`Schedule`].
#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    id: Option<ScheduleId>,
    room_scope: Option<CommandScope>,
    action_template: Vec<Directive>,
    trigger: Option<Trigger>,
    expiry: Option<Expiry>,
    created_at: Option<Timestamp>,
}

impl ScheduleBuilder {
    #[must_use]
    pub fn id(mut self, id: ScheduleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn room_scope(mut self, scope: CommandScope) -> Self {
        self.room_scope = Some(scope);
        self
    }

    #[must_use]
    pub fn directive(mut self, directive: Directive) -> Self {
        self.action_template.push(directive);
        self
    }

    #[must_use]
    pub fn action_template(mut self, template: Vec<Directive>) -> Self {
        self.action_template = template;
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = Some(expiry);
        self
    }

    #[must_use]
    pub fn created_at(mut self, at: Timestamp) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Consume the builder, validate, and return a [`Schedule`].
    ///
    /// # Errors
    ///
    /// Returns [`ShadeHubError::Validation`] if required fields are
    /// missing or invariants fail.
    pub fn build(self) -> Result<Schedule, ShadeHubError> {
        let schedule = Schedule {
            id: self.id.unwrap_or_default(),
            room_scope: self.room_scope.unwrap_or(CommandScope::House),
            action_template: self.action_template,
            trigger: self.trigger.unwrap_or(Trigger::Absolute {
                at: self.created_at.unwrap_or_else(crate::time::now),
            }),
            expiry: self.expiry.unwrap_or(Expiry::Never),
            created_at: self.created_at.unwrap_or_else(crate::time::now),
            status: ScheduleStatus::Active,
            last_fired: None,
            firings: 0,
            last_firing_failed: false,
        };
        schedule.validate()?;
        Ok(schedule)
    }
}
