//! Schedule manager — owns the schedule store and the periodic tick.
//!
//! No other component mutates a schedule. Creation parses the raw
//! phrases; the tick re-resolves each due schedule's action template
//! against solar state *at firing time*, so "block the sun every
//! afternoon" keeps tracking the seasons. Next-fire instants are
//! recomputed on every evaluation and never persisted, which also makes
//! restarts safe by construction.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use shadehub_domain::error::{NotFoundError, PlanError, ShadeHubError};
use shadehub_domain::id::ScheduleId;
use shadehub_domain::intent::{CommandScope, Directive, ScheduleDraft};
use shadehub_domain::location::Location;
use shadehub_domain::schedule::Schedule;
use shadehub_domain::solar;
use shadehub_domain::tunables::Tunables;

use crate::duration::parse_expiry;
use crate::executor::DeviceExecutor;
use crate::phrase::parse_trigger;
use crate::planner::ExecutionPlanner;
use crate::ports::{ScheduleRepository, ShadeHub};

/// What one tick did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub fired: Vec<ScheduleId>,
    pub expired: Vec<ScheduleId>,
}

/// Owns schedule lifecycle and the scheduling loop.
pub struct ScheduleManager<R, H> {
    repo: R,
    planner: Arc<ExecutionPlanner>,
    executor: Arc<DeviceExecutor<H>>,
    location: Location,
    tunables: Arc<Tunables>,
    /// Tick is single-flight: a new tick may not start before the
    /// previous one's mutations are committed.
    tick_lock: tokio::sync::Mutex<()>,
}

impl<R, H> ScheduleManager<R, H>
where
    R: ScheduleRepository,
    H: ShadeHub + Sync,
{
    /// Create a manager over the given repository and collaborators.
    pub fn new(
        repo: R,
        planner: Arc<ExecutionPlanner>,
        executor: Arc<DeviceExecutor<H>>,
        location: Location,
        tunables: Arc<Tunables>,
    ) -> Self {
        Self {
            repo,
            planner,
            executor,
            location,
            tunables,
            tick_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The next due instant of a schedule, under this manager's location.
    #[must_use]
    pub fn next_fire_of(&self, schedule: &Schedule) -> Option<DateTime<Utc>> {
        schedule.next_fire(&self.location)
    }

    /// Parse the draft's phrases and persist a new active schedule.
    ///
    /// # Errors
    ///
    /// Returns a [`ShadeHubError::SchedulePhrase`] error for phrases that
    /// cannot be parsed, a validation error for an empty template, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, draft, template))]
    pub async fn create_schedule(
        &self,
        draft: &ScheduleDraft,
        template: Vec<Directive>,
        scope: CommandScope,
        now: DateTime<Utc>,
    ) -> Result<Schedule, ShadeHubError> {
        let trigger = parse_trigger(draft, now, &self.location)?;
        let expiry = parse_expiry(draft.duration_phrase.as_deref(), now)?;

        let schedule = Schedule::builder()
            .room_scope(scope)
            .action_template(template)
            .trigger(trigger)
            .expiry(expiry)
            .created_at(now)
            .build()?;

        let schedule = self.repo.create(schedule).await?;
        tracing::info!(
            schedule = %schedule.id,
            trigger = %schedule.trigger,
            "schedule created"
        );
        Ok(schedule)
    }

    /// List schedules, optionally only those targeting a given scope.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_schedules(
        &self,
        scope: Option<&CommandScope>,
    ) -> Result<Vec<Schedule>, ShadeHubError> {
        let mut schedules = self.repo.get_all().await?;
        if let Some(scope) = scope {
            schedules.retain(|s| &s.room_scope == scope);
        }
        Ok(schedules)
    }

    /// Cancel a schedule. An in-flight firing of the same schedule may
    /// still complete; only future firings are prevented.
    ///
    /// # Errors
    ///
    /// Returns [`ShadeHubError::NotFound`] for an unknown id, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_schedule(&self, id: ScheduleId) -> Result<Schedule, ShadeHubError> {
        let mut schedule = self.repo.get_by_id(id).await?.ok_or_else(|| NotFoundError {
            entity: "Schedule",
            id: id.to_string(),
        })?;

        if schedule.cancel() {
            schedule = self.repo.update(schedule).await?;
            tracing::info!(schedule = %id, "schedule cancelled");
        }
        Ok(schedule)
    }

    /// Evaluate every active schedule once.
    ///
    /// One schedule's failure never blocks the rest: firing errors are
    /// recorded on the schedule, and a storage failure aborts only that
    /// schedule's update for this cycle (retried next tick).
    ///
    /// # Errors
    ///
    /// Returns a storage error only when the active set itself cannot be
    /// loaded.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, ShadeHubError> {
        let _guard = self.tick_lock.lock().await;
        let mut report = TickReport::default();

        for schedule in self.repo.get_active().await? {
            match self.evaluate(schedule, now).await {
                Ok(Evaluation::Fired(id)) => report.fired.push(id),
                Ok(Evaluation::Expired(id)) => report.expired.push(id),
                Ok(Evaluation::NotDue) => {}
                Err((id, err)) => {
                    tracing::error!(schedule = %id, error = %err, "schedule update failed, retrying next tick");
                }
            }
        }

        self.purge_finalized(now).await;
        Ok(report)
    }

    /// Retention: drop cancelled/expired schedules once they are old
    /// enough that nobody will ask about them.
    async fn purge_finalized(&self, now: DateTime<Utc>) {
        let cutoff = now - chrono::Duration::days(self.tunables.schedule_retention_days);
        let schedules = match self.repo.get_all().await {
            Ok(schedules) => schedules,
            Err(err) => {
                tracing::error!(error = %err, "retention sweep skipped");
                return;
            }
        };
        for schedule in schedules {
            let reference = schedule.last_fired.unwrap_or(schedule.created_at);
            if !schedule.is_active() && reference < cutoff {
                if let Err(err) = self.repo.delete(schedule.id).await {
                    tracing::warn!(schedule = %schedule.id, error = %err, "retention delete failed");
                }
            }
        }
    }

    /// Evaluate a single schedule: expire, fire, or leave alone.
    async fn evaluate(
        &self,
        mut schedule: Schedule,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, (ScheduleId, ShadeHubError)> {
        let id = schedule.id;
        let persist = |s: Schedule| async move { self.repo.update(s).await.map_err(|e| (id, e)) };

        // Deadline expiry applies regardless of the trigger.
        if schedule.apply_deadline(now) {
            persist(schedule).await?;
            return Ok(Evaluation::Expired(id));
        }

        let due = match schedule.next_fire(&self.location) {
            Some(next) => next <= now,
            // A one-shot whose moment can no longer arrive.
            None => {
                schedule.record_firing(now, true);
                persist(schedule).await?;
                return Ok(Evaluation::Expired(id));
            }
        };
        if !due {
            return Ok(Evaluation::NotDue);
        }

        let failed = self.fire(&schedule, now).await;
        schedule.record_firing(now, failed);
        let expired = !schedule.is_active();
        persist(schedule).await?;

        if expired {
            Ok(Evaluation::Expired(id))
        } else {
            Ok(Evaluation::Fired(id))
        }
    }

    /// Re-resolve the action template at firing time and dispatch it.
    ///
    /// Returns `true` when the firing failed: planning hit an invalid
    /// scope, or every dispatched action failed. A solar-empty resolution
    /// (no sunny windows right now) is a normal firing with no actions.
    async fn fire(&self, schedule: &Schedule, now: DateTime<Utc>) -> bool {
        let solar = solar::solar_position(now, &self.location);
        let actions = match self
            .planner
            .plan(&schedule.room_scope, &schedule.action_template, solar)
        {
            Ok(actions) => actions,
            Err(PlanError::NoTargetResolved) => {
                tracing::info!(schedule = %schedule.id, "no targets at firing time, nothing to do");
                return false;
            }
            Err(err @ PlanError::InvalidScope { .. }) => {
                tracing::error!(schedule = %schedule.id, error = %err, "firing failed");
                return true;
            }
        };

        let outcomes = self.executor.dispatch(&actions).await;
        let all_failed = !outcomes.is_empty() && outcomes.iter().all(|o| !o.outcome.is_success());
        if all_failed {
            tracing::warn!(schedule = %schedule.id, "every blind in the firing failed");
        }
        all_failed
    }

    /// Drive [`tick`](Self::tick) forever at a fixed cadence.
    ///
    /// Runs on its own task, independent of inbound request traffic.
    pub async fn run(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match self.tick(shadehub_domain::time::now()).await {
                Ok(report) => {
                    if !report.fired.is_empty() || !report.expired.is_empty() {
                        tracing::info!(
                            fired = report.fired.len(),
                            expired = report.expired.len(),
                            "tick completed"
                        );
                    }
                }
                Err(err) => tracing::error!(error = %err, "tick failed"),
            }
        }
    }
}

enum Evaluation {
    Fired(ScheduleId),
    Expired(ScheduleId),
    NotDue,
}
