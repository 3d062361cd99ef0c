//! Command router — the state machine that drives one command run.
//!
//! `Start → TimingAnalysis → {BlindPlanning | ScheduleManagement | Error}
//! → {ExecuteBlinds | End} → End`. Each inbound command is a single
//! synchronous pass through the transition table with no intra-run
//! cycles; the error state is terminal and renders one user-facing
//! message with a stable diagnostic code, never a raw collaborator error.
//!
//! The router is re-entrant: concurrent commands run as independent
//! state-machine instances whose only shared state is the read-only
//! registry/location and the internally synchronized executor and
//! schedule store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use shadehub_domain::action::{BlindOutcome, ResolvedAction};
use shadehub_domain::error::{Diagnostic, NluError, ShadeHubError};
use shadehub_domain::id::{RoomId, ScheduleId};
use shadehub_domain::intent::{IntentDraft, StructuredIntent, Timing};
use shadehub_domain::location::Location;
use shadehub_domain::registry::BlindRegistry;
use shadehub_domain::solar;
use shadehub_domain::tunables::Tunables;

use crate::executor::DeviceExecutor;
use crate::planner::ExecutionPlanner;
use crate::ports::{IntentInterpreter, ScheduleRepository, ShadeHub};
use crate::scheduler::ScheduleManager;

/// Terminal result of one command run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResponse {
    /// Immediate execution finished; per-blind outcomes attached.
    Executed {
        attempted: usize,
        succeeded: usize,
        outcomes: Vec<BlindOutcome>,
    },
    /// A schedule was installed.
    Scheduled {
        schedule_id: ScheduleId,
        next_fire: Option<DateTime<Utc>>,
    },
    /// An existing schedule was cancelled.
    ScheduleCancelled { schedule_id: ScheduleId },
    /// The run ended in the error state.
    Failed {
        diagnostic: Diagnostic,
        message: String,
    },
}

/// The tagged states of one command run.
enum RouterState {
    Start {
        command: String,
        room: RoomId,
    },
    TimingAnalysis {
        draft: IntentDraft,
        room: RoomId,
    },
    BlindPlanning {
        intent: StructuredIntent,
    },
    ScheduleManagement {
        intent: StructuredIntent,
    },
    ExecuteBlinds {
        actions: Vec<ResolvedAction>,
    },
    Error {
        diagnostic: Diagnostic,
        message: String,
    },
    End {
        response: CommandResponse,
    },
}

/// Routes structured intents to immediate execution or scheduling.
pub struct CommandRouter<N, R, H> {
    interpreter: N,
    registry: Arc<BlindRegistry>,
    planner: Arc<ExecutionPlanner>,
    executor: Arc<DeviceExecutor<H>>,
    schedules: Arc<ScheduleManager<R, H>>,
    tunables: Arc<Tunables>,
    location: Location,
}

impl<N, R, H> CommandRouter<N, R, H>
where
    N: IntentInterpreter,
    R: ScheduleRepository,
    H: ShadeHub + Sync,
{
    /// Wire a router over its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        interpreter: N,
        registry: Arc<BlindRegistry>,
        planner: Arc<ExecutionPlanner>,
        executor: Arc<DeviceExecutor<H>>,
        schedules: Arc<ScheduleManager<R, H>>,
        tunables: Arc<Tunables>,
        location: Location,
    ) -> Self {
        Self {
            interpreter,
            registry,
            planner,
            executor,
            schedules,
            tunables,
            location,
        }
    }

    /// Run one command through the state machine to completion.
    #[tracing::instrument(skip(self, command), fields(room = %room))]
    pub async fn handle_command(&self, command: &str, room: RoomId) -> CommandResponse {
        let mut state = RouterState::Start {
            command: command.to_string(),
            room,
        };
        loop {
            match self.step(state).await {
                RouterState::End { response } => return response,
                next => state = next,
            }
        }
    }

    /// One transition of the state machine.
    async fn step(&self, state: RouterState) -> RouterState {
        match state {
            RouterState::Start { command, room } => self.enter_timing_analysis(command, room).await,
            RouterState::TimingAnalysis { draft, room } => self.analyze_timing(draft, room),
            RouterState::BlindPlanning { intent } => self.plan_blinds(&intent),
            RouterState::ScheduleManagement { intent } => self.manage_schedule(intent).await,
            RouterState::ExecuteBlinds { actions } => self.execute_blinds(&actions).await,
            RouterState::Error {
                diagnostic,
                message,
            } => {
                tracing::warn!(%diagnostic, %message, "command run failed");
                RouterState::End {
                    response: CommandResponse::Failed {
                        diagnostic,
                        message,
                    },
                }
            }
            RouterState::End { response } => RouterState::End { response },
        }
    }

    /// `Start`: check the room hint, then ask the collaborator for a
    /// draft under the configured timeout.
    async fn enter_timing_analysis(&self, command: String, room: RoomId) -> RouterState {
        if self.registry.room(&room).is_none() {
            return RouterState::Error {
                diagnostic: Diagnostic::InvalidScope,
                message: format!("unknown room '{room}'"),
            };
        }

        let bound = Duration::from_secs(self.tunables.nlu_timeout_secs);
        let draft = match tokio::time::timeout(bound, self.interpreter.interpret(&command, &room))
            .await
        {
            Ok(Ok(draft)) => draft,
            Ok(Err(err)) => return self.fail(&err.into()),
            Err(_) => return self.fail(&NluError::Timeout.into()),
        };
        RouterState::TimingAnalysis { draft, room }
    }

    /// `TimingAnalysis`: validate the draft and branch on its timing.
    fn analyze_timing(&self, draft: IntentDraft, room: RoomId) -> RouterState {
        match StructuredIntent::from_draft(draft, room) {
            Ok(intent) => match intent.timing {
                Timing::Immediate => RouterState::BlindPlanning { intent },
                Timing::Scheduled => RouterState::ScheduleManagement { intent },
                Timing::Ambiguous => self.fail(&NluError::AmbiguousTiming.into()),
            },
            Err(err) => self.fail(&err.into()),
        }
    }

    /// `BlindPlanning`: resolve directives under current solar state.
    fn plan_blinds(&self, intent: &StructuredIntent) -> RouterState {
        let now = shadehub_domain::time::now();
        let position = solar::solar_position(now, &self.location);
        match self.planner.plan(&intent.scope, &intent.directives, position) {
            Ok(actions) => RouterState::ExecuteBlinds { actions },
            Err(err) => self.fail(&err.into()),
        }
    }

    /// `ExecuteBlinds`: dispatch and aggregate per-blind outcomes.
    /// Device failures do not short-circuit the batch.
    async fn execute_blinds(&self, actions: &[ResolvedAction]) -> RouterState {
        let outcomes = self.executor.dispatch(actions).await;
        let succeeded = outcomes.iter().filter(|o| o.outcome.is_success()).count();
        RouterState::End {
            response: CommandResponse::Executed {
                attempted: outcomes.len(),
                succeeded,
                outcomes,
            },
        }
    }

    /// `ScheduleManagement`: create or cancel a schedule.
    async fn manage_schedule(&self, intent: StructuredIntent) -> RouterState {
        let Some(draft) = intent.schedule_draft else {
            // Unreachable after validation, but never panic in a run.
            return self.fail(&NluError::Malformed("missing schedule draft".to_string()).into());
        };

        if let Some(id) = draft.cancel_id {
            return match self.schedules.cancel_schedule(id).await {
                Ok(schedule) => RouterState::End {
                    response: CommandResponse::ScheduleCancelled {
                        schedule_id: schedule.id,
                    },
                },
                Err(ShadeHubError::NotFound(_)) => {
                    // The draft referenced a schedule that does not exist:
                    // the collaborator's reading was wrong.
                    self.fail(
                        &NluError::Malformed(format!("schedule '{id}' does not exist")).into(),
                    )
                }
                Err(err) => self.fail(&err),
            };
        }

        let now = shadehub_domain::time::now();
        match self
            .schedules
            .create_schedule(&draft, intent.directives, intent.scope, now)
            .await
        {
            Ok(schedule) => RouterState::End {
                response: CommandResponse::Scheduled {
                    next_fire: self.schedules.next_fire_of(&schedule),
                    schedule_id: schedule.id,
                },
            },
            Err(err) => self.fail(&err),
        }
    }

    /// Map an internal error onto the terminal error state.
    fn fail(&self, err: &ShadeHubError) -> RouterState {
        let diagnostic = err.diagnostic().unwrap_or(Diagnostic::NluMalformed);
        RouterState::Error {
            diagnostic,
            message: user_message(diagnostic),
        }
    }
}

/// The single user-facing message for each diagnostic code.
fn user_message(diagnostic: Diagnostic) -> String {
    match diagnostic {
        Diagnostic::InvalidScope => "that room is not configured",
        Diagnostic::NoTargetResolved => "no blind matched the command",
        Diagnostic::ScheduleParseError => "could not understand the schedule timing",
        Diagnostic::DeviceTimeout => "a shade controller did not respond",
        Diagnostic::DeviceRejected => "a shade controller refused the command",
        Diagnostic::UnknownDevice => "a shade controller is unknown to the hub",
        Diagnostic::NluTimeout => "the command took too long to interpret",
        Diagnostic::NluMalformed => "could not understand the command",
        Diagnostic::StorageFailure => "the schedule store is unavailable",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex as StdMutex;

    use chrono_tz::Tz;

    use shadehub_domain::action::DispatchOutcome;
    use shadehub_domain::id::BlindId;
    use shadehub_domain::intent::{
        CommandScope, Directive, PositionSpec, ScheduleDraft, Selector,
    };
    use shadehub_domain::orientation::Orientation;
    use shadehub_domain::registry::{Blind, Room};
    use shadehub_domain::schedule::{Schedule, ScheduleStatus};

    use crate::ports::HubCommandFailure;

    // ── Scripted interpreter ───────────────────────────────────────

    enum Script {
        Draft(IntentDraft),
        Fail(NluError),
        Hang,
    }

    struct ScriptedInterpreter {
        script: Script,
    }

    impl IntentInterpreter for ScriptedInterpreter {
        fn interpret(
            &self,
            _command: &str,
            _room_hint: &RoomId,
        ) -> impl Future<Output = Result<IntentDraft, NluError>> + Send {
            let outcome = match &self.script {
                Script::Draft(draft) => Some(Ok(draft.clone())),
                Script::Fail(err) => Some(Err(err.clone())),
                Script::Hang => None,
            };
            async move {
                match outcome {
                    Some(result) => result,
                    None => futures::future::pending().await,
                }
            }
        }
    }

    // ── Recording hub ──────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingHub {
        calls: StdMutex<Vec<(String, u8)>>,
        reject: Option<String>,
    }

    impl ShadeHub for RecordingHub {
        fn set_position(
            &self,
            blind: &BlindId,
            position: u8,
        ) -> impl Future<Output = Result<(), HubCommandFailure>> + Send {
            self.calls
                .lock()
                .unwrap()
                .push((blind.to_string(), position));
            let rejected = self.reject.as_deref() == Some(blind.as_str());
            async move {
                if rejected {
                    Err(HubCommandFailure::Rejected {
                        reason: "obstructed".to_string(),
                    })
                } else {
                    Ok(())
                }
            }
        }

        fn get_position(
            &self,
            _blind: &BlindId,
        ) -> impl Future<Output = Result<Option<u8>, HubCommandFailure>> + Send {
            async { Ok(None) }
        }
    }

    // ── In-memory schedule repo ────────────────────────────────────

    #[derive(Default)]
    struct InMemoryScheduleRepo {
        store: StdMutex<HashMap<ScheduleId, Schedule>>,
    }

    impl ScheduleRepository for InMemoryScheduleRepo {
        fn create(
            &self,
            schedule: Schedule,
        ) -> impl Future<Output = Result<Schedule, ShadeHubError>> + Send {
            let mut store = self.store.lock().unwrap();
            store.insert(schedule.id, schedule.clone());
            async { Ok(schedule) }
        }

        fn get_by_id(
            &self,
            id: ScheduleId,
        ) -> impl Future<Output = Result<Option<Schedule>, ShadeHubError>> + Send {
            let store = self.store.lock().unwrap();
            let result = store.get(&id).cloned();
            async { Ok(result) }
        }

        fn get_all(&self) -> impl Future<Output = Result<Vec<Schedule>, ShadeHubError>> + Send {
            let store = self.store.lock().unwrap();
            let result: Vec<Schedule> = store.values().cloned().collect();
            async { Ok(result) }
        }

        fn get_active(&self) -> impl Future<Output = Result<Vec<Schedule>, ShadeHubError>> + Send {
            let store = self.store.lock().unwrap();
            let result: Vec<Schedule> =
                store.values().filter(|s| s.is_active()).cloned().collect();
            async { Ok(result) }
        }

        fn update(
            &self,
            schedule: Schedule,
        ) -> impl Future<Output = Result<Schedule, ShadeHubError>> + Send {
            let mut store = self.store.lock().unwrap();
            store.insert(schedule.id, schedule.clone());
            async { Ok(schedule) }
        }

        fn delete(
            &self,
            id: ScheduleId,
        ) -> impl Future<Output = Result<(), ShadeHubError>> + Send {
            let mut store = self.store.lock().unwrap();
            store.remove(&id);
            async { Ok(()) }
        }
    }

    // ── Wiring helpers ─────────────────────────────────────────────

    fn registry() -> Arc<BlindRegistry> {
        Arc::new(
            BlindRegistry::new(
                vec![Room {
                    id: RoomId::new("guest_bedroom"),
                    name: "Guest Bedroom".to_string(),
                }],
                vec![
                    Blind {
                        id: BlindId::new("guest-front"),
                        name: "Guest Front Window".to_string(),
                        orientation: Orientation::South,
                        room_id: RoomId::new("guest_bedroom"),
                    },
                    Blind {
                        id: BlindId::new("guest-side"),
                        name: "Guest Side Window".to_string(),
                        orientation: Orientation::East,
                        room_id: RoomId::new("guest_bedroom"),
                    },
                ],
            )
            .unwrap(),
        )
    }

    type TestRouter = CommandRouter<ScriptedInterpreter, InMemoryScheduleRepo, RecordingHub>;

    fn router_with(script: Script, hub: RecordingHub, nlu_timeout_secs: u64) -> TestRouter {
        let location = Location::new(51.48, 0.0, Tz::UTC).unwrap();
        let registry = registry();
        let tunables = Arc::new(Tunables {
            nlu_timeout_secs,
            device_retry_backoff_ms: 1,
            ..Tunables::default()
        });
        let planner = Arc::new(ExecutionPlanner::new(registry.clone(), tunables.clone()));
        let executor = Arc::new(DeviceExecutor::new(hub, registry.clone(), tunables.clone()));
        let schedules = Arc::new(ScheduleManager::new(
            InMemoryScheduleRepo::default(),
            planner.clone(),
            executor.clone(),
            location,
            tunables.clone(),
        ));
        CommandRouter::new(
            ScriptedInterpreter { script },
            registry,
            planner,
            executor,
            schedules,
            tunables,
            location,
        )
    }

    fn immediate_draft(directives: Vec<Directive>) -> IntentDraft {
        IntentDraft {
            timing: Some(Timing::Immediate),
            house_wide: Some(false),
            directives: Some(directives),
            schedule: None,
        }
    }

    fn hub_calls(router: &TestRouter) -> Vec<(String, u8)> {
        router.executor.hub().calls.lock().unwrap().clone()
    }

    // ── Tests ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_execute_named_blind_command_end_to_end() {
        // "open the front window fully" in guest_bedroom.
        let draft = immediate_draft(vec![Directive {
            selector: Selector::Keywords {
                keywords: vec!["front".to_string()],
            },
            position: PositionSpec::Qualitative {
                term: "fully open".to_string(),
            },
        }]);
        let router = router_with(Script::Draft(draft), RecordingHub::default(), 10);

        let response = router
            .handle_command("open the front window fully", RoomId::new("guest_bedroom"))
            .await;

        let CommandResponse::Executed {
            attempted,
            succeeded,
            outcomes,
        } = response
        else {
            panic!("expected executed response");
        };
        assert_eq!((attempted, succeeded), (1, 1));
        assert_eq!(outcomes[0].blind_id, BlindId::new("guest-front"));
        assert_eq!(hub_calls(&router), vec![("guest-front".to_string(), 100)]);
    }

    #[tokio::test]
    async fn should_fail_with_invalid_scope_before_any_device_call() {
        let draft = immediate_draft(vec![Directive {
            selector: Selector::All,
            position: PositionSpec::Percent { value: 0 },
        }]);
        let router = router_with(Script::Draft(draft), RecordingHub::default(), 10);

        let response = router
            .handle_command("close everything", RoomId::new("attic"))
            .await;

        assert_eq!(
            response,
            CommandResponse::Failed {
                diagnostic: Diagnostic::InvalidScope,
                message: user_message(Diagnostic::InvalidScope),
            }
        );
        assert!(hub_calls(&router).is_empty());
    }

    #[tokio::test]
    async fn should_fail_when_interpreter_times_out() {
        let router = router_with(Script::Hang, RecordingHub::default(), 0);

        let response = router
            .handle_command("close the blinds", RoomId::new("guest_bedroom"))
            .await;

        assert!(matches!(
            response,
            CommandResponse::Failed {
                diagnostic: Diagnostic::NluTimeout,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn should_fail_when_interpreter_reports_malformed_command() {
        let router = router_with(
            Script::Fail(NluError::Malformed("gibberish".to_string())),
            RecordingHub::default(),
            10,
        );

        let response = router
            .handle_command("flurgle the window", RoomId::new("guest_bedroom"))
            .await;

        assert!(matches!(
            response,
            CommandResponse::Failed {
                diagnostic: Diagnostic::NluMalformed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn should_fail_on_ambiguous_timing() {
        let draft = IntentDraft {
            timing: Some(Timing::Ambiguous),
            ..IntentDraft::default()
        };
        let router = router_with(Script::Draft(draft), RecordingHub::default(), 10);

        let response = router
            .handle_command("maybe close them sometime", RoomId::new("guest_bedroom"))
            .await;

        assert!(matches!(
            response,
            CommandResponse::Failed {
                diagnostic: Diagnostic::NluMalformed,
                ..
            }
        ));
        assert!(hub_calls(&router).is_empty());
    }

    #[tokio::test]
    async fn should_aggregate_partial_device_failures_without_failing_the_run() {
        let draft = immediate_draft(vec![Directive {
            selector: Selector::All,
            position: PositionSpec::Percent { value: 0 },
        }]);
        let hub = RecordingHub {
            reject: Some("guest-side".to_string()),
            ..RecordingHub::default()
        };
        let router = router_with(Script::Draft(draft), hub, 10);

        let response = router
            .handle_command("close all the blinds", RoomId::new("guest_bedroom"))
            .await;

        let CommandResponse::Executed {
            attempted,
            succeeded,
            outcomes,
        } = response
        else {
            panic!("expected executed response");
        };
        assert_eq!((attempted, succeeded), (2, 1));
        let side = outcomes
            .iter()
            .find(|o| o.blind_id == BlindId::new("guest-side"))
            .unwrap();
        assert!(matches!(
            side.outcome,
            DispatchOutcome::DeviceRejected { .. }
        ));
    }

    #[tokio::test]
    async fn should_install_schedule_for_scheduled_intent() {
        let draft = IntentDraft {
            timing: Some(Timing::Scheduled),
            house_wide: Some(false),
            directives: Some(vec![Directive {
                selector: Selector::All,
                position: PositionSpec::Percent { value: 0 },
            }]),
            schedule: Some(ScheduleDraft {
                time_phrase: Some("sunset".to_string()),
                recurrence_phrase: Some("daily".to_string()),
                ..ScheduleDraft::default()
            }),
        };
        let router = router_with(Script::Draft(draft), RecordingHub::default(), 10);

        let response = router
            .handle_command(
                "close the blinds every day at sunset",
                RoomId::new("guest_bedroom"),
            )
            .await;

        let CommandResponse::Scheduled {
            schedule_id,
            next_fire,
        } = response
        else {
            panic!("expected scheduled response");
        };
        assert!(next_fire.is_some());
        assert!(hub_calls(&router).is_empty());

        let stored = router
            .schedules
            .list_schedules(Some(&CommandScope::Room(RoomId::new("guest_bedroom"))))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, schedule_id);
    }

    #[tokio::test]
    async fn should_fail_scheduling_on_unparseable_phrase() {
        let draft = IntentDraft {
            timing: Some(Timing::Scheduled),
            directives: Some(vec![Directive {
                selector: Selector::All,
                position: PositionSpec::Percent { value: 0 },
            }]),
            schedule: Some(ScheduleDraft {
                time_phrase: Some("at the crack of noonish".to_string()),
                ..ScheduleDraft::default()
            }),
            ..IntentDraft::default()
        };
        let router = router_with(Script::Draft(draft), RecordingHub::default(), 10);

        let response = router
            .handle_command("close them at the crack of noonish", RoomId::new("guest_bedroom"))
            .await;

        assert!(matches!(
            response,
            CommandResponse::Failed {
                diagnostic: Diagnostic::ScheduleParseError,
                ..
            }
        ));
        assert!(router.schedules.list_schedules(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_cancel_schedule_through_command_flow() {
        // Seed a schedule directly through the manager.
        let seed_draft = ScheduleDraft {
            time_phrase: Some("21:00".to_string()),
            recurrence_phrase: Some("daily".to_string()),
            ..ScheduleDraft::default()
        };
        let cancel_intent = |id| IntentDraft {
            timing: Some(Timing::Scheduled),
            schedule: Some(ScheduleDraft {
                cancel_id: Some(id),
                ..ScheduleDraft::default()
            }),
            ..IntentDraft::default()
        };

        let router = router_with(
            Script::Fail(NluError::Timeout),
            RecordingHub::default(),
            10,
        );
        let seeded = router
            .schedules
            .create_schedule(
                &seed_draft,
                vec![Directive {
                    selector: Selector::All,
                    position: PositionSpec::Percent { value: 0 },
                }],
                CommandScope::Room(RoomId::new("guest_bedroom")),
                shadehub_domain::time::now(),
            )
            .await
            .unwrap();

        // Re-wire the interpreter with the cancel draft.
        let router = TestRouter {
            interpreter: ScriptedInterpreter {
                script: Script::Draft(cancel_intent(seeded.id)),
            },
            ..router
        };

        let response = router
            .handle_command("stop closing the blinds every day", RoomId::new("guest_bedroom"))
            .await;

        assert_eq!(
            response,
            CommandResponse::ScheduleCancelled {
                schedule_id: seeded.id
            }
        );
        let stored = router.schedules.list_schedules(None).await.unwrap();
        assert_eq!(stored[0].status, ScheduleStatus::Cancelled);
    }

    #[tokio::test]
    async fn should_fail_cancelling_unknown_schedule() {
        let draft = IntentDraft {
            timing: Some(Timing::Scheduled),
            schedule: Some(ScheduleDraft {
                cancel_id: Some(ScheduleId::new()),
                ..ScheduleDraft::default()
            }),
            ..IntentDraft::default()
        };
        let router = router_with(Script::Draft(draft), RecordingHub::default(), 10);

        let response = router
            .handle_command("stop that schedule", RoomId::new("guest_bedroom"))
            .await;

        assert!(matches!(
            response,
            CommandResponse::Failed {
                diagnostic: Diagnostic::NluMalformed,
                ..
            }
        ));
    }
}
