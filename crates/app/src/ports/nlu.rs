//! NLU port — the external text-understanding collaborator.

use std::future::Future;

use shadehub_domain::error::NluError;
use shadehub_domain::id::RoomId;
use shadehub_domain::intent::IntentDraft;

/// Turns raw command text into a structured intent draft.
///
/// The draft is a best-effort reading of noisy language: fields may be
/// absent or wrong, and the core validates structural completeness itself
/// rather than trusting the collaborator. Implementations should fail
/// with [`NluError::Malformed`] for unusable responses; the router applies
/// its own timeout on top of the call.
pub trait IntentInterpreter {
    /// Interpret a command issued from `room_hint`.
    fn interpret(
        &self,
        command: &str,
        room_hint: &RoomId,
    ) -> impl Future<Output = Result<IntentDraft, NluError>> + Send;
}
