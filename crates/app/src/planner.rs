//! Blind execution planner — resolves a structured intent into concrete
//! per-blind actions.
//!
//! Stateless over the read-only registry and tunables, so the router and
//! the scheduling loop can call it concurrently. Solar state is passed in
//! by the caller: immediate commands evaluate it at command time, the
//! schedule manager at firing time.

use std::collections::HashMap;
use std::sync::Arc;

use shadehub_domain::action::{ResolutionReason, ResolvedAction};
use shadehub_domain::error::PlanError;
use shadehub_domain::intent::{CommandScope, Directive, PositionSpec, Selector};
use shadehub_domain::registry::{Blind, BlindRegistry};
use shadehub_domain::solar::SolarPosition;
use shadehub_domain::tunables::Tunables;

/// Resolves intents into ordered, deduplicated action lists.
pub struct ExecutionPlanner {
    registry: Arc<BlindRegistry>,
    tunables: Arc<Tunables>,
}

impl ExecutionPlanner {
    /// Create a planner over the shared registry and tunables.
    #[must_use]
    pub fn new(registry: Arc<BlindRegistry>, tunables: Arc<Tunables>) -> Self {
        Self { registry, tunables }
    }

    /// Resolve `directives` against `scope` under the given solar state.
    ///
    /// Returns one action per touched blind; when a command names the
    /// same blind twice, the last directive wins. A directive that
    /// matches nothing is dropped (and logged) as long as some other
    /// directive resolved — tolerance for noisy language input.
    ///
    /// # Errors
    ///
    /// - [`PlanError::InvalidScope`] when the scope names an unknown room
    /// - [`PlanError::NoTargetResolved`] when every directive resolved to
    ///   zero blinds
    pub fn plan(
        &self,
        scope: &CommandScope,
        directives: &[Directive],
        solar: SolarPosition,
    ) -> Result<Vec<ResolvedAction>, PlanError> {
        let candidates = self.registry.candidates(scope);
        if candidates.is_empty() {
            if let CommandScope::Room(room) = scope {
                return Err(PlanError::InvalidScope { room: room.clone() });
            }
            return Err(PlanError::NoTargetResolved);
        }

        let mut actions: Vec<ResolvedAction> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut resolved_directives = 0usize;

        for directive in directives {
            let targets = self.select(&candidates, &directive.selector, solar);
            if targets.is_empty() {
                tracing::warn!(selector = ?directive.selector, "directive matched no blind, dropping");
                continue;
            }
            let Some((position, reason)) = self.position_of(directive, solar) else {
                tracing::warn!(position = ?directive.position, "unknown position term, dropping directive");
                continue;
            };
            resolved_directives += 1;

            for blind in targets {
                let action = ResolvedAction {
                    blind_id: blind.id.clone(),
                    target_position: position,
                    reason,
                };
                match slots.get(blind.id.as_str()) {
                    // Last directive for a given blind wins, in place.
                    Some(&slot) => actions[slot] = action,
                    None => {
                        slots.insert(blind.id.as_str(), actions.len());
                        actions.push(action);
                    }
                }
            }
        }

        if resolved_directives == 0 {
            return Err(PlanError::NoTargetResolved);
        }
        Ok(actions)
    }

    /// Blinds in the candidate set picked by a selector.
    fn select<'a>(
        &self,
        candidates: &[&'a Blind],
        selector: &Selector,
        solar: SolarPosition,
    ) -> Vec<&'a Blind> {
        match selector {
            Selector::All => candidates.to_vec(),
            Selector::Keywords { keywords } => candidates
                .iter()
                .filter(|blind| keywords.iter().any(|kw| blind.matches_keyword(kw)))
                .copied()
                .collect(),
            Selector::Sunny => {
                if !solar.is_up() {
                    return Vec::new();
                }
                candidates
                    .iter()
                    .filter(|blind| {
                        blind
                            .orientation
                            .within_sun_arc(solar.azimuth, self.tunables.sun_arc_tolerance_deg)
                    })
                    .copied()
                    .collect()
            }
        }
    }

    /// The target position a directive asks for, with its reason.
    fn position_of(
        &self,
        directive: &Directive,
        solar: SolarPosition,
    ) -> Option<(u8, ResolutionReason)> {
        let solar_selected = directive.selector == Selector::Sunny;
        match &directive.position {
            PositionSpec::Percent { value } => {
                let reason = if solar_selected {
                    ResolutionReason::SolarResolved
                } else {
                    ResolutionReason::Direct
                };
                Some(((*value).min(100), reason))
            }
            PositionSpec::Qualitative { term } => {
                let position = self.tunables.qualitative_position(term)?;
                let reason = if solar_selected {
                    ResolutionReason::SolarResolved
                } else {
                    ResolutionReason::Default
                };
                Some((position, reason))
            }
            PositionSpec::BlockSun => Some((
                self.tunables.block_sun_position(solar.elevation),
                ResolutionReason::SolarResolved,
            )),
        }
    }
}
