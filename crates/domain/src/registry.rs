//! Blind registry — the static model of rooms and blinds.
//!
//! Loaded once at startup from configuration and read-only afterwards;
//! no locking is needed to share it across the router and the scheduling
//! loop. Blinds are immutable here — the only runtime-mutable blind field
//! (`last_known_position`) is owned by the device executor.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ShadeHubError, ValidationError};
use crate::id::{BlindId, RoomId};
use crate::intent::CommandScope;
use crate::orientation::Orientation;

/// A motorized window covering with a settable position (0–100%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blind {
    pub id: BlindId,
    pub name: String,
    pub orientation: Orientation,
    pub room_id: RoomId,
}

impl Blind {
    /// Case-insensitive substring match of `keyword` against the blind's
    /// name, the matching rule for explicit selectors.
    #[must_use]
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.name
            .to_lowercase()
            .contains(&keyword.trim().to_lowercase())
    }
}

/// A room: an ordered set of blinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
}

/// The full registry of rooms and blinds.
///
/// Rooms partition blinds; house-wide scope is the union of all rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlindRegistry {
    rooms: Vec<Room>,
    blinds: Vec<Blind>,
}

impl BlindRegistry {
    /// Build a registry, checking invariants: blind ids are unique, every
    /// blind's room exists, and blind names are unique within a room.
    ///
    /// # Errors
    ///
    /// Returns [`ShadeHubError::Validation`] on a duplicate blind id, a
    /// dangling room reference, or an empty room/blind name.
    pub fn new(rooms: Vec<Room>, blinds: Vec<Blind>) -> Result<Self, ShadeHubError> {
        let room_ids: HashSet<&RoomId> = rooms.iter().map(|r| &r.id).collect();
        let mut seen_blinds = HashSet::new();

        for room in &rooms {
            if room.name.is_empty() {
                return Err(ValidationError::EmptyName.into());
            }
        }
        for blind in &blinds {
            if blind.name.is_empty() {
                return Err(ValidationError::EmptyName.into());
            }
            if !seen_blinds.insert(&blind.id) {
                return Err(ValidationError::DuplicateBlind(blind.id.to_string()).into());
            }
            if !room_ids.contains(&blind.room_id) {
                return Err(ValidationError::UnknownRoom {
                    blind: blind.id.to_string(),
                    room: blind.room_id.to_string(),
                }
                .into());
            }
        }

        Ok(Self { rooms, blinds })
    }

    /// All configured rooms, in declaration order.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// All configured blinds, in declaration order.
    #[must_use]
    pub fn blinds(&self) -> &[Blind] {
        &self.blinds
    }

    /// Look up a room by id.
    #[must_use]
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    /// Look up a blind by id.
    #[must_use]
    pub fn blind(&self, id: &BlindId) -> Option<&Blind> {
        self.blinds.iter().find(|b| &b.id == id)
    }

    /// The blinds of a single room, in declaration order.
    #[must_use]
    pub fn blinds_in_room(&self, room: &RoomId) -> Vec<&Blind> {
        self.blinds.iter().filter(|b| &b.room_id == room).collect()
    }

    /// Expand a command scope into its candidate blind set.
    ///
    /// An unknown room yields an empty set — the planner turns that into
    /// an invalid-scope error.
    #[must_use]
    pub fn candidates(&self, scope: &CommandScope) -> Vec<&Blind> {
        match scope {
            CommandScope::House => self.blinds.iter().collect(),
            CommandScope::Room(room) => {
                if self.room(room).is_none() {
                    Vec::new()
                } else {
                    self.blinds_in_room(room)
                }
            }
        }
    }
}
