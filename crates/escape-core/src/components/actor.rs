//! Actor components: students, professors and cleaners.

use super::ids::{ActorId, ItemId, RoomId};
use serde::{Deserialize, Serialize};

/// Which kind of actor this is. Used as the key of the encounter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Student,
    Professor,
    CleaningLady,
}

impl ActorKind {
    /// Parse an auxiliary-actor token. Students are created by name, not token.
    pub fn auxiliary_from_token(token: &str) -> Option<Self> {
        match token {
            "Professor" => Some(ActorKind::Professor),
            "CleaningLady" => Some(ActorKind::CleaningLady),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            ActorKind::Student => "Student",
            ActorKind::Professor => "Professor",
            ActorKind::CleaningLady => "CleaningLady",
        }
    }
}

/// Variant-specific state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student {
        /// Ticks left during which professors cannot harm this student.
        drunk_for: u32,
        /// Set once the student has used its move for the current turn.
        moved: bool,
    },
    Professor,
    CleaningLady,
}

impl Role {
    pub fn for_kind(kind: ActorKind) -> Self {
        match kind {
            ActorKind::Student => Role::Student {
                drunk_for: 0,
                moved: false,
            },
            ActorKind::Professor => Role::Professor,
            ActorKind::CleaningLady => Role::CleaningLady,
        }
    }
}

/// Actor component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) name: String,
    pub(crate) role: Role,
    /// Lookup-only back reference; the room's resident list is authoritative.
    pub(crate) room: RoomId,
    pub(crate) inventory: Vec<ItemId>,
    pub(crate) stunned_for: u32,
    pub(crate) killed: bool,
}

impl Actor {
    pub fn new(id: ActorId, name: impl Into<String>, kind: ActorKind, room: RoomId) -> Self {
        Self {
            id,
            name: name.into(),
            role: Role::for_kind(kind),
            room,
            inventory: Vec::new(),
            stunned_for: 0,
            killed: false,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ActorKind {
        match self.role {
            Role::Student { .. } => ActorKind::Student,
            Role::Professor => ActorKind::Professor,
            Role::CleaningLady => ActorKind::CleaningLady,
        }
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    pub fn inventory(&self) -> &[ItemId] {
        &self.inventory
    }

    pub fn holds(&self, item: ItemId) -> bool {
        self.inventory.contains(&item)
    }

    pub fn stunned_for(&self) -> u32 {
        self.stunned_for
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned_for > 0
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn is_student(&self) -> bool {
        matches!(self.role, Role::Student { .. })
    }

    pub fn is_living_student(&self) -> bool {
        self.is_student() && !self.killed
    }

    /// Stunned or killed actors cannot act.
    pub fn can_act(&self) -> bool {
        !self.is_stunned() && !self.killed
    }

    pub fn drunk_for(&self) -> u32 {
        match self.role {
            Role::Student { drunk_for, .. } => drunk_for,
            _ => 0,
        }
    }

    pub fn is_drunk(&self) -> bool {
        self.drunk_for() > 0
    }

    pub fn has_moved(&self) -> bool {
        matches!(self.role, Role::Student { moved: true, .. })
    }

    pub(crate) fn set_moved(&mut self, value: bool) {
        if let Role::Student { moved, .. } = &mut self.role {
            *moved = value;
        }
    }

    pub(crate) fn make_drunk(&mut self, ticks: u32) {
        if let Role::Student { drunk_for, .. } = &mut self.role {
            *drunk_for = ticks;
        }
    }

    pub(crate) fn stun(&mut self, ticks: u32) {
        self.stunned_for = ticks;
    }

    /// Count down stun and drunk timers. Returns true if anything changed.
    pub(crate) fn tick(&mut self) -> bool {
        let mut changed = false;
        if self.stunned_for > 0 {
            self.stunned_for -= 1;
            changed = true;
        }
        if let Role::Student { drunk_for, .. } = &mut self.role {
            if *drunk_for > 0 {
                *drunk_for -= 1;
                changed = true;
            }
        }
        changed
    }
}
