//! Room and door components: the nodes and edges of the campus graph.

use super::ids::{ActorId, DoorId, ItemId, RoomId};
use serde::{Deserialize, Serialize};

/// Environmental hazards a room can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hazard {
    /// Poisons arriving actors and residents every lap.
    Toxic,
    /// Immobilizes arriving actors and residents every lap.
    Wet,
    /// Items can no longer be picked up.
    Sticky,
    /// Flips every incident door open/closed every lap.
    Cursed,
}

/// The four independent hazard flags of a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazards {
    pub toxic: bool,
    pub wet: bool,
    pub sticky: bool,
    pub cursed: bool,
}

impl Hazards {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, hazard: Hazard) -> Self {
        self.set(hazard, true);
        self
    }

    pub fn set(&mut self, hazard: Hazard, value: bool) {
        match hazard {
            Hazard::Toxic => self.toxic = value,
            Hazard::Wet => self.wet = value,
            Hazard::Sticky => self.sticky = value,
            Hazard::Cursed => self.cursed = value,
        }
    }

    pub fn has(&self, hazard: Hazard) -> bool {
        match hazard {
            Hazard::Toxic => self.toxic,
            Hazard::Wet => self.wet,
            Hazard::Sticky => self.sticky,
            Hazard::Cursed => self.cursed,
        }
    }

    /// Flags a room inherits from `donor` during merge or split.
    ///
    /// Toxicity follows the donor's *cursed* flag, not its toxic flag.
    pub fn inherited_from(donor: &Hazards) -> Hazards {
        Hazards {
            toxic: donor.cursed,
            wet: donor.wet,
            sticky: donor.sticky,
            cursed: donor.cursed,
        }
    }

    /// Set every flag that is set in `other`; never clears a flag.
    pub fn absorb(&mut self, other: Hazards) {
        self.toxic |= other.toxic;
        self.wet |= other.wet;
        self.sticky |= other.sticky;
        self.cursed |= other.cursed;
    }
}

/// Room component - a node of the campus graph.
///
/// The room owns the authoritative resident list; `Actor::room` is a
/// lookup back-reference kept in sync by the movement system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub(crate) id: RoomId,
    /// Maximum resident count.
    pub(crate) capacity: u32,
    pub(crate) hazards: Hazards,
    /// Negative = disarmed; positive = arrivals left until the room turns sticky.
    pub(crate) sticky_countdown: i32,
    pub(crate) residents: Vec<ActorId>,
    pub(crate) items: Vec<ItemId>,
    pub(crate) doors: Vec<DoorId>,
}

impl Room {
    pub fn new(id: RoomId, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            hazards: Hazards::none(),
            sticky_countdown: -1,
            residents: Vec::new(),
            items: Vec::new(),
            doors: Vec::new(),
        }
    }

    pub fn with_hazards(mut self, hazards: Hazards) -> Self {
        self.hazards = hazards;
        self
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn hazards(&self) -> Hazards {
        self.hazards
    }

    pub fn sticky_countdown(&self) -> i32 {
        self.sticky_countdown
    }

    pub fn residents(&self) -> &[ActorId] {
        &self.residents
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn doors(&self) -> &[DoorId] {
        &self.doors
    }

    pub fn is_full(&self) -> bool {
        self.residents.len() >= self.capacity as usize
    }

    pub fn is_empty(&self) -> bool {
        self.residents.is_empty()
    }

    pub fn has_resident(&self, actor: ActorId) -> bool {
        self.residents.contains(&actor)
    }

    pub fn has_item(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }

    pub fn has_door(&self, door: DoorId) -> bool {
        self.doors.contains(&door)
    }

    /// Arm the sticky countdown: the room turns sticky after `arrivals` more arrivals.
    pub fn arm_sticky(&mut self, arrivals: i32) {
        self.sticky_countdown = arrivals;
    }

    /// Count one arrival against the sticky countdown.
    ///
    /// Returns true if this arrival turned the room sticky.
    pub(crate) fn count_arrival(&mut self) -> bool {
        if self.sticky_countdown <= 0 {
            return false;
        }
        self.sticky_countdown -= 1;
        if self.sticky_countdown == 0 {
            self.hazards.sticky = true;
            self.sticky_countdown = -1;
            return true;
        }
        false
    }
}

/// Door component - an edge between exactly two rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub(crate) id: DoorId,
    pub(crate) first: RoomId,
    pub(crate) second: RoomId,
    pub(crate) closed: bool,
    /// One-way doors only let actors through from `first` to `second`.
    pub(crate) one_way: bool,
}

impl Door {
    pub fn new(id: DoorId, first: RoomId, second: RoomId) -> Self {
        Self {
            id,
            first,
            second,
            closed: false,
            one_way: false,
        }
    }

    pub fn one_way(mut self, one_way: bool) -> Self {
        self.one_way = one_way;
        self
    }

    pub fn id(&self) -> DoorId {
        self.id
    }

    pub fn endpoints(&self) -> (RoomId, RoomId) {
        (self.first, self.second)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_one_way(&self) -> bool {
        self.one_way
    }

    /// The room on the other side of the door, seen from `room`.
    pub fn neighbour(&self, room: RoomId) -> Option<RoomId> {
        if room == self.first {
            Some(self.second)
        } else if room == self.second {
            Some(self.first)
        } else {
            None
        }
    }

    /// Destination room if an actor standing in `from` may pass through.
    pub fn passage_from(&self, from: RoomId) -> Option<RoomId> {
        if self.closed {
            return None;
        }
        let dest = self.neighbour(from)?;
        if self.one_way && dest != self.second {
            return None;
        }
        Some(dest)
    }

    /// Re-point every endpoint equal to `old` at `new`.
    pub(crate) fn swap_endpoint(&mut self, old: RoomId, new: RoomId) {
        if self.first == old {
            self.first = new;
        }
        if self.second == old {
            self.second = new;
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.first == self.second
    }

    pub(crate) fn toggle(&mut self) {
        self.closed = !self.closed;
    }
}
