//! Stable handles for world entities and the allocator that issues them.
//!
//! Handles are plain integers so that cross references survive merge/split
//! and save/load without any pointer fix-up. The allocator only ever moves
//! forward: restoring a saved allocator never lowers a high-water mark.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// Handle of a room.
    RoomId,
    "Room"
);
handle!(
    /// Handle of a door.
    DoorId,
    "Door"
);
handle!(
    /// Handle of an actor (student, professor or cleaner).
    ActorId,
    "Actor"
);
handle!(
    /// Handle of an item, wherever it currently lives.
    ItemId,
    "Item"
);

/// High-water marks for every handle kind.
///
/// Each counter holds the last value issued, so the next handle is
/// `counter + 1`. Handles start at 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    pub doors: u32,
    pub actors: u32,
    pub items: u32,
    pub rooms: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_room(&mut self) -> RoomId {
        self.rooms += 1;
        RoomId(self.rooms)
    }

    pub fn next_door(&mut self) -> DoorId {
        self.doors += 1;
        DoorId(self.doors)
    }

    pub fn next_actor(&mut self) -> ActorId {
        self.actors += 1;
        ActorId(self.actors)
    }

    pub fn next_item(&mut self) -> ItemId {
        self.items += 1;
        ItemId(self.items)
    }

    /// Raise every mark to at least the saved value. Never lowers a mark.
    pub fn restore(&mut self, saved: IdAllocator) {
        self.doors = self.doors.max(saved.doors);
        self.actors = self.actors.max(saved.actors);
        self.items = self.items.max(saved.items);
        self.rooms = self.rooms.max(saved.rooms);
    }

    pub fn observe_room(&mut self, id: RoomId) {
        self.rooms = self.rooms.max(id.0);
    }

    pub fn observe_door(&mut self, id: DoorId) {
        self.doors = self.doors.max(id.0);
    }

    pub fn observe_actor(&mut self, id: ActorId) {
        self.actors = self.actors.max(id.0);
    }

    pub fn observe_item(&mut self, id: ItemId) {
        self.items = self.items.max(id.0);
    }
}
