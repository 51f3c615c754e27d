//! Change notifications for presentation layers.
//!
//! Every mutating operation emits a typed [`ChangeEvent`] for each object it
//! touched. Listeners subscribe per object (or to everything) and are called
//! synchronously, after the change has been applied. A listener only sees
//! the event, never the game, so it cannot re-enter a mutating call.

use crate::components::{ActorId, DoorId, ItemId, RoomId};
use std::collections::HashMap;
use std::fmt;

/// The object an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Room(RoomId),
    Door(DoorId),
    Actor(ActorId),
    Item(ItemId),
    Game,
}

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// An actor went from one room to another.
    Moved { from: RoomId, to: RoomId },
    /// A move attempt was refused. Hazards may still have hit the actor.
    MoveRefused,
    /// A room decided whether to admit an arriving actor.
    EntryChecked { actor: ActorId, accepted: bool },
    /// Stun or drunk counters changed.
    StatusChanged,
    Killed,
    InventoryChanged,
    ResidentsChanged,
    ItemsChanged,
    DoorsChanged,
    HazardsChanged,
    /// Charges, pairing or deployment of an item changed.
    ItemStateChanged,
    DoorToggled { closed: bool },
    DoorRewired,
    RoomsMerged { survivor: RoomId, absorbed: RoomId },
    RoomSplit { source: RoomId, created: RoomId },
    LapCompleted { turn: u32 },
    Won,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub object: ObjectRef,
    pub change: Change,
}

/// Returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&ChangeEvent)>;

/// Per-object interest lists plus firehose subscribers.
#[derive(Default)]
pub struct Notifier {
    by_object: HashMap<ObjectRef, Vec<(ListenerId, Listener)>>,
    everything: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, object: ObjectRef, listener: Listener) -> ListenerId {
        let id = self.allocate();
        self.by_object.entry(object).or_default().push((id, listener));
        id
    }

    /// Listen to every event of every object.
    pub fn subscribe_all(&mut self, listener: Listener) -> ListenerId {
        let id = self.allocate();
        self.everything.push((id, listener));
        id
    }

    /// Remove a listener. Returns false if it was not registered on `object`.
    pub fn unsubscribe(&mut self, object: ObjectRef, id: ListenerId) -> bool {
        let Some(list) = self.by_object.get_mut(&object) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.by_object.remove(&object);
        }
        removed
    }

    pub fn unsubscribe_all(&mut self, id: ListenerId) -> bool {
        let before = self.everything.len();
        self.everything.retain(|(lid, _)| *lid != id);
        self.everything.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.everything.len() + self.by_object.values().map(Vec::len).sum::<usize>()
    }

    pub fn emit(&mut self, object: ObjectRef, change: Change) {
        if self.everything.is_empty() && self.by_object.is_empty() {
            return;
        }
        let event = ChangeEvent { object, change };
        if let Some(list) = self.by_object.get_mut(&object) {
            for (_, listener) in list.iter_mut() {
                listener(&event);
            }
        }
        for (_, listener) in self.everything.iter_mut() {
            listener(&event);
        }
    }

    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
