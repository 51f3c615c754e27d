//! The game aggregate - owns the ECS world and runs the per-lap tick.

use std::collections::HashMap;
use std::fmt::Write as _;

use hecs::{Component, Entity, Ref, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::*;
use crate::config::GameConfig;
use crate::events::{Change, Listener, ListenerId, Notifier, ObjectRef};
use crate::persistence::{self, SaveError};
use crate::systems::{hazards, topology};

/// Readable game status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Won,
    Lost,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Ongoing => "ongoing",
            GameStatus::Won => "won",
            GameStatus::Lost => "lost",
        }
    }
}

/// Entity lookup by stable handle.
#[derive(Debug, Default)]
pub(crate) struct HandleIndex {
    pub(crate) rooms: HashMap<RoomId, Entity>,
    pub(crate) doors: HashMap<DoorId, Entity>,
    pub(crate) actors: HashMap<ActorId, Entity>,
    pub(crate) items: HashMap<ItemId, Entity>,
}

/// Owns the world of rooms, doors, actors and items plus the turn counter.
///
/// Every object is an entity carrying its handle component (`RoomId`,
/// `DoorId`, ...) next to its data component. Handles survive merge, split
/// and save/load; entities do not, so cross references always use handles.
pub struct Game {
    pub(crate) config: GameConfig,
    /// ECS world containing all entities
    pub(crate) world: World,
    pub(crate) index: HandleIndex,
    /// The room collection. Merge removes from it, split appends to it.
    pub(crate) room_order: Vec<RoomId>,
    /// Turn sequence. Killed actors stay in it and are skipped.
    pub(crate) turn_order: Vec<ActorId>,
    /// Lap counter, starts at 1.
    pub(crate) turn: u32,
    pub(crate) won: bool,
    pub(crate) ids: IdAllocator,
    pub(crate) rng: StdRng,
    pub(crate) notifier: Notifier,
}

impl Game {
    /// Create an empty game.
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            world: World::new(),
            index: HandleIndex::default(),
            room_order: Vec::new(),
            turn_order: Vec::new(),
            turn: 1,
            won: false,
            ids: IdAllocator::new(),
            rng,
            notifier: Notifier::new(),
        }
    }

    // ── Construction ────────────────────────────────────────────────────

    pub fn spawn_room(&mut self, capacity: u32, hazards: Hazards) -> RoomId {
        let id = self.ids.next_room();
        self.insert_room(Room::new(id, capacity).with_hazards(hazards));
        id
    }

    /// Connect two distinct existing rooms. Returns None otherwise.
    pub fn spawn_door(&mut self, first: RoomId, second: RoomId, one_way: bool) -> Option<DoorId> {
        if first == second || !self.has_room(first) || !self.has_room(second) {
            return None;
        }
        let id = self.ids.next_door();
        let entity = self
            .world
            .spawn((id, Door::new(id, first, second).one_way(one_way)));
        self.index.doors.insert(id, entity);
        for room in [first, second] {
            if let Some(r) = self.room_mut(room) {
                r.doors.push(id);
            }
            self.notify(ObjectRef::Room(room), Change::DoorsChanged);
        }
        Some(id)
    }

    /// Place a new actor in `room` and append it to the turn order.
    pub fn spawn_actor(&mut self, name: &str, kind: ActorKind, room: RoomId) -> Option<ActorId> {
        if !self.has_room(room) {
            return None;
        }
        let id = self.ids.next_actor();
        let name = if name.is_empty() {
            format!("{}#{}", kind.token(), id.0)
        } else {
            name.to_string()
        };
        let entity = self.world.spawn((id, Actor::new(id, name, kind, room)));
        self.index.actors.insert(id, entity);
        self.turn_order.push(id);
        if let Some(r) = self.room_mut(room) {
            r.residents.push(id);
        }
        self.notify(ObjectRef::Room(room), Change::ResidentsChanged);
        Some(id)
    }

    /// Create an item owned by a room or an actor.
    ///
    /// Construction bypasses the inventory capacity check, like any other
    /// world-building step.
    pub fn spawn_item(&mut self, kind: ItemKind, decoy: bool, owner: Owner) -> Option<ItemId> {
        let exists = match owner {
            Owner::Room(room) => self.has_room(room),
            Owner::Actor(actor) => self.index.actors.contains_key(&actor),
        };
        if !exists {
            return None;
        }
        let id = self.ids.next_item();
        let entity = self.world.spawn((id, Item::new(id, kind, decoy, owner)));
        self.index.items.insert(id, entity);
        match owner {
            Owner::Room(room) => {
                if let Some(r) = self.room_mut(room) {
                    r.items.push(id);
                }
                self.notify(ObjectRef::Room(room), Change::ItemsChanged);
            }
            Owner::Actor(actor) => {
                if let Some(a) = self.actor_mut(actor) {
                    a.inventory.push(id);
                }
                self.notify(ObjectRef::Actor(actor), Change::InventoryChanged);
            }
        }
        Some(id)
    }

    /// Spawn a room entity and append it to the room collection.
    pub(crate) fn insert_room(&mut self, room: Room) {
        let id = room.id;
        let entity = self.world.spawn((id, room));
        self.index.rooms.insert(id, entity);
        self.room_order.push(id);
    }

    /// Despawn a room, handing back its data.
    pub(crate) fn remove_room(&mut self, id: RoomId) -> Option<Room> {
        let entity = self.index.rooms.remove(&id)?;
        self.room_order.retain(|r| *r != id);
        let room = self.world.remove_one::<Room>(entity).ok();
        let _ = self.world.despawn(entity);
        room
    }

    pub(crate) fn remove_door(&mut self, id: DoorId) {
        if let Some(entity) = self.index.doors.remove(&id) {
            let _ = self.world.despawn(entity);
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The underlying ECS world, for read-only queries.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn has_room(&self, id: RoomId) -> bool {
        self.index.rooms.contains_key(&id)
    }

    pub fn room(&self, id: RoomId) -> Option<Ref<'_, Room>> {
        let entity = *self.index.rooms.get(&id)?;
        self.world.get::<&Room>(entity).ok()
    }

    pub fn door(&self, id: DoorId) -> Option<Ref<'_, Door>> {
        let entity = *self.index.doors.get(&id)?;
        self.world.get::<&Door>(entity).ok()
    }

    pub fn actor(&self, id: ActorId) -> Option<Ref<'_, Actor>> {
        let entity = *self.index.actors.get(&id)?;
        self.world.get::<&Actor>(entity).ok()
    }

    pub fn item(&self, id: ItemId) -> Option<Ref<'_, Item>> {
        let entity = *self.index.items.get(&id)?;
        self.world.get::<&Item>(entity).ok()
    }

    pub(crate) fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        let entity = *self.index.rooms.get(&id)?;
        self.world.query_one_mut::<&mut Room>(entity).ok()
    }

    pub(crate) fn door_mut(&mut self, id: DoorId) -> Option<&mut Door> {
        let entity = *self.index.doors.get(&id)?;
        self.world.query_one_mut::<&mut Door>(entity).ok()
    }

    pub(crate) fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        let entity = *self.index.actors.get(&id)?;
        self.world.query_one_mut::<&mut Actor>(entity).ok()
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        let entity = *self.index.items.get(&id)?;
        self.world.query_one_mut::<&mut Item>(entity).ok()
    }

    /// Rooms in collection order.
    pub fn rooms(&self) -> impl Iterator<Item = Ref<'_, Room>> + '_ {
        self.room_order.iter().filter_map(move |id| self.room(*id))
    }

    /// Doors in handle order.
    pub fn doors(&self) -> impl Iterator<Item = Ref<'_, Door>> + '_ {
        sorted_handles::<DoorId>(&self.world)
            .into_iter()
            .filter_map(move |id| self.door(id))
    }

    /// Actors in turn order.
    pub fn actors(&self) -> impl Iterator<Item = Ref<'_, Actor>> + '_ {
        self.turn_order.iter().filter_map(move |id| self.actor(*id))
    }

    /// Items in handle order.
    pub fn items(&self) -> impl Iterator<Item = Ref<'_, Item>> + '_ {
        sorted_handles::<ItemId>(&self.world)
            .into_iter()
            .filter_map(move |id| self.item(id))
    }

    pub fn room_ids(&self) -> &[RoomId] {
        &self.room_order
    }

    pub fn turn_order(&self) -> &[ActorId] {
        &self.turn_order
    }

    pub fn room_count(&self) -> usize {
        self.room_order.len()
    }

    pub fn item_count(&self) -> usize {
        self.index.items.len()
    }

    pub fn students(&self) -> impl Iterator<Item = Ref<'_, Actor>> + '_ {
        self.actors().filter(|a| a.is_student())
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn id_marks(&self) -> IdAllocator {
        self.ids
    }

    /// True once the lap limit is exceeded, every student is dead, or the game is won.
    pub fn game_ended(&self) -> bool {
        let all_students_dead = self
            .world
            .query::<&Actor>()
            .iter()
            .filter(|(_, a)| a.is_student())
            .all(|(_, a)| a.is_killed());
        self.turn > self.config.max_turns || all_students_dead || self.won
    }

    pub fn status(&self) -> GameStatus {
        if !self.game_ended() {
            GameStatus::Ongoing
        } else if self.won {
            GameStatus::Won
        } else {
            GameStatus::Lost
        }
    }

    // ── Notifications ───────────────────────────────────────────────────

    pub fn subscribe(&mut self, object: ObjectRef, listener: Listener) -> ListenerId {
        self.notifier.subscribe(object, listener)
    }

    pub fn subscribe_all(&mut self, listener: Listener) -> ListenerId {
        self.notifier.subscribe_all(listener)
    }

    pub fn unsubscribe(&mut self, object: ObjectRef, id: ListenerId) -> bool {
        self.notifier.unsubscribe(object, id)
    }

    pub fn unsubscribe_all(&mut self, id: ListenerId) -> bool {
        self.notifier.unsubscribe_all(id)
    }

    pub(crate) fn notify(&mut self, object: ObjectRef, change: Change) {
        self.notifier.emit(object, change);
    }

    // ── Mutation ────────────────────────────────────────────────────────

    pub(crate) fn set_won(&mut self) {
        if !self.won {
            self.won = true;
            log::info!("the winning item was claimed on lap {}", self.turn);
            self.notify(ObjectRef::Game, Change::Won);
        }
    }

    /// Count down one actor's stun and drunk timers.
    pub fn tick_actor(&mut self, id: ActorId) {
        let changed = self.actor_mut(id).map(Actor::tick).unwrap_or(false);
        if changed {
            self.notify(ObjectRef::Actor(id), Change::StatusChanged);
        }
    }

    /// One full lap: actor timers, room hazards, topology mutation, lap counter.
    pub fn lap_tick(&mut self) {
        let order = self.turn_order.clone();
        for actor in order {
            self.tick_actor(actor);
        }

        let rooms = self.room_order.clone();
        for room in rooms {
            hazards::room_tick(self, room);
        }

        topology::mutate_topology(self);

        self.turn += 1;
        log::info!("lap complete, now on lap {}", self.turn);
        self.notify(ObjectRef::Game, Change::LapCompleted { turn: self.turn });
    }

    /// Save the whole graph.
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_game(writer, self)
    }

    /// Load a saved graph. The random source is reseeded from `config`.
    pub fn load<R: std::io::Read>(reader: R, config: GameConfig) -> Result<Self, SaveError> {
        persistence::load_game(reader, config)
    }

    /// Multi-line dump of the whole graph.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Game state: {} (lap {})", self.status().as_str(), self.turn);

        let _ = writeln!(out, "Actors:");
        for actor in self.actors() {
            let _ = writeln!(
                out,
                "\t{} [{}] in {} stunned={} drunk={} killed={}",
                actor.name(),
                actor.kind().token(),
                actor.room(),
                actor.stunned_for(),
                actor.drunk_for(),
                actor.is_killed()
            );
            for item in actor.inventory() {
                if let Some(item) = self.item(*item) {
                    let _ = writeln!(out, "\t\t{}", describe_item(&item));
                }
            }
        }

        let _ = writeln!(out, "Rooms:");
        for room in self.rooms() {
            let h = room.hazards();
            let _ = writeln!(
                out,
                "\t{} capacity={} toxic={} wet={} sticky={} cursed={}",
                room.id(),
                room.capacity(),
                h.toxic,
                h.wet,
                h.sticky,
                h.cursed
            );
            for resident in room.residents() {
                let name = self
                    .actor(*resident)
                    .map_or_else(|| "?".to_string(), |a| a.name().to_string());
                let _ = writeln!(out, "\t\tresident {}", name);
            }
            for item in room.items() {
                if let Some(item) = self.item(*item) {
                    let _ = writeln!(out, "\t\titem {}", describe_item(&item));
                }
            }
            for door in room.doors() {
                if let Some(door) = self.door(*door) {
                    let (first, second) = door.endpoints();
                    let _ = writeln!(
                        out,
                        "\t\t{} {} -> {} closed={} one_way={}",
                        door.id(),
                        first,
                        second,
                        door.is_closed(),
                        door.is_one_way()
                    );
                }
            }
        }
        out
    }
}

/// Handles of one kind present in the world, sorted.
fn sorted_handles<H: Component + Copy + Ord>(world: &World) -> Vec<H> {
    let mut handles: Vec<H> = world.query::<&H>().iter().map(|(_, id)| *id).collect();
    handles.sort();
    handles
}

fn describe_item(item: &Item) -> String {
    let mut line = format!("{} charges={}", item, item.charges());
    if let Some(pair) = item.pair() {
        let _ = write!(line, " pair={}", pair);
    }
    if item.is_deployed() {
        line.push_str(" deployed");
    }
    line
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("turn", &self.turn)
            .field("won", &self.won)
            .field("rooms", &self.index.rooms.len())
            .field("doors", &self.index.doors.len())
            .field("actors", &self.index.actors.len())
            .field("items", &self.index.items.len())
            .finish()
    }
}
