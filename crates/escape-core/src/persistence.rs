//! Save/Load functionality for persisting a game
//!
//! Uses bincode for the whole world. Each entity is written as a set of
//! optional components, then respawned on load. Cross references are
//! handles, so loading is a matter of rebuilding the handle index and
//! checking that the references still line up. A save that fails those
//! checks is rejected as a whole.

use hecs::{Component, Entity, World};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::io::{Read, Write};
use thiserror::Error;

use crate::components::*;
use crate::config::GameConfig;
use crate::engine::{Game, HandleIndex};

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 2;

/// Serializable snapshot of a game
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub turn: u32,
    pub won: bool,
    /// Handle high-water marks at save time
    pub ids: IdAllocator,
    /// Room collection order
    pub room_order: Vec<RoomId>,
    pub turn_order: Vec<ActorId>,
    /// All entities with their components
    pub entities: Vec<SerializableEntity>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    // Campus graph
    pub room_id: Option<RoomId>,
    pub room: Option<Room>,
    pub door_id: Option<DoorId>,
    pub door: Option<Door>,

    // Occupants
    pub actor_id: Option<ActorId>,
    pub actor: Option<Actor>,
    pub item_id: Option<ItemId>,
    pub item: Option<Item>,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Corrupt save: {0}")]
    Corrupt(String),
}

impl SaveData {
    pub fn capture(game: &Game) -> Self {
        Self {
            version: SAVE_VERSION,
            turn: game.turn,
            won: game.won,
            ids: game.ids,
            room_order: game.room_order.clone(),
            turn_order: game.turn_order.clone(),
            entities: serialize_entities(&game.world),
        }
    }

    /// Rebuild a game after checking every cross reference.
    pub fn restore(self, config: GameConfig) -> Result<Game, SaveError> {
        if self.version != SAVE_VERSION {
            return Err(SaveError::VersionMismatch {
                expected: SAVE_VERSION,
                found: self.version,
            });
        }

        let mut world = World::new();
        deserialize_entities(&mut world, self.entities);
        let index = HandleIndex {
            rooms: index_kind(&world, "room", |r: &Room| r.id)?,
            doors: index_kind(&world, "door", |d: &Door| d.id)?,
            actors: index_kind(&world, "actor", |a: &Actor| a.id)?,
            items: index_kind(&world, "item", |i: &Item| i.id)?,
        };

        let mut ids = self.ids;
        index.rooms.keys().for_each(|id| ids.observe_room(*id));
        index.doors.keys().for_each(|id| ids.observe_door(*id));
        index.actors.keys().for_each(|id| ids.observe_actor(*id));
        index.items.keys().for_each(|id| ids.observe_item(*id));

        let mut game = Game::new(config);
        game.world = world;
        game.index = index;
        game.room_order = self.room_order;
        game.turn_order = self.turn_order;
        game.turn = self.turn;
        game.won = self.won;
        game.ids.restore(ids);

        check_order(&game.room_order, &game.index.rooms, "room collection")?;
        check_order(&game.turn_order, &game.index.actors, "turn order")?;
        check_doors(&game)?;
        check_residents(&game)?;
        check_items(&game)?;
        Ok(game)
    }
}

/// Extract all entities from a world into serializable form
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let mut entities = Vec::new();

    for entity in world.iter() {
        let mut se = SerializableEntity::default();

        if let Some(c) = entity.get::<&RoomId>() {
            se.room_id = Some(*c);
        }
        if let Some(c) = entity.get::<&Room>() {
            se.room = Some((*c).clone());
        }
        if let Some(c) = entity.get::<&DoorId>() {
            se.door_id = Some(*c);
        }
        if let Some(c) = entity.get::<&Door>() {
            se.door = Some((*c).clone());
        }
        if let Some(c) = entity.get::<&ActorId>() {
            se.actor_id = Some(*c);
        }
        if let Some(c) = entity.get::<&Actor>() {
            se.actor = Some((*c).clone());
        }
        if let Some(c) = entity.get::<&ItemId>() {
            se.item_id = Some(*c);
        }
        if let Some(c) = entity.get::<&Item>() {
            se.item = Some((*c).clone());
        }

        entities.push(se);
    }

    entities
}

/// Rebuild a world from serialized entities
fn deserialize_entities(world: &mut World, entities: Vec<SerializableEntity>) {
    for se in entities {
        spawn_entity(world, se);
    }
}

/// Spawn an entity with all its components
fn spawn_entity(world: &mut World, se: SerializableEntity) {
    let entity = world.spawn(());

    if let Some(c) = se.room_id {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.room {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.door_id {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.door {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.actor_id {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.actor {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.item_id {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.item {
        let _ = world.insert_one(entity, c);
    }
}

fn corrupt(message: String) -> SaveError {
    SaveError::Corrupt(message)
}

/// Map every handle of one kind to its entity.
///
/// Each entity must carry both the handle and the matching data component,
/// and no handle may appear twice.
fn index_kind<H, T>(
    world: &World,
    what: &str,
    id_of: impl Fn(&T) -> H,
) -> Result<HashMap<H, Entity>, SaveError>
where
    H: Component + Copy + Eq + Hash + Display,
    T: Component,
{
    let mut map = HashMap::new();
    for (entity, (id, data)) in world.query::<(&H, &T)>().iter() {
        if id_of(data) != *id {
            return Err(corrupt(format!("{} entity tagged {} holds other data", what, id)));
        }
        if map.insert(*id, entity).is_some() {
            return Err(corrupt(format!("duplicate {} {}", what, id)));
        }
    }
    let tagged = world.query::<&H>().iter().count();
    let bodies = world.query::<&T>().iter().count();
    if tagged != map.len() || bodies != map.len() {
        return Err(corrupt(format!("a {} entity lacks its handle or data", what)));
    }
    Ok(map)
}

/// An ordering must name every indexed handle exactly once.
fn check_order<H: Copy + Eq + Hash + Display>(
    order: &[H],
    index: &HashMap<H, Entity>,
    what: &str,
) -> Result<(), SaveError> {
    let unique: HashSet<_> = order.iter().collect();
    if unique.len() != order.len() || order.len() != index.len() {
        return Err(corrupt(format!("{} does not match the saved entities", what)));
    }
    if let Some(missing) = order.iter().find(|id| !index.contains_key(*id)) {
        return Err(corrupt(format!("{} names unknown {}", what, missing)));
    }
    Ok(())
}

fn check_doors(game: &Game) -> Result<(), SaveError> {
    for (_, door) in game.world.query::<&Door>().iter() {
        if door.is_self_loop() {
            return Err(corrupt(format!("{} connects a room to itself", door.id)));
        }
        let (first, second) = door.endpoints();
        for end in [first, second] {
            let listed = game.room(end).map_or(false, |r| r.has_door(door.id));
            if !listed {
                return Err(corrupt(format!("{} is not listed by {}", door.id, end)));
            }
        }
    }
    for (_, room) in game.world.query::<&Room>().iter() {
        for door in room.doors() {
            let incident = game
                .door(*door)
                .map_or(false, |d| d.neighbour(room.id).is_some());
            if !incident {
                return Err(corrupt(format!("{} lists foreign {}", room.id, door)));
            }
        }
    }
    Ok(())
}

fn check_residents(game: &Game) -> Result<(), SaveError> {
    let mut seen = HashSet::new();
    for (_, room) in game.world.query::<&Room>().iter() {
        for resident in room.residents() {
            if !seen.insert(*resident) {
                return Err(corrupt(format!("{} is resident twice", resident)));
            }
            if game.actor(*resident).map(|a| a.room()) != Some(room.id) {
                return Err(corrupt(format!("{} is not in {}", resident, room.id)));
            }
        }
    }
    if let Some(homeless) = game.index.actors.keys().find(|id| !seen.contains(*id)) {
        return Err(corrupt(format!("{} has no room", homeless)));
    }
    Ok(())
}

fn check_items(game: &Game) -> Result<(), SaveError> {
    let mut containers: Vec<(Owner, Vec<ItemId>)> = Vec::new();
    for (_, room) in game.world.query::<&Room>().iter() {
        containers.push((Owner::Room(room.id), room.items.clone()));
    }
    for (_, actor) in game.world.query::<&Actor>().iter() {
        containers.push((Owner::Actor(actor.id), actor.inventory.clone()));
    }

    let mut seen = HashSet::new();
    for (owner, held) in containers {
        for item in held {
            if !seen.insert(item) {
                return Err(corrupt(format!("{} has two owners", item)));
            }
            if game.item(item).map(|i| i.owner()) != Some(owner) {
                return Err(corrupt(format!("{} is listed by the wrong owner", item)));
            }
        }
    }
    for (_, item) in game.world.query::<&Item>().iter() {
        if !seen.contains(&item.id) {
            return Err(corrupt(format!("{} has no owner", item.id)));
        }
        if item.deployed && !matches!(item.owner, Owner::Room(_)) {
            return Err(corrupt(format!("{} is deployed but held", item.id)));
        }
        if let Some(pair) = item.pair {
            let mutual = game.item(pair).map_or(false, |p| p.pair == Some(item.id));
            if !mutual || item.kind != ItemKind::Teleport {
                return Err(corrupt(format!("{} has a broken pairing", item.id)));
            }
        }
    }
    Ok(())
}

/// Save the complete game to a writer
pub fn save_game<W: Write>(writer: W, game: &Game) -> Result<(), SaveError> {
    bincode::serialize_into(writer, &SaveData::capture(game))?;
    log::info!("saved game on lap {}", game.turn);
    Ok(())
}

/// Load a game from a reader
pub fn load_game<R: Read>(reader: R, config: GameConfig) -> Result<Game, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;
    let game = save_data.restore(config)?;
    log::info!("loaded game on lap {} with {} rooms", game.turn, game.room_count());
    Ok(game)
}

/// Load a game, or fall back to a fresh empty one if the save is unusable.
pub fn load_or_fresh<R: Read>(reader: R, config: GameConfig) -> Game {
    match load_game(reader, config.clone()) {
        Ok(game) => game,
        Err(e) => {
            log::warn!("could not load save, starting an empty game: {}", e);
            Game::new(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Game {
        let mut game = Game::new(GameConfig {
            seed: Some(29),
            ..GameConfig::static_topology()
        });
        let a = game.spawn_room(3, Hazards::none().with(Hazard::Wet));
        let b = game.spawn_room(2, Hazards::none());
        game.spawn_door(a, b, true).unwrap();
        let s = game.spawn_actor("anna", ActorKind::Student, a).unwrap();
        game.spawn_actor("", ActorKind::Professor, b).unwrap();
        game.spawn_item(ItemKind::Respirator, true, Owner::Actor(s)).unwrap();
        game.spawn_item(ItemKind::WinningItem, false, Owner::Room(b)).unwrap();
        game
    }

    #[test]
    fn test_save_load_roundtrip() {
        let game = sample();
        let mut buffer = Vec::new();
        save_game(&mut buffer, &game).expect("Save failed");

        let loaded = load_game(&buffer[..], GameConfig::default()).expect("Load failed");

        assert_eq!(loaded.turn(), game.turn());
        assert_eq!(loaded.describe(), game.describe());
        assert_eq!(loaded.id_marks(), game.id_marks());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut data = SaveData::capture(&sample());
        data.version = 99;
        assert!(matches!(
            data.restore(GameConfig::default()),
            Err(SaveError::VersionMismatch { found: 99, .. })
        ));
    }

    #[test]
    fn test_broken_containment_rejected() {
        let mut data = SaveData::capture(&sample());
        let room = data.entities.iter_mut().find_map(|e| e.room.as_mut()).unwrap();
        room.residents.clear();
        assert!(matches!(
            data.restore(GameConfig::default()),
            Err(SaveError::Corrupt(_))
        ));

        let mut data = SaveData::capture(&sample());
        let mask = data
            .entities
            .iter_mut()
            .find_map(|e| e.item.as_mut().filter(|i| i.kind == ItemKind::Respirator))
            .unwrap();
        mask.owner = Owner::Room(RoomId(2));
        assert!(matches!(
            data.restore(GameConfig::default()),
            Err(SaveError::Corrupt(_))
        ));
    }

    #[test]
    fn test_mismatched_handle_rejected() {
        let mut data = SaveData::capture(&sample());
        let tagged = data.entities.iter_mut().find(|e| e.room_id.is_some()).unwrap();
        tagged.room_id = Some(RoomId(9));
        assert!(matches!(
            data.restore(GameConfig::default()),
            Err(SaveError::Corrupt(_))
        ));
    }

    #[test]
    fn test_one_entity_per_object() {
        let data = SaveData::capture(&sample());
        // 2 rooms, 1 door, 2 actors, 2 items
        assert_eq!(data.entities.len(), 7);
        let game = data.restore(GameConfig::default()).unwrap();
        assert_eq!(game.world().len(), 7);
    }

    #[test]
    fn test_garbage_falls_back_to_empty_game() {
        let game = load_or_fresh(&b"not a save"[..], GameConfig::default());
        assert_eq!(game.room_count(), 0);
        assert_eq!(game.turn(), 1);
    }

    #[test]
    fn test_stale_allocator_marks_are_raised() {
        let mut data = SaveData::capture(&sample());
        data.ids = IdAllocator::new();
        let mut game = data.restore(GameConfig::default()).unwrap();
        let room = game.spawn_room(1, Hazards::none());
        assert_eq!(room, RoomId(3));
    }
}
