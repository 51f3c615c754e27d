//! Topology system - merging and splitting rooms between laps

use rand::Rng;

use crate::components::{Hazards, Owner, Room, RoomId};
use crate::engine::Game;
use crate::events::{Change, ObjectRef};

/// Merge `absorbed` into `survivor`.
///
/// Both rooms must exist, be distinct and be empty of actors. The survivor
/// inherits the absorbed room's hazards (see [`Hazards::inherited_from`]),
/// items and doors, and keeps the larger capacity. Doors that would connect
/// the survivor to itself are discarded. The absorbed room leaves the game.
pub fn merge_rooms(game: &mut Game, survivor: RoomId, absorbed: RoomId) -> bool {
    if survivor == absorbed {
        return false;
    }
    let occupied = |id: RoomId| game.room(id).map_or(true, |r| !r.residents().is_empty());
    if occupied(survivor) || occupied(absorbed) {
        return false;
    }
    let Some(donor) = game.remove_room(absorbed) else {
        return false;
    };

    for item in &donor.items {
        if let Some(i) = game.item_mut(*item) {
            i.owner = Owner::Room(survivor);
        }
    }

    let mut kept_doors = Vec::new();
    let mut dropped_doors = Vec::new();
    for door in &donor.doors {
        let Some(d) = game.door_mut(*door) else {
            continue;
        };
        d.swap_endpoint(absorbed, survivor);
        if d.is_self_loop() {
            dropped_doors.push(*door);
        } else {
            kept_doors.push(*door);
        }
    }
    for door in &dropped_doors {
        game.remove_door(*door);
    }

    if let Some(r) = game.room_mut(survivor) {
        r.hazards.absorb(Hazards::inherited_from(&donor.hazards));
        r.items.extend(donor.items.iter().copied());
        r.doors.retain(|d| !dropped_doors.contains(d));
        r.doors.extend(kept_doors.iter().copied());
        r.capacity = r.capacity.max(donor.capacity);
    }

    log::info!("{} merged into {}", absorbed, survivor);
    for door in kept_doors {
        game.notify(ObjectRef::Door(door), Change::DoorRewired);
    }
    game.notify(ObjectRef::Room(survivor), Change::HazardsChanged);
    game.notify(ObjectRef::Room(survivor), Change::ItemsChanged);
    game.notify(ObjectRef::Room(survivor), Change::DoorsChanged);
    game.notify(ObjectRef::Game, Change::RoomsMerged { survivor, absorbed });
    true
}

/// Split an empty room in two.
///
/// The new room has the same capacity, inherited hazards, and takes the
/// first half (rounded down) of the source's items and doors; the moved
/// doors are rewired to it. Returns the new room.
pub fn split_room(game: &mut Game, source: RoomId) -> Option<RoomId> {
    let empty = game.room(source).map(|r| r.residents().is_empty())?;
    if !empty {
        return None;
    }
    let created = game.ids.next_room();
    let r = game.room_mut(source)?;
    let half_items = r.items.len() / 2;
    let half_doors = r.doors.len() / 2;
    let items: Vec<_> = r.items.drain(..half_items).collect();
    let doors: Vec<_> = r.doors.drain(..half_doors).collect();
    let mut room = Room::new(created, r.capacity).with_hazards(Hazards::inherited_from(&r.hazards));

    for item in &items {
        if let Some(i) = game.item_mut(*item) {
            i.owner = Owner::Room(created);
        }
    }
    for door in &doors {
        if let Some(d) = game.door_mut(*door) {
            d.swap_endpoint(source, created);
        }
    }
    room.items = items;
    room.doors = doors.clone();
    game.insert_room(room);

    log::info!("{} split off {}", source, created);
    for door in doors {
        game.notify(ObjectRef::Door(door), Change::DoorRewired);
    }
    game.notify(ObjectRef::Room(source), Change::ItemsChanged);
    game.notify(ObjectRef::Room(source), Change::DoorsChanged);
    game.notify(ObjectRef::Game, Change::RoomSplit { source, created });
    Some(created)
}

/// The between-lap mutation: with the configured chance, merge a room from
/// the first half of the collection with one from the second half, then
/// split a random room. Occupied rooms refuse and are left as they are.
pub fn mutate_topology(game: &mut Game) {
    let chance = game.config.mutation_chance;
    if chance <= 0.0 || !game.rng.gen_bool(chance.min(1.0)) {
        return;
    }

    let rooms = game.room_order.clone();
    let n = rooms.len();
    if n >= 2 {
        let first = rooms[game.rng.gen_range(0..n / 2)];
        let second = rooms[game.rng.gen_range(n / 2..n)];
        merge_rooms(game, first, second);
    }

    let rooms = game.room_order.clone();
    if !rooms.is_empty() {
        let pick = rooms[game.rng.gen_range(0..rooms.len())];
        split_room(game, pick);
    }
}
