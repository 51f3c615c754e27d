//! Movement system - door traversal, room admission and relocation

use hecs::Ref;

use crate::components::{ActorId, ActorKind, DoorId, Room, RoomId};
use crate::engine::Game;
use crate::events::{Change, ObjectRef};
use crate::systems::{encounters, hazards};

/// Move an actor through a door of its current room.
///
/// Refused if the actor is stunned or killed, the door is closed, the door
/// only opens the other way, or the destination refuses entry. A cleaning
/// lady cleans the room she arrives in.
pub fn move_actor(game: &mut Game, actor: ActorId, door: DoorId) -> bool {
    let moved = step_through(game, actor, door);
    if moved && game.actor(actor).map(|a| a.kind()) == Some(ActorKind::CleaningLady) {
        if let Some(room) = game.actor(actor).map(|a| a.room()) {
            hazards::clean_room(game, room, actor);
        }
    }
    moved
}

/// A move without the cleaning side effect.
///
/// Evictions and hazard escapes use this. A stunned or killed actor never
/// gets through, so an actor a hazard has just stunned stays put.
pub(crate) fn step_through(game: &mut Game, actor: ActorId, door: DoorId) -> bool {
    let Some((from, can_act)) = game.actor(actor).map(|a| (a.room(), a.can_act())) else {
        return false;
    };
    let moved = can_act && traverse(game, actor, from, door);
    if !moved {
        log::trace!("{} could not pass {}", actor, door);
        game.notify(ObjectRef::Actor(actor), Change::MoveRefused);
    }
    moved
}

/// Door-level traversal from `from`: the door must let the actor through and
/// the destination must admit it.
fn traverse(game: &mut Game, actor: ActorId, from: RoomId, door: DoorId) -> bool {
    let Some(dest) = game.door(door).and_then(|d| d.passage_from(from)) else {
        return false;
    };
    if !accept_entity(game, dest, actor) {
        return false;
    }
    relocate_actor(game, actor, dest);
    true
}

/// Decide whether `room` admits the arriving actor.
///
/// In order: a full room refuses; a toxic room refuses if its poisoning
/// lands; a wet room refuses if its immobilization lands. Otherwise every
/// resident meets the newcomer and the entry is accepted. The caller does
/// the actual relocation.
pub fn accept_entity(game: &mut Game, room: RoomId, actor: ActorId) -> bool {
    let Some((full, hazards)) = game.room(room).map(|r| (r.is_full(), r.hazards())) else {
        return false;
    };
    let accepted = if full {
        false
    } else if hazards.toxic && hazards::toxicate(game, actor, room) {
        false
    } else if hazards.wet && hazards::immobilize(game, actor) {
        false
    } else {
        let residents: Vec<ActorId> = game
            .room(room)
            .map(|r| r.residents().to_vec())
            .unwrap_or_default();
        for resident in residents {
            encounters::meet(game, resident, actor, room);
        }
        true
    };
    game.notify(ObjectRef::Room(room), Change::EntryChecked { actor, accepted });
    accepted
}

/// Move an actor's membership from its current room to `to`.
///
/// The only place residents lists and the actor's back-reference change.
/// Counts the arrival against the destination's sticky countdown.
pub(crate) fn relocate_actor(game: &mut Game, actor: ActorId, to: RoomId) {
    let Some(from) = game.actor(actor).map(|a| a.room()) else {
        return;
    };
    if let Some(r) = game.room_mut(from) {
        r.residents.retain(|a| *a != actor);
    }
    let turned_sticky = match game.room_mut(to) {
        Some(r) => {
            r.residents.push(actor);
            r.count_arrival()
        }
        None => false,
    };
    if let Some(a) = game.actor_mut(actor) {
        a.room = to;
    }

    log::debug!("{} moved {} -> {}", actor, from, to);
    game.notify(ObjectRef::Room(from), Change::ResidentsChanged);
    game.notify(ObjectRef::Room(to), Change::ResidentsChanged);
    if turned_sticky {
        game.notify(ObjectRef::Room(to), Change::HazardsChanged);
    }
    game.notify(ObjectRef::Actor(actor), Change::Moved { from, to });
}

/// Look through a door of the actor's room without moving.
///
/// Closed and one-way doors can still be looked through.
pub fn peek(game: &Game, actor: ActorId, door: DoorId) -> Option<Ref<'_, Room>> {
    let here = game.actor(actor)?.room();
    let there = game.door(door)?.neighbour(here)?;
    game.room(there)
}
