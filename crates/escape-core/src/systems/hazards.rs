//! Hazard system - toxic poisoning, wet immobilization, cleaning and the per-lap room tick

use crate::components::{ActorId, ActorKind, RoomId};
use crate::engine::Game;
use crate::events::{Change, ObjectRef};
use crate::systems::{inventory, items, movement};

/// Poison an actor standing in (or entering) a toxic room.
///
/// Cleaning ladies are immune. A student is spared by the first held item
/// whose toxic protection succeeds. Otherwise the actor is stunned and
/// drops its whole inventory into `room`. Returns true if the poison landed.
pub fn toxicate(game: &mut Game, actor: ActorId, room: RoomId) -> bool {
    let Some(kind) = game.actor(actor).map(|a| a.kind()) else {
        return false;
    };
    match kind {
        ActorKind::CleaningLady => false,
        ActorKind::Student if items::shielded_from_toxic(game, actor) => false,
        ActorKind::Student | ActorKind::Professor => {
            stun(game, actor);
            inventory::dump_inventory(game, actor, room);
            log::debug!("{} was poisoned in {}", actor, room);
            true
        }
    }
}

/// Immobilize an actor in a wet room. Only professors are affected.
pub fn immobilize(game: &mut Game, actor: ActorId) -> bool {
    match game.actor(actor).map(|a| a.kind()) {
        Some(ActorKind::Professor) => {
            stun(game, actor);
            log::debug!("{} slipped and is stunned", actor);
            true
        }
        _ => false,
    }
}

fn stun(game: &mut Game, actor: ActorId) {
    let ticks = game.config.hazard_stun_ticks;
    if let Some(a) = game.actor_mut(actor) {
        a.stun(ticks);
    }
    game.notify(ObjectRef::Actor(actor), Change::StatusChanged);
}

/// A cleaning lady cleans `room`.
///
/// Clears toxicity, sends every other resident out through the first door
/// that will take it, then arms the sticky countdown. Residents that cannot
/// leave stay behind. An evicted cleaning lady does not clean the room she
/// is pushed into; only her own moves trigger cleaning.
pub fn clean_room(game: &mut Game, room: RoomId, cleaner: ActorId) {
    let Some(r) = game.room_mut(room) else {
        return;
    };
    r.hazards.toxic = false;
    let others: Vec<ActorId> = r.residents.iter().copied().filter(|a| *a != cleaner).collect();
    let doors = r.doors.clone();
    game.notify(ObjectRef::Room(room), Change::HazardsChanged);

    for other in others {
        for door in &doors {
            if movement::step_through(game, other, *door) {
                break;
            }
        }
    }

    let arrivals = game.config.sticky_arming_arrivals;
    if let Some(r) = game.room_mut(room) {
        r.arm_sticky(arrivals);
    }
    log::debug!("{} cleaned {}", cleaner, room);
}

/// Per-lap hazard effects of one room.
///
/// Toxic: every resident is poisoned, and anyone it lands on tries to leave
/// through the first door that admits them. Wet: every resident is
/// immobilized, with the same escape attempt. Cursed: every incident door
/// flips open/closed.
///
/// The escape is an ordinary move, so it is refused while the actor is
/// stunned. A hazard that lands always stuns, which keeps its victim inside.
pub fn room_tick(game: &mut Game, room: RoomId) {
    let Some(hazards) = game.room(room).map(|r| r.hazards()) else {
        return;
    };

    if hazards.toxic {
        for actor in living_residents(game, room) {
            if toxicate(game, actor, room) {
                evacuate(game, actor, room);
            }
        }
    }

    if hazards.wet {
        for actor in living_residents(game, room) {
            if immobilize(game, actor) {
                evacuate(game, actor, room);
            }
        }
    }

    if hazards.cursed {
        let doors = game.room(room).map(|r| r.doors.clone()).unwrap_or_default();
        for door in doors {
            let Some(d) = game.door_mut(door) else {
                continue;
            };
            d.toggle();
            let closed = d.is_closed();
            game.notify(ObjectRef::Door(door), Change::DoorToggled { closed });
        }
    }
}

/// Residents still in play. The dead stay in their room but are ignored.
fn living_residents(game: &Game, room: RoomId) -> Vec<ActorId> {
    game.room(room)
        .map(|r| {
            r.residents()
                .iter()
                .copied()
                .filter(|a| game.actor(*a).map_or(false, |a| !a.is_killed()))
                .collect()
        })
        .unwrap_or_default()
}

fn evacuate(game: &mut Game, actor: ActorId, room: RoomId) {
    if game.actor(actor).map(|a| a.room()) != Some(room) {
        return;
    }
    let doors = game.room(room).map(|r| r.doors.clone()).unwrap_or_default();
    for door in doors {
        if movement::step_through(game, actor, door) {
            log::debug!("{} fled {} through {}", actor, room, door);
            return;
        }
    }
}
