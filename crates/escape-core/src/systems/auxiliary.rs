//! Auxiliary actor policies - professors and cleaning ladies act on their own

use rand::seq::SliceRandom;

use crate::components::{ActorId, ActorKind};
use crate::engine::Game;
use crate::systems::{inventory, movement};

/// Let an auxiliary actor take its turn. Students and the dead are skipped.
pub fn auxiliary_turn(game: &mut Game, actor: ActorId) {
    let Some(kind) = game
        .actor(actor)
        .filter(|a| !a.is_killed())
        .map(|a| a.kind())
    else {
        return;
    };
    match kind {
        ActorKind::Professor => professor_turn(game, actor),
        ActorKind::CleaningLady => cleaning_lady_turn(game, actor),
        ActorKind::Student => {}
    }
}

/// Try a random door of the current room, then try to pick up a random
/// item from wherever the professor ends up.
pub fn professor_turn(game: &mut Game, actor: ActorId) {
    wander(game, actor);

    let Some(room) = game.actor(actor).map(|a| a.room()) else {
        return;
    };
    let items = game.room(room).map(|r| r.items().to_vec()).unwrap_or_default();
    if let Some(item) = items.choose(&mut game.rng).copied() {
        inventory::pick_up(game, actor, item);
    }
}

/// Try a random door of the current room. Cleaning happens on arrival.
pub fn cleaning_lady_turn(game: &mut Game, actor: ActorId) {
    wander(game, actor);
}

/// Pick a random incident door, open or not, and try to go through it.
fn wander(game: &mut Game, actor: ActorId) -> bool {
    let Some(room) = game.actor(actor).map(|a| a.room()) else {
        return false;
    };
    let doors = game.room(room).map(|r| r.doors().to_vec()).unwrap_or_default();
    match doors.choose(&mut game.rng).copied() {
        Some(door) => movement::move_actor(game, actor, door),
        None => false,
    }
}
