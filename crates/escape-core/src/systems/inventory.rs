//! Inventory system - item ownership, pickup, drop and linking

use crate::components::{ActorId, ItemId, Owner, RoomId};
use crate::engine::Game;
use crate::events::{Change, ObjectRef};
use crate::systems::items;

/// Transfer an item to a new owner.
///
/// The only place item ownership changes: removes the item from its
/// current container, appends it to the new one and updates `owner`.
pub(crate) fn place_item(game: &mut Game, item: ItemId, to: Owner) {
    let Some(from) = game.item(item).map(|i| i.owner()) else {
        return;
    };
    match from {
        Owner::Room(room) => {
            if let Some(r) = game.room_mut(room) {
                r.items.retain(|i| *i != item);
            }
        }
        Owner::Actor(actor) => {
            if let Some(a) = game.actor_mut(actor) {
                a.inventory.retain(|i| *i != item);
            }
        }
    }
    match to {
        Owner::Room(room) => {
            if let Some(r) = game.room_mut(room) {
                r.items.push(item);
            }
        }
        Owner::Actor(actor) => {
            if let Some(a) = game.actor_mut(actor) {
                a.inventory.push(item);
            }
        }
    }
    if let Some(i) = game.item_mut(item) {
        i.owner = to;
    }
    notify_container(game, from);
    notify_container(game, to);
}

fn notify_container(game: &mut Game, owner: Owner) {
    match owner {
        Owner::Room(room) => game.notify(ObjectRef::Room(room), Change::ItemsChanged),
        Owner::Actor(actor) => game.notify(ObjectRef::Actor(actor), Change::InventoryChanged),
    }
}

/// Drop everything an actor holds into `room`, in inventory order.
pub fn dump_inventory(game: &mut Game, actor: ActorId, room: RoomId) {
    let held = game
        .actor(actor)
        .map(|a| a.inventory().to_vec())
        .unwrap_or_default();
    for item in held {
        place_item(game, item, Owner::Room(room));
    }
}

/// An actor picks up an item lying in its current room.
///
/// Refused while stunned or killed, and once the inventory already holds
/// more than the configured capacity. The room then decides: a sticky room
/// keeps its items, and the item's pickup hook may refuse.
pub fn pick_up(game: &mut Game, actor: ActorId, item: ItemId) -> bool {
    let capacity = game.config.inventory_capacity;
    let Some((room, ready)) = game
        .actor(actor)
        .map(|a| (a.room(), a.can_act() && a.inventory().len() <= capacity))
    else {
        return false;
    };
    ready && take_from_room(game, room, actor, item)
}

/// Hand an item from `room` over to `actor`, if the room and the item allow it.
pub fn take_from_room(game: &mut Game, room: RoomId, actor: ActorId, item: ItemId) -> bool {
    let available = game
        .room(room)
        .map_or(false, |r| !r.hazards().sticky && r.has_item(item));
    if !available || !items::admits_pickup(game, item, actor) {
        return false;
    }
    place_item(game, item, Owner::Actor(actor));
    log::debug!("{} picked up {}", actor, item);
    true
}

/// An actor drops a held item into its current room.
pub fn drop_item(game: &mut Game, actor: ActorId, item: ItemId) -> bool {
    let Some(room) = game
        .actor(actor)
        .filter(|a| a.can_act() && a.holds(item))
        .map(|a| a.room())
    else {
        return false;
    };
    place_item(game, item, Owner::Room(room));
    log::debug!("{} dropped {}", actor, item);
    true
}

/// Pickup hook of the real winning item: only a student can claim it.
pub fn try_claim_win(game: &mut Game, actor: ActorId) -> bool {
    if !game.actor(actor).map_or(false, |a| a.is_student()) {
        return false;
    }
    game.set_won();
    true
}

/// A student pairs two held items. Only two teleport devices can be paired.
pub fn link_items(game: &mut Game, actor: ActorId, first: ItemId, second: ItemId) -> bool {
    let allowed = first != second
        && game.actor(actor).map_or(false, |a| {
            a.is_student() && a.can_act() && a.holds(first) && a.holds(second)
        });
    allowed && items::link(game, first, second)
}
