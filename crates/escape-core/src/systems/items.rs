//! Item behaviour - activation effects, pickup hooks, protections and teleport pairing

use crate::components::{ActorId, Hazard, Item, ItemId, ItemKind, Owner, RoomId};
use crate::engine::Game;
use crate::events::{Change, ObjectRef};
use crate::systems::{inventory, movement};

/// A student activates a held item. Returns true if it had an effect.
///
/// Items with charges spend one per use and do nothing once empty.
/// Passive items (protections, the winning item) do nothing when activated.
pub fn activate_item(game: &mut Game, actor: ActorId, item: ItemId) -> bool {
    let Some(room) = game
        .actor(actor)
        .filter(|a| a.is_student() && a.can_act() && a.holds(item))
        .map(|a| a.room())
    else {
        return false;
    };
    let Some(kind) = game.item(item).map(|i| i.kind()) else {
        return false;
    };

    let used = match kind {
        ItemKind::AirFreshener => spend(game, item) && set_hazard(game, room, Hazard::Toxic, false),
        ItemKind::MoldCheese => spend(game, item) && set_hazard(game, room, Hazard::Toxic, true),
        ItemKind::WetSponge => spend(game, item) && set_hazard(game, room, Hazard::Wet, true),
        ItemKind::Beer => spend(game, item) && drink(game, actor, item),
        ItemKind::Teleport => activate_teleport(game, actor, item),
        ItemKind::Respirator | ItemKind::ConductPass | ItemKind::WinningItem => false,
    };
    if used {
        log::debug!("{} used {}", actor, item);
    }
    used
}

fn spend(game: &mut Game, item: ItemId) -> bool {
    let spent = game.item_mut(item).map_or(false, Item::spend_charge);
    if spent {
        game.notify(ObjectRef::Item(item), Change::ItemStateChanged);
    }
    spent
}

fn set_hazard(game: &mut Game, room: RoomId, hazard: Hazard, value: bool) -> bool {
    if let Some(r) = game.room_mut(room) {
        r.hazards.set(hazard, value);
    }
    game.notify(ObjectRef::Room(room), Change::HazardsChanged);
    true
}

/// Beer: the student gets drunk and drops the first held item that is not a beer.
fn drink(game: &mut Game, actor: ActorId, beer: ItemId) -> bool {
    let ticks = game.config.drunk_ticks;
    if let Some(a) = game.actor_mut(actor) {
        a.make_drunk(ticks);
    }
    game.notify(ObjectRef::Actor(actor), Change::StatusChanged);

    let victim = game.actor(actor).and_then(|a| {
        a.inventory()
            .iter()
            .copied()
            .filter(|i| *i != beer)
            .find(|i| game.item(*i).map_or(false, |it| it.kind() != ItemKind::Beer))
    });
    if let Some(victim) = victim {
        inventory::drop_item(game, actor, victim);
    }
    true
}

/// Teleport activation.
///
/// If the partner device is not deployed, this device is dropped in the
/// current room and deployed as a destination. If the partner is deployed,
/// the student travels to the partner's room through normal admission; on
/// success this device stays behind in the origin room and the pairing is
/// dissolved. On refusal nothing changes.
fn activate_teleport(game: &mut Game, actor: ActorId, device: ItemId) -> bool {
    let Some(partner) = game.item(device).and_then(|i| i.pair()) else {
        return false;
    };
    let Some(origin) = game.actor(actor).map(|a| a.room()) else {
        return false;
    };
    let Some((partner_deployed, partner_owner)) =
        game.item(partner).map(|p| (p.is_deployed(), p.owner()))
    else {
        return false;
    };

    if !partner_deployed {
        inventory::place_item(game, device, Owner::Room(origin));
        if let Some(d) = game.item_mut(device) {
            d.deployed = true;
        }
        game.notify(ObjectRef::Item(device), Change::ItemStateChanged);
        log::debug!("{} deployed {} in {}", actor, device, origin);
        return true;
    }

    // A deployed device always lies in a room; that room is the destination.
    let Owner::Room(anchor) = partner_owner else {
        return false;
    };
    if !movement::accept_entity(game, anchor, actor) {
        return false;
    }
    inventory::place_item(game, device, Owner::Room(origin));
    movement::relocate_actor(game, actor, anchor);
    unpair(game, device);
    log::debug!("{} teleported {} -> {}", actor, origin, anchor);
    true
}

/// Pickup hook. Decides whether `actor` may take `item` from a room.
pub fn admits_pickup(game: &mut Game, item: ItemId, actor: ActorId) -> bool {
    let Some((kind, decoy, deployed)) = game
        .item(item)
        .map(|i| (i.kind(), i.is_decoy(), i.is_deployed()))
    else {
        return false;
    };
    match kind {
        ItemKind::WinningItem if !decoy => inventory::try_claim_win(game, actor),
        ItemKind::Teleport => !deployed,
        _ => true,
    }
}

/// Pair two teleport devices. Stale partners are released first.
pub fn link(game: &mut Game, first: ItemId, second: ItemId) -> bool {
    let is_teleport = |id: ItemId| game.item(id).map_or(false, |i| i.kind() == ItemKind::Teleport);
    if first == second || !is_teleport(first) || !is_teleport(second) {
        return false;
    }
    unpair(game, first);
    unpair(game, second);
    for (this, other) in [(first, second), (second, first)] {
        if let Some(i) = game.item_mut(this) {
            i.pair = Some(other);
        }
        game.notify(ObjectRef::Item(this), Change::ItemStateChanged);
    }
    true
}

/// Dissolve a device's pairing on both sides and un-deploy both.
fn unpair(game: &mut Game, device: ItemId) {
    let Some(partner) = game.item(device).and_then(|i| i.pair()) else {
        return;
    };
    for id in [device, partner] {
        if let Some(i) = game.item_mut(id) {
            i.pair = None;
            i.deployed = false;
        }
        game.notify(ObjectRef::Item(id), Change::ItemStateChanged);
    }
}

/// First held item whose toxic protection succeeds, spending its charge.
pub fn shielded_from_toxic(game: &mut Game, actor: ActorId) -> bool {
    first_protection(game, actor, Item::protect_against_toxic)
}

/// First held item whose professor protection succeeds, spending its charge.
pub fn shielded_from_professor(game: &mut Game, actor: ActorId) -> bool {
    first_protection(game, actor, Item::protect_against_professor)
}

fn first_protection(game: &mut Game, actor: ActorId, hook: fn(&mut Item) -> bool) -> bool {
    let held = game
        .actor(actor)
        .map(|a| a.inventory().to_vec())
        .unwrap_or_default();
    for item in held {
        if game.item_mut(item).map_or(false, hook) {
            game.notify(ObjectRef::Item(item), Change::ItemStateChanged);
            return true;
        }
    }
    false
}
