//! End-to-end game scenarios driven through the public API.

use escape_core::generation::{demo_layout, WorldBuilder};
use escape_core::prelude::*;
use escape_core::systems::{inventory, movement, topology};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn quiet_config() -> GameConfig {
    GameConfig {
        seed: Some(42),
        ..GameConfig::static_topology()
    }
}

/// Containment must be exact in both directions after every call.
fn assert_containment(game: &Game) {
    for item in game.items() {
        let in_rooms = game.rooms().filter(|r| r.has_item(item.id())).count();
        let in_inventories = game.actors().filter(|a| a.holds(item.id())).count();
        assert_eq!(in_rooms + in_inventories, 1, "{} has {} owners", item.id(), in_rooms + in_inventories);
        match item.owner() {
            Owner::Room(room) => assert!(game.room(room).unwrap().has_item(item.id())),
            Owner::Actor(actor) => assert!(game.actor(actor).unwrap().holds(item.id())),
        }
    }
    for actor in game.actors() {
        let homes: Vec<_> = game
            .rooms()
            .filter(|r| r.has_resident(actor.id()))
            .map(|r| r.id())
            .collect();
        assert_eq!(homes, vec![actor.room()], "{} lives in {:?}", actor.name(), homes);
    }
    for door in game.doors() {
        let (first, second) = door.endpoints();
        assert_ne!(first, second);
        assert!(game.room(first).unwrap().has_door(door.id()));
        assert!(game.room(second).unwrap().has_door(door.id()));
    }
}

#[test]
fn test_picking_up_the_winning_item_wins() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("vault", 2, &[]).unwrap();
    builder.add_student("anna", "vault").unwrap();
    let goal = builder.add_item("WinningItem", "vault").unwrap();
    let mut controller = Controller::new(builder.finish());

    assert!(controller.pick_up(goal));
    assert!(controller.game().game_ended());
    assert_eq!(controller.game().status(), GameStatus::Won);
    assert_eq!(controller.end_turn(), TurnState::Terminal(Outcome::Won));
}

#[test]
fn test_decoy_winning_item_is_just_an_item() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("vault", 2, &[]).unwrap();
    builder.add_student("anna", "vault").unwrap();
    let decoy = builder.add_item("FakeWinningItem", "vault").unwrap();
    let mut controller = Controller::new(builder.finish());

    assert!(controller.pick_up(decoy));
    assert!(!controller.game().game_ended());
    assert_eq!(controller.game().status(), GameStatus::Ongoing);
}

#[test]
fn test_professor_entering_kills_unprotected_student() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("hall", 3, &[]).unwrap();
    builder.add_room("office", 3, &[]).unwrap();
    let door = builder.add_door("office", "hall", false).unwrap();
    let anna = builder.add_student("anna", "hall").unwrap();
    let beer = builder.add_item("Beer", "anna").unwrap();
    let prof = builder.add_auxiliary("Professor", "office").unwrap();
    let mut game = builder.finish();
    let hall = game.actor(anna).unwrap().room();

    assert!(movement::move_actor(&mut game, prof, door));

    assert!(game.actor(anna).unwrap().is_killed());
    assert!(game.actor(anna).unwrap().inventory().is_empty());
    assert_eq!(game.actor(prof).unwrap().room(), hall);
    assert!(game.room(hall).unwrap().has_item(beer));
    assert_eq!(game.status(), GameStatus::Lost);
    assert_containment(&game);
}

#[test]
fn test_conduct_pass_saves_once_across_laps() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("hall", 2, &[]).unwrap();
    builder.add_room("office", 2, &[]).unwrap();
    builder.add_door("hall", "office", false).unwrap();
    let anna = builder.add_student("anna", "hall").unwrap();
    let pass = builder.add_item("ConductPass", "anna").unwrap();
    let prof = builder.add_auxiliary("Professor", "office").unwrap();
    let mut controller = Controller::new(builder.finish());
    let hall = controller.game().actor(anna).unwrap().room();

    // Lap 1: the professor walks into the hall and is shown the pass.
    assert_eq!(controller.end_turn(), TurnState::AwaitingCommand(anna));
    assert_eq!(controller.game().actor(prof).unwrap().room(), hall);
    assert!(!controller.game().actor(anna).unwrap().is_killed());
    assert_eq!(controller.game().item(pass).unwrap().charges(), 0);

    // Lap 2: back to the office.
    assert_eq!(controller.end_turn(), TurnState::AwaitingCommand(anna));
    assert_ne!(controller.game().actor(prof).unwrap().room(), hall);

    // Lap 3: the pass is spent.
    assert_eq!(controller.end_turn(), TurnState::Terminal(Outcome::Lost));
    assert!(controller.game().actor(anna).unwrap().is_killed());
    // Dropped in the hall; the professor may have grabbed it right away.
    assert_ne!(
        controller.game().item(pass).unwrap().owner(),
        Owner::Actor(anna)
    );
}

#[test]
fn test_drunk_student_is_spared() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("hall", 3, &[]).unwrap();
    builder.add_room("office", 3, &[]).unwrap();
    let door = builder.add_door("office", "hall", false).unwrap();
    let anna = builder.add_student("anna", "hall").unwrap();
    let beer = builder.add_item("Beer", "anna").unwrap();
    let prof = builder.add_auxiliary("Professor", "office").unwrap();
    let mut controller = Controller::new(builder.finish());

    assert!(controller.activate(beer));
    let mut game = controller.into_game();
    assert!(movement::move_actor(&mut game, prof, door));
    assert!(!game.actor(anna).unwrap().is_killed());
}

#[test]
fn test_teleport_into_full_room_fails_and_keeps_pairing() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("r1", 1, &[]).unwrap();
    builder.add_room("r2", 3, &[]).unwrap();
    let door = builder.add_door("r1", "r2", false).unwrap();
    let anna = builder.add_student("anna", "r1").unwrap();
    let bela = builder.add_student("bela", "r2").unwrap();
    let one = builder.add_item("Teleport", "anna").unwrap();
    let two = builder.add_item("Teleport", "anna").unwrap();
    let mut controller = Controller::new(builder.finish());
    let r1 = controller.game().actor(anna).unwrap().room();
    let r2 = controller.game().actor(bela).unwrap().room();

    // anna: pair the devices, deploy the first one in r1, walk to r2.
    assert!(controller.link(one, two));
    assert!(controller.activate(one));
    assert!(controller.game().item(one).unwrap().is_deployed());
    assert_eq!(controller.game().item(one).unwrap().owner(), Owner::Room(r1));
    assert!(controller.move_through(door));
    assert_eq!(controller.end_turn(), TurnState::AwaitingCommand(bela));

    // bela fills r1.
    assert!(controller.move_through(door));
    assert_eq!(controller.end_turn(), TurnState::AwaitingCommand(anna));

    // anna tries to teleport back.
    assert!(!controller.activate(two));
    let game = controller.game();
    assert_eq!(game.actor(anna).unwrap().room(), r2);
    assert!(game.actor(anna).unwrap().holds(two));
    assert_eq!(game.item(one).unwrap().pair(), Some(two));
    assert_eq!(game.item(two).unwrap().pair(), Some(one));
    assert!(game.item(one).unwrap().is_deployed());
    assert_containment(game);
}

#[test]
fn test_teleport_success_leaves_device_behind() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("r1", 2, &[]).unwrap();
    builder.add_room("r2", 2, &[]).unwrap();
    let door = builder.add_door("r1", "r2", false).unwrap();
    let anna = builder.add_student("anna", "r1").unwrap();
    let one = builder.add_item("Teleport", "anna").unwrap();
    let two = builder.add_item("Teleport", "anna").unwrap();
    let mut controller = Controller::new(builder.finish());
    let r1 = controller.game().actor(anna).unwrap().room();

    assert!(controller.link(one, two));
    assert!(controller.activate(one));
    assert!(controller.move_through(door));
    let r2 = controller.game().actor(anna).unwrap().room();

    assert!(controller.activate(two));
    let game = controller.game();
    assert_eq!(game.actor(anna).unwrap().room(), r1);
    assert_eq!(game.item(two).unwrap().owner(), Owner::Room(r2));
    assert_eq!(game.item(one).unwrap().pair(), None);
    assert_eq!(game.item(two).unwrap().pair(), None);
    assert!(!game.item(one).unwrap().is_deployed());
    assert_containment(game);

    // The undeployed anchor can be picked up again.
    assert!(controller.pick_up(one));
}

#[test]
fn test_game_is_lost_after_thirty_laps() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("cell", 1, &[]).unwrap();
    builder.add_student("anna", "cell").unwrap();
    let mut controller = Controller::new(builder.finish());

    let mut calls = 0;
    while !controller.is_finished() {
        controller.end_turn();
        calls += 1;
        assert!(calls <= 30, "game did not end");
    }
    assert_eq!(calls, 30);
    assert_eq!(controller.game().turn(), 31);
    assert!(controller.game().game_ended());
    assert_eq!(controller.game().status(), GameStatus::Lost);
    assert_eq!(controller.state(), TurnState::Terminal(Outcome::Lost));
}

#[test]
fn test_inventory_admits_one_more_than_capacity() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("store", 2, &[]).unwrap();
    let anna = builder.add_student("anna", "store").unwrap();
    let mut loose = Vec::new();
    for _ in 0..7 {
        loose.push(builder.add_item("Beer", "store").unwrap());
    }
    let mut game = builder.finish();

    for item in &loose[..6] {
        assert!(inventory::pick_up(&mut game, anna, *item));
    }
    assert_eq!(game.actor(anna).unwrap().inventory().len(), 6);
    assert!(!inventory::pick_up(&mut game, anna, loose[6]));
    assert_eq!(game.actor(anna).unwrap().inventory().len(), 6);
}

#[test]
fn test_peek_changes_nothing() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.apply_layout(&demo_layout());
    let mut controller = Controller::new(builder.finish());
    let anna = controller.active_student().unwrap();
    let lobby = controller.game().actor(anna).unwrap().room();
    let doors = controller.game().room(lobby).unwrap().doors().to_vec();

    let before = controller.game().describe();
    for door in &doors {
        assert!(controller.peek(*door).is_some());
        assert!(controller.peek(*door).is_some());
    }
    assert_eq!(controller.game().describe(), before);
    assert!(controller.move_through(doors[0]));
}

#[test]
fn test_listeners_follow_moves() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("a", 2, &[]).unwrap();
    builder.add_room("b", 2, &[]).unwrap();
    let door = builder.add_door("a", "b", false).unwrap();
    let anna = builder.add_student("anna", "a").unwrap();
    let mut controller = Controller::new(builder.finish());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let id = controller.subscribe(
        ObjectRef::Actor(anna),
        Box::new(move |e| sink.borrow_mut().push(e.change.clone())),
    );
    assert!(controller.move_through(door));
    assert!(matches!(seen.borrow().last(), Some(Change::Moved { .. })));

    assert!(controller.unsubscribe(ObjectRef::Actor(anna), id));
    let count = seen.borrow().len();
    controller.end_turn();
    assert!(controller.move_through(door));
    assert_eq!(seen.borrow().len(), count);
}

#[test]
fn test_random_play_keeps_containment() {
    for seed in 0..8u64 {
        let config = GameConfig {
            seed: Some(seed),
            mutation_chance: 0.5,
            ..GameConfig::default()
        };
        let mut builder = WorldBuilder::new(config);
        assert!(builder.apply_layout(&demo_layout()).is_empty());
        let mut controller = Controller::new(builder.finish());
        let mut rng = StdRng::seed_from_u64(seed);

        while !controller.is_finished() {
            let Some(student) = controller.active_student() else {
                break;
            };
            let (doors, loose, held) = {
                let game = controller.game();
                let actor = game.actor(student).unwrap();
                let room = game.room(actor.room()).unwrap();
                (
                    room.doors().to_vec(),
                    room.items().to_vec(),
                    actor.inventory().to_vec(),
                )
            };

            match rng.gen_range(0..5) {
                0 => {
                    if let Some(door) = doors.choose(&mut rng) {
                        controller.move_through(*door);
                    }
                }
                1 => {
                    if let Some(item) = loose.choose(&mut rng) {
                        controller.pick_up(*item);
                    }
                }
                2 => {
                    if let Some(item) = held.choose(&mut rng) {
                        controller.activate(*item);
                    }
                }
                3 => {
                    if let [a, b, ..] = held[..] {
                        controller.link(a, b);
                    }
                }
                _ => {
                    controller.end_turn();
                }
            }
            assert_containment(controller.game());
        }
        assert_ne!(controller.game().status(), GameStatus::Ongoing);
    }
}

#[test]
fn test_cleaned_room_turns_sticky_after_three_arrivals() {
    let mut builder = WorldBuilder::new(quiet_config());
    builder.add_room("yard", 5, &[]).unwrap();
    builder.add_room("closet", 2, &[]).unwrap();
    let hall = builder.add_room("hall", 5, &[]).unwrap();
    // Both doors only lead into the hall, so nobody wanders back out.
    builder.add_door("closet", "hall", true).unwrap();
    let entrance = builder.add_door("yard", "hall", true).unwrap();
    let anna = builder.add_student("anna", "yard").unwrap();
    let bela = builder.add_student("bela", "yard").unwrap();
    let cili = builder.add_student("cili", "yard").unwrap();
    let lady = builder.add_auxiliary("CleaningLady", "closet").unwrap();
    let first = builder.add_item("Beer", "hall").unwrap();
    let second = builder.add_item("Beer", "hall").unwrap();
    let mut controller = Controller::new(builder.finish());

    assert_eq!(controller.end_turn(), TurnState::AwaitingCommand(bela));
    assert_eq!(controller.end_turn(), TurnState::AwaitingCommand(cili));
    // The cleaning lady walks into the hall and cleans it.
    assert_eq!(controller.end_turn(), TurnState::AwaitingCommand(anna));
    assert_eq!(controller.game().actor(lady).unwrap().room(), hall);
    assert_eq!(controller.game().room(hall).unwrap().sticky_countdown(), 3);

    assert!(controller.move_through(entrance));
    assert!(controller.pick_up(first));
    assert_eq!(controller.game().room(hall).unwrap().sticky_countdown(), 2);
    assert_eq!(controller.end_turn(), TurnState::AwaitingCommand(bela));

    assert!(controller.move_through(entrance));
    assert!(!controller.game().room(hall).unwrap().hazards().sticky);
    assert_eq!(controller.end_turn(), TurnState::AwaitingCommand(cili));

    assert!(controller.move_through(entrance));
    assert!(controller.game().room(hall).unwrap().hazards().sticky);
    assert!(!controller.pick_up(second));
    assert_eq!(controller.game().item(second).unwrap().owner(), Owner::Room(hall));
    assert!(controller.game().actor(cili).unwrap().inventory().is_empty());
    assert_containment(controller.game());
}

#[test]
fn test_toxic_lap_stuns_and_strips_unprotected_students() {
    let mut builder = WorldBuilder::new(quiet_config());
    let lab = builder.add_room("lab", 4, &[Hazard::Toxic]).unwrap();
    builder.add_room("yard", 4, &[]).unwrap();
    builder.add_door("lab", "yard", false).unwrap();
    let anna = builder.add_student("anna", "lab").unwrap();
    let bela = builder.add_student("bela", "lab").unwrap();
    let dropped = builder.add_item("Beer", "anna").unwrap();
    let mask = builder.add_item("Respirator", "bela").unwrap();
    let kept = builder.add_item("Beer", "bela").unwrap();
    let mut game = builder.finish();

    game.lap_tick();

    let poisoned = game.actor(anna).unwrap();
    assert_eq!(poisoned.room(), lab);
    assert_eq!(poisoned.stunned_for(), 3);
    assert!(poisoned.inventory().is_empty());
    assert_eq!(game.item(dropped).unwrap().owner(), Owner::Room(lab));

    let shielded = game.actor(bela).unwrap();
    assert_eq!(shielded.room(), lab);
    assert!(!shielded.is_stunned());
    assert_eq!(shielded.inventory(), &[mask, kept]);
    assert_eq!(game.item(mask).unwrap().charges(), 2);
    assert_eq!(game.turn(), 2);
    assert_containment(&game);
}

#[test]
fn test_mutation_merges_then_splits_empty_rooms() {
    let mut builder = WorldBuilder::new(GameConfig {
        seed: Some(11),
        mutation_chance: 1.0,
        ..GameConfig::default()
    });
    let a = builder.add_room("a", 2, &[]).unwrap();
    let b = builder.add_room("b", 4, &[Hazard::Cursed, Hazard::Wet]).unwrap();
    let ab = builder.add_door("a", "b", false).unwrap();
    let i1 = builder.add_item("Beer", "a").unwrap();
    let i2 = builder.add_item("Beer", "b").unwrap();
    let i3 = builder.add_item("Beer", "b").unwrap();
    let mut game = builder.finish();

    // Two rooms: a is the only pick from the first half, b from the second.
    // After the merge a is the only room left to split.
    topology::mutate_topology(&mut game);

    assert!(game.room(b).is_none());
    assert!(game.door(ab).is_none());
    assert_eq!(game.doors().count(), 0);
    let rooms = game.room_ids().to_vec();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0], a);
    let c = rooms[1];
    assert!(c != a && c != b);

    let survivor = game.room(a).unwrap();
    assert_eq!(survivor.capacity(), 4);
    assert_eq!(survivor.items(), &[i2, i3]);
    let flags = survivor.hazards();
    assert!(flags.toxic && flags.wet && flags.cursed && !flags.sticky);

    let created = game.room(c).unwrap();
    assert_eq!(created.capacity(), 4);
    assert_eq!(created.items(), &[i1]);
    assert_eq!(created.hazards(), flags);

    assert_eq!(game.item(i1).unwrap().owner(), Owner::Room(c));
    assert_eq!(game.item(i2).unwrap().owner(), Owner::Room(a));
    assert_eq!(game.item(i3).unwrap().owner(), Owner::Room(a));
    assert_containment(&game);
}

#[test]
fn test_mutation_leaves_occupied_rooms_alone() {
    let mut builder = WorldBuilder::new(GameConfig {
        seed: Some(11),
        mutation_chance: 1.0,
        ..GameConfig::default()
    });
    builder.add_room("a", 2, &[]).unwrap();
    builder.add_room("b", 4, &[Hazard::Cursed]).unwrap();
    builder.add_door("a", "b", false).unwrap();
    builder.add_student("anna", "a").unwrap();
    builder.add_auxiliary("Professor", "b").unwrap();
    builder.add_item("Beer", "a").unwrap();
    builder.add_item("Beer", "b").unwrap();
    let mut game = builder.finish();
    let rooms = game.room_ids().to_vec();
    let before = game.describe();

    topology::mutate_topology(&mut game);

    assert_eq!(game.room_ids(), &rooms[..]);
    assert_eq!(game.describe(), before);
    assert_containment(&game);
}
