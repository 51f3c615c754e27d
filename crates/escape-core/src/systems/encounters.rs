//! Encounter system - what happens when two actors share a room

use crate::components::{ActorId, ActorKind, RoomId};
use crate::engine::Game;
use crate::events::{Change, ObjectRef};
use crate::systems::{inventory, items};

/// Outcome of two actor kinds meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterRule {
    Nothing,
    /// The professor (first) tries to kill the student (second).
    ProfessorKills,
}

/// Look up the rule for an ordered pair and say which side is the professor.
///
/// Returns the rule plus `true` when the roles are swapped, i.e. the first
/// actor is the student.
pub fn encounter_rule(first: ActorKind, second: ActorKind) -> (EncounterRule, bool) {
    match (first, second) {
        (ActorKind::Professor, ActorKind::Student) => (EncounterRule::ProfessorKills, false),
        (ActorKind::Student, ActorKind::Professor) => (EncounterRule::ProfessorKills, true),
        _ => (EncounterRule::Nothing, false),
    }
}

/// Resolve a meeting between a resident and an arriving actor in `room`.
///
/// Symmetric in its arguments. Killed actors take no part.
pub fn meet(game: &mut Game, resident: ActorId, arriving: ActorId, room: RoomId) {
    if resident == arriving {
        return;
    }
    let living_kind = |id: ActorId| {
        game.actor(id)
            .filter(|a| !a.is_killed())
            .map(|a| a.kind())
    };
    let (Some(first), Some(second)) = (living_kind(resident), living_kind(arriving)) else {
        return;
    };
    match encounter_rule(first, second) {
        (EncounterRule::ProfessorKills, false) => {
            kill_student(game, arriving, resident, room);
        }
        (EncounterRule::ProfessorKills, true) => {
            kill_student(game, resident, arriving, room);
        }
        (EncounterRule::Nothing, _) => {}
    }
}

/// A professor tries to kill a student.
///
/// A drunk student is untouched. Otherwise the first held item whose
/// professor protection succeeds saves the student. A killed student drops
/// everything into `room` and never acts again. Returns true on a kill.
///
/// `room` is where the meeting happens, i.e. the room just entered. When the
/// professor is the one arriving, the loot lands where the professor now
/// stands, not in the room the professor came from.
pub fn kill_student(game: &mut Game, student: ActorId, professor: ActorId, room: RoomId) -> bool {
    let vulnerable = game
        .actor(student)
        .map_or(false, |s| s.is_living_student() && !s.is_drunk());
    if !vulnerable {
        return false;
    }
    if items::shielded_from_professor(game, student) {
        log::debug!("{} showed a conduct pass to {}", student, professor);
        return false;
    }

    inventory::dump_inventory(game, student, room);
    if let Some(s) = game.actor_mut(student) {
        s.killed = true;
    }
    log::info!("{} was caught by {} in {}", student, professor, room);
    game.notify(ObjectRef::Actor(student), Change::Killed);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Hazards, ItemKind, Owner};
    use crate::config::GameConfig;

    fn game() -> (Game, RoomId) {
        let mut game = Game::new(GameConfig {
            seed: Some(9),
            ..GameConfig::static_topology()
        });
        let room = game.spawn_room(5, Hazards::none());
        (game, room)
    }

    #[test]
    fn test_rule_table_is_symmetric() {
        assert_eq!(
            encounter_rule(ActorKind::Professor, ActorKind::Student),
            (EncounterRule::ProfessorKills, false)
        );
        assert_eq!(
            encounter_rule(ActorKind::Student, ActorKind::Professor),
            (EncounterRule::ProfessorKills, true)
        );
        assert_eq!(
            encounter_rule(ActorKind::Student, ActorKind::Student).0,
            EncounterRule::Nothing
        );
        assert_eq!(
            encounter_rule(ActorKind::Professor, ActorKind::CleaningLady).0,
            EncounterRule::Nothing
        );
    }

    #[test]
    fn test_professor_kills_and_student_drops_everything() {
        let (mut game, room) = game();
        let s = game.spawn_actor("anna", ActorKind::Student, room).unwrap();
        let p = game.spawn_actor("", ActorKind::Professor, room).unwrap();
        let beer = game.spawn_item(ItemKind::Beer, false, Owner::Actor(s)).unwrap();

        meet(&mut game, s, p, room);

        assert!(game.actor(s).unwrap().is_killed());
        assert!(game.actor(s).unwrap().inventory().is_empty());
        assert!(game.room(room).unwrap().has_item(beer));
    }

    #[test]
    fn test_drunk_student_survives() {
        let (mut game, room) = game();
        let s = game.spawn_actor("anna", ActorKind::Student, room).unwrap();
        let p = game.spawn_actor("", ActorKind::Professor, room).unwrap();
        game.actor_mut(s).unwrap().make_drunk(2);
        assert!(!kill_student(&mut game, s, p, room));
        assert!(!game.actor(s).unwrap().is_killed());
    }

    #[test]
    fn test_conduct_pass_is_used_up() {
        let (mut game, room) = game();
        let s = game.spawn_actor("anna", ActorKind::Student, room).unwrap();
        let p = game.spawn_actor("", ActorKind::Professor, room).unwrap();
        let pass = game
            .spawn_item(ItemKind::ConductPass, false, Owner::Actor(s))
            .unwrap();

        assert!(!kill_student(&mut game, s, p, room));
        assert_eq!(game.item(pass).unwrap().charges(), 0);
        assert!(kill_student(&mut game, s, p, room));
    }

    #[test]
    fn test_dead_students_are_ignored() {
        let (mut game, room) = game();
        let s = game.spawn_actor("anna", ActorKind::Student, room).unwrap();
        let p = game.spawn_actor("", ActorKind::Professor, room).unwrap();
        assert!(kill_student(&mut game, s, p, room));
        assert!(!kill_student(&mut game, s, p, room));
    }
}
