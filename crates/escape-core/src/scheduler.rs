//! Turn scheduler - the controller a presentation layer drives the game through.
//!
//! The controller keeps a cursor into the game's turn order. Player commands
//! go to the student under the cursor and never advance it; only
//! [`Controller::end_turn`] does, resolving professors and cleaning ladies
//! on the way to the next living student. Whenever the cursor wraps, the
//! game runs its per-lap tick.

use hecs::Ref;

use crate::components::{ActorId, DoorId, ItemId, Room};
use crate::engine::Game;
use crate::events::{Listener, ListenerId, ObjectRef};
use crate::systems::{auxiliary, inventory, items, movement};

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for the given student to issue commands.
    AwaitingCommand(ActorId),
    /// Auxiliary actors are being resolved. Only observable from inside `end_turn`.
    ResolvingAuxiliary,
    Terminal(Outcome),
}

/// A player command, for drivers that queue or replay input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(DoorId),
    PickUp(ItemId),
    Drop(ItemId),
    Link(ItemId, ItemId),
    Activate(ItemId),
    EndTurn,
}

pub struct Controller {
    game: Game,
    cursor: usize,
    state: TurnState,
}

impl Controller {
    /// Take over a built game. Play starts with the first living student.
    pub fn new(game: Game) -> Self {
        let first = game
            .turn_order
            .iter()
            .position(|id| game.actor(*id).map_or(false, |a| a.is_living_student()));
        let (cursor, state) = match first {
            Some(index) if !game.game_ended() => {
                (index, TurnState::AwaitingCommand(game.turn_order[index]))
            }
            Some(index) => (index, Self::outcome_of(&game)),
            None => (0, TurnState::Terminal(Outcome::Lost)),
        };
        log::debug!("controller starts in {:?}", state);
        Self {
            game,
            cursor,
            state,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Give the game back, e.g. to save it.
    pub fn into_game(self) -> Game {
        self.game
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, TurnState::Terminal(_))
    }

    /// The student whose commands are currently accepted.
    pub fn active_student(&self) -> Option<ActorId> {
        match self.state {
            TurnState::AwaitingCommand(student) => Some(student),
            _ => None,
        }
    }

    pub fn subscribe(&mut self, object: ObjectRef, listener: Listener) -> ListenerId {
        self.game.subscribe(object, listener)
    }

    pub fn subscribe_all(&mut self, listener: Listener) -> ListenerId {
        self.game.subscribe_all(listener)
    }

    pub fn unsubscribe(&mut self, object: ObjectRef, id: ListenerId) -> bool {
        self.game.unsubscribe(object, id)
    }

    // ── Player commands ─────────────────────────────────────────────────

    /// Move the active student. Only one move attempt per turn.
    pub fn move_through(&mut self, door: DoorId) -> bool {
        let Some(student) = self.active_student() else {
            return false;
        };
        if self.game.actor(student).map_or(true, |a| a.has_moved()) {
            return false;
        }
        let moved = movement::move_actor(&mut self.game, student, door);
        if let Some(a) = self.game.actor_mut(student) {
            a.set_moved(true);
        }
        moved
    }

    /// Look into the room across a door. Read-only.
    pub fn peek(&self, door: DoorId) -> Option<Ref<'_, Room>> {
        movement::peek(&self.game, self.active_student()?, door)
    }

    pub fn pick_up(&mut self, item: ItemId) -> bool {
        match self.active_student() {
            Some(student) => inventory::pick_up(&mut self.game, student, item),
            None => false,
        }
    }

    pub fn drop_item(&mut self, item: ItemId) -> bool {
        match self.active_student() {
            Some(student) => inventory::drop_item(&mut self.game, student, item),
            None => false,
        }
    }

    pub fn link(&mut self, first: ItemId, second: ItemId) -> bool {
        match self.active_student() {
            Some(student) => inventory::link_items(&mut self.game, student, first, second),
            None => false,
        }
    }

    pub fn activate(&mut self, item: ItemId) -> bool {
        match self.active_student() {
            Some(student) => items::activate_item(&mut self.game, student, item),
            None => false,
        }
    }

    /// Dispatch a queued command. `EndTurn` reports whether play continues.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Move(door) => self.move_through(door),
            Command::PickUp(item) => self.pick_up(item),
            Command::Drop(item) => self.drop_item(item),
            Command::Link(first, second) => self.link(first, second),
            Command::Activate(item) => self.activate(item),
            Command::EndTurn => !matches!(self.end_turn(), TurnState::Terminal(_)),
        }
    }

    // ── Turn flow ───────────────────────────────────────────────────────

    /// Finish the active student's turn and run everyone up to the next
    /// living student.
    pub fn end_turn(&mut self) -> TurnState {
        if let TurnState::Terminal(_) = self.state {
            return self.state;
        }
        if self.game.turn_order.is_empty() {
            self.state = TurnState::Terminal(Outcome::Lost);
            return self.state;
        }

        if let Some(student) = self.active_student() {
            if let Some(a) = self.game.actor_mut(student) {
                a.set_moved(false);
            }
        }
        self.advance();

        self.state = TurnState::ResolvingAuxiliary;
        loop {
            let current = self.game.turn_order[self.cursor];
            let living_student = self
                .game
                .actor(current)
                .map_or(false, |a| a.is_living_student());
            if living_student || self.game.game_ended() {
                break;
            }
            auxiliary::auxiliary_turn(&mut self.game, current);
            self.advance();
        }

        self.state = if self.game.game_ended() {
            Self::outcome_of(&self.game)
        } else {
            TurnState::AwaitingCommand(self.game.turn_order[self.cursor])
        };
        if let TurnState::Terminal(outcome) = self.state {
            log::info!("game over on lap {}: {:?}", self.game.turn(), outcome);
        }
        self.state
    }

    fn advance(&mut self) {
        self.cursor += 1;
        if self.cursor >= self.game.turn_order.len() {
            self.game.lap_tick();
            self.cursor %= self.game.turn_order.len().max(1);
        }
    }

    fn outcome_of(game: &Game) -> TurnState {
        if game.is_won() {
            TurnState::Terminal(Outcome::Won)
        } else {
            TurnState::Terminal(Outcome::Lost)
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("cursor", &self.cursor)
            .field("state", &self.state)
            .field("game", &self.game)
            .finish()
    }
}
