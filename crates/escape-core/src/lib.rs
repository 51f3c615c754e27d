//! Escape Core - turn-based campus survival engine
//!
//! Students roam a graph of rooms connected by doors, trying to pick up the
//! winning item before the lap limit runs out or a professor catches them.
//! Rooms carry hazards, items grant protections or effects, and the room
//! graph itself mutates between laps.
//!
//! # Architecture
//!
//! - **Components**: plain data stored as entities in a `hecs::World`, addressed by handle
//! - **Systems**: free functions taking `&mut Game` that implement every rule
//! - **Scheduler**: the [`scheduler::Controller`] state machine that drives turns
//!
//! # Example
//!
//! ```rust,no_run
//! use escape_core::prelude::*;
//! use escape_core::generation::{demo_layout, WorldBuilder};
//!
//! let mut builder = WorldBuilder::new(GameConfig::seeded(7));
//! let errors = builder.apply_layout(&demo_layout());
//! assert!(errors.is_empty());
//!
//! let mut controller = Controller::new(builder.finish());
//! while !controller.is_finished() {
//!     controller.end_turn();
//! }
//! println!("{}", controller.game().describe());
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod generation;
pub mod persistence;
pub mod scheduler;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::GameConfig;
    pub use crate::engine::{Game, GameStatus};
    pub use crate::events::{Change, ChangeEvent, ObjectRef};
    pub use crate::scheduler::{Command, Controller, Outcome, TurnState};
}
