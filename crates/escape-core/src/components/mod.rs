//! Component definitions for the simulation.
//!
//! Components are plain data. Each room, door, actor and item is one entity
//! in the game's `hecs::World`, spawned together with its handle.
//! Behaviour that spans more than one object lives in systems.

mod actor;
mod ids;
mod item;
mod room;

pub use actor::*;
pub use ids::*;
pub use item::*;
pub use room::*;
