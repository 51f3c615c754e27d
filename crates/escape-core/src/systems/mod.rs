//! Systems - the rules of the game, as free functions over [`crate::engine::Game`]

pub mod auxiliary;
pub mod encounters;
pub mod hazards;
pub mod inventory;
pub mod items;
pub mod movement;
pub mod topology;

pub use auxiliary::*;
pub use encounters::*;
pub use hazards::*;
pub use inventory::*;
pub use items::*;
pub use movement::*;
pub use topology::*;
