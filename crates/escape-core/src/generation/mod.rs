//! Generation - building the initial campus graph

mod builder;
mod layout;

pub use builder::*;
pub use layout::*;
