//! Board representation.
//!
//! Contains the grid coordinates, adjacency rules, territories, and the
//! board container that owns them.

pub mod location;
pub mod state;
pub mod territory;

pub use location::{Adjacency, Location};
pub use state::{Board, BoardError};
pub use territory::Territory;

/// Fewest armies a territory needs to attack; one always stays behind.
pub const MIN_ATTACKING_ARMIES: u32 = 2;

/// Largest board accepted, counted in territories.
pub const MAX_TERRITORIES: usize = 10_000;
