//! Attack resolution.
//!
//! Decides the army losses of a single attack between two territories.

pub mod combat;

pub use combat::{compare_rolls, dice_counts, resolve_battle, Battle};
