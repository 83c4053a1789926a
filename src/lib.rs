//! Warlord engine library.
//!
//! Exposes the board model, the game engine, the callback protocol, the
//! turn runner, and the HTTP front controller used by the binary entry point.

pub mod board;
pub mod engine;
pub mod player;
pub mod protocol;
pub mod resolve;
pub mod runner;
pub mod server;
