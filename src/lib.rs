//! Ajaw gameplay core library crate.
//!
//! Actor state machines, golem AI and level puzzles wired together over a typed
//! event bus, running inside a single-threaded `bevy_ecs` world.

pub mod actor;
pub mod bus;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod formatter;
pub mod game;
pub mod level;
pub mod sequence;
pub mod services;
pub mod systems;
pub mod triggers;
