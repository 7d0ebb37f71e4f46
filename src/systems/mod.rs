//! Per-tick systems and the controllers they drive.
//!
//! Every system here is exclusive (`fn(&mut World)`): controllers react to bus
//! events synchronously, so they need the whole world rather than a set of queries.

pub mod collision;
pub mod components;
pub mod golem;
pub mod hud;
pub mod input;
pub mod player;

pub use components::{DeltaTime, GameRng};

use bevy_ecs::world::World;

use crate::services::Services;

/// Advances the renderer's animation clocks by this tick's delta.
pub fn animation_clock_system(world: &mut World) {
    let dt = world.resource::<DeltaTime>().0;
    world.resource_mut::<Services>().render.advance(dt);
}
