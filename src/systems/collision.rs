use bevy_ecs::{entity::Entity, world::World};
use glam::Vec3;
use smallvec::SmallVec;

use crate::constants::{GOLEM_HIT_CENTER, GOLEM_HIT_RADIUS, PLAYER_HIT_CENTER, PLAYER_HIT_RADIUS};
use crate::services::{ActorHandle, HitTarget, Services};
use crate::systems::golem::Golem;
use crate::systems::player::Player;

/// Moves every hit volume to where its actor ended up this tick.
///
/// Destroyed or stopped golems no longer have a hit volume and are skipped.
pub fn hit_volume_system(world: &mut World) {
    let mut volumes: SmallVec<[(HitTarget, ActorHandle, f32, f32); 4]> = SmallVec::new();

    if let Some(player) = world.get_resource::<Player>().filter(|player| player.is_running()) {
        volumes.push((HitTarget::Player, player.actor(), PLAYER_HIT_CENTER, PLAYER_HIT_RADIUS));
    }

    volumes.extend(
        world
            .query::<(Entity, &Golem)>()
            .iter(world)
            .filter(|(_, golem)| golem.is_present())
            .map(|(entity, golem)| (HitTarget::Golem(entity), golem.actor(), GOLEM_HIT_CENTER, GOLEM_HIT_RADIUS)),
    );

    let mut services = world.resource_mut::<Services>();
    for (target, actor, height, radius) in volumes {
        let center = services.render.transform(actor).position + Vec3::Z * height;
        services.collision.set_hit_volume(target, center, radius);
    }
}
