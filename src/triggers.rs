//! Collision trigger adapter.
//!
//! Trigger volumes are registered under stable [`TriggerId`]s with a typed
//! [`TriggerKind`]. Once per tick the adapter drains the overlaps the collision
//! collaborator observed for each of the player's colliders and republishes them
//! on the bus as [`GameEvent::Trigger`]. Overlaps with unknown ids are dropped.

use std::collections::HashMap;

use bevy_ecs::{entity::Entity, resource::Resource, world::World};
use tracing::{trace, warn};

use crate::bus::publish;
use crate::error::TriggerError;
use crate::events::GameEvent;
use crate::level::Interactable;
use crate::services::Services;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(pub u32);

/// Moving colliders whose overlaps are observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderTag {
    /// The player's body sphere.
    PlayerBody,
    /// The short segment just ahead of the player's feet that detects ledges.
    PlayerJumpProbe,
}

impl ColliderTag {
    pub const ALL: [ColliderTag; 2] = [ColliderTag::PlayerBody, ColliderTag::PlayerJumpProbe];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Enter,
    Exit,
}

/// A single overlap change reported by the collision collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub trigger: TriggerId,
    pub phase: Phase,
}

/// What a trigger volume means to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// Range in which the player can operate a level object.
    Interact(Interactable),
    /// A golem's field of view.
    EnemyView(Entity),
    /// Walkable ground; leaving it with the jump probe means a ledge is ahead.
    Ledge,
    /// A volume that kills the player on contact (pits, spikes).
    DeathZone,
    /// Ground on which the player's position is recorded as a checkpoint.
    SafeGround,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    pub collider: ColliderTag,
    pub trigger: TriggerId,
    pub kind: TriggerKind,
    pub phase: Phase,
}

impl TriggerEvent {
    pub fn is_enter(&self) -> bool {
        self.phase == Phase::Enter
    }

    pub fn is_exit(&self) -> bool {
        self.phase == Phase::Exit
    }
}

#[derive(Resource, Debug, Default)]
pub struct TriggerRegistry {
    triggers: HashMap<TriggerId, TriggerKind>,
}

impl TriggerRegistry {
    /// Registers a trigger volume, returning the kind it replaced, if any.
    pub fn register(&mut self, id: TriggerId, kind: TriggerKind) -> Option<TriggerKind> {
        let previous = self.triggers.insert(id, kind);
        if let Some(previous) = previous {
            warn!(?id, ?previous, ?kind, "Trigger volume re-registered");
        }
        previous
    }

    pub fn unregister(&mut self, id: TriggerId) -> Option<TriggerKind> {
        self.triggers.remove(&id)
    }

    /// Removes every trigger bound to `owner` (its field of view).
    pub fn unregister_owned(&mut self, owner: Entity) -> usize {
        let before = self.triggers.len();
        self.triggers
            .retain(|_, kind| !matches!(kind, TriggerKind::EnemyView(entity) if *entity == owner));
        before - self.triggers.len()
    }

    pub fn resolve(&self, id: TriggerId) -> Result<TriggerKind, TriggerError> {
        self.triggers.get(&id).copied().ok_or(TriggerError::UnknownTrigger(id))
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

/// Translates this tick's overlaps into bus events.
pub fn trigger_system(world: &mut World) {
    for collider in ColliderTag::ALL {
        let overlaps = world.resource_mut::<Services>().collision.drain_overlaps(collider);

        for overlap in overlaps {
            let kind = match world.resource::<TriggerRegistry>().resolve(overlap.trigger) {
                Ok(kind) => kind,
                Err(error) => {
                    warn!(?collider, phase = ?overlap.phase, %error, "Ignoring overlap");
                    continue;
                }
            };

            trace!(?collider, trigger = ?overlap.trigger, ?kind, phase = ?overlap.phase, "Trigger overlap");
            publish(
                world,
                GameEvent::Trigger(TriggerEvent {
                    collider,
                    trigger: overlap.trigger,
                    kind,
                    phase: overlap.phase,
                }),
            );
        }
    }
}
