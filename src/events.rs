//! Typed gameplay events carried by the [`EventBus`](crate::bus::EventBus).
//!
//! Every event is a variant with its own payload; subscriptions are keyed by the
//! payload-free [`GameEventKind`] discriminant, so handlers get compile-time
//! checked payloads while publishers and subscribers stay decoupled.

use bevy_ecs::entity::Entity;
use strum_macros::{Display, EnumDiscriminants, IntoStaticStr};

use crate::level::DoorId;
use crate::triggers::TriggerEvent;

/// Logical input keys, independent of the physical device binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum InputKey {
    Left,
    Right,
    Forward,
    Backward,
    Center,
    Act,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
}

#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(GameEventKind), derive(Hash, IntoStaticStr))]
pub enum GameEvent {
    /// A bound key was pressed or released.
    Input { key: InputKey, pressed: bool },
    /// A collider entered or left a registered trigger volume.
    Trigger(TriggerEvent),
    /// The player performed a world interaction (normal-mode action).
    PlayerActivate,
    /// The player's action animation finished.
    ActionDone,
    EnterFightMode { enemy: Entity },
    ExitFightMode,
    /// A player swing connected with a golem.
    HitEnemy { enemy: Entity },
    /// A golem blow connected with the player.
    HitPlayer,
    GolemSeesPlayer { golem: Entity },
    GolemDestroyed { golem: Entity },
    DoorOpened { door: DoorId },
    /// HUD: new player health.
    SetHealth(u8),
    /// HUD: new key count.
    UpdateKeyCount(u32),
    /// HUD: transient message for the player.
    ShowMessage(String),
    /// HUD: the player is in range of something it can interact with.
    ActionActive,
    /// HUD: the player left the interaction range.
    ActionDeactive,
    GameOver(Outcome),
}

impl GameEvent {
    /// Returns the subscription key of this event.
    pub fn kind(&self) -> GameEventKind {
        self.into()
    }
}
