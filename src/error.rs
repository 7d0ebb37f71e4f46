//! Centralized error types for the gameplay core.
//!
//! Nothing in here is fatal to the simulation loop: puzzle and trigger errors
//! are logged by the event handlers that receive them and the frame carries on.

use crate::level::{ChestId, DoorId, GroupId, SwitchId};
use crate::triggers::TriggerId;

/// Main error type for the gameplay core.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Level error: {0}")]
    Level(#[from] LevelError),

    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),
}

/// Errors raised by the level puzzle engine.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelError {
    #[error("Unknown switch: {0:?}")]
    UnknownSwitch(SwitchId),

    #[error("Unknown chest: {0:?}")]
    UnknownChest(ChestId),

    #[error("Unknown door: {0:?}")]
    UnknownDoor(DoorId),

    #[error("Unknown order group: {0:?}")]
    UnknownGroup(GroupId),

    #[error("Door {0:?} is not gated by a key")]
    NotKeyGated(DoorId),

    #[error("Door {0:?} is not guarded by an enemy")]
    NotEnemyGated(DoorId),

    #[error("Switch {switch:?} is not part of the sequence of group {group:?}")]
    NotInGroup { switch: SwitchId, group: GroupId },
}

/// Errors raised by the collision trigger adapter.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerError {
    #[error("Unknown trigger volume: {0:?}")]
    UnknownTrigger(TriggerId),
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
