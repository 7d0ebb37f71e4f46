//! This module contains all the constants used in the game.

/// Maximum (and starting) health of the player, in hearts.
pub const PLAYER_MAX_HEALTH: u8 = 3;
/// Maximum (and starting) health of a golem.
pub const GOLEM_MAX_HEALTH: u8 = 5;

/// Chance that a player attack overlapping a golem actually lands.
pub const PLAYER_HIT_CHANCE: f32 = 0.5;
/// Chance that a golem attack overlapping the player actually lands.
pub const GOLEM_HIT_CHANCE: f32 = 0.5;

/// Seconds spent in `Death` before the game ends or the player is reset to the last checkpoint.
pub const DEATH_DELAY: f32 = 3.0;

/// Player heading change while turning, in degrees per second.
pub const PLAYER_TURN_SPEED: f32 = 250.0;
/// Player translation speed in normal mode, in units per second.
pub const PLAYER_RUN_SPEED: f32 = 2.0;
/// Player translation speed while strafing around a tracked enemy.
pub const PLAYER_FIGHT_SPEED: f32 = 5.0;
/// Delay into the fight attack animation at which the swing is resolved.
pub const PLAYER_ATTACK_HIT_DELAY: f32 = 0.3;
/// Length of the player's attack segment, measured from the body center.
pub const PLAYER_ATTACK_REACH: f32 = 1.2;
/// Radius of the player's hit volume.
pub const PLAYER_HIT_RADIUS: f32 = 0.7;
/// Height of the center of the player's hit volume above the feet.
pub const PLAYER_HIT_CENTER: f32 = 0.8;

/// How far ahead of a ledge a jump lands.
pub const JUMP_DISTANCE: f32 = 2.0;
/// Apex height of the jump arc above the straight line between take-off and landing.
pub const JUMP_HEIGHT: f32 = 1.0;
/// Duration of the jump motion in seconds.
pub const JUMP_DURATION: f32 = 0.8;

/// A golem closer than this to the player stops walking and starts fighting.
pub const GOLEM_NEAR_DISTANCE: f32 = 2.0;
/// Golem walking speed, in units per second.
pub const GOLEM_WALK_SPEED: f32 = 0.5;
/// Delay into the golem attack animation at which the blow is resolved.
pub const GOLEM_ATTACK_HIT_DELAY: f32 = 0.5;
/// Play rate of the golem attack animation.
pub const GOLEM_ATTACK_RATE: f32 = 2.0;
/// Length of the golem's attack segment.
pub const GOLEM_ATTACK_REACH: f32 = 1.3;
/// Radius of a golem's hit volume.
pub const GOLEM_HIT_RADIUS: f32 = 1.0;
/// Height of the center of a golem's hit volume above the feet.
pub const GOLEM_HIT_CENTER: f32 = 0.5;

/// Interval between tint changes of the golem hit flash.
pub const HIT_FLASH_INTERVAL: f32 = 0.15;
/// Number of red pulses in the golem hit flash.
pub const HIT_FLASH_PULSES: usize = 4;

/// Height above the feet at which attack segments are cast.
pub const ATTACK_HEIGHT: f32 = 1.0;

/// Crossfade time between ambient and fight music.
pub const MUSIC_CROSSFADE: f32 = 2.0;
