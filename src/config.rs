//! Tunable gameplay parameters.
//!
//! Defaults come from [`crate::constants`]; any field can be overridden with an
//! `AJAW_`-prefixed environment variable (e.g. `AJAW_PLAYER_HIT_CHANCE=0.25`).

use bevy_ecs::resource::Resource;
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{GameError, GameResult};

/// Gameplay tuning shared by every controller.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_max_health: u8,
    pub golem_max_health: u8,
    /// Probability in `[0, 1]` that an overlapping player swing damages a golem.
    pub player_hit_chance: f32,
    /// Probability in `[0, 1]` that an overlapping golem blow damages the player.
    pub golem_hit_chance: f32,
    pub death_delay: f32,
    pub player_run_speed: f32,
    pub player_turn_speed: f32,
    pub player_fight_speed: f32,
    pub player_attack_hit_delay: f32,
    pub jump_distance: f32,
    pub jump_height: f32,
    pub jump_duration: f32,
    pub golem_near_distance: f32,
    pub golem_walk_speed: f32,
    pub golem_attack_hit_delay: f32,
    pub music_crossfade: f32,
    /// Seed for the gameplay RNG; a random seed is drawn when unset.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_max_health: constants::PLAYER_MAX_HEALTH,
            golem_max_health: constants::GOLEM_MAX_HEALTH,
            player_hit_chance: constants::PLAYER_HIT_CHANCE,
            golem_hit_chance: constants::GOLEM_HIT_CHANCE,
            death_delay: constants::DEATH_DELAY,
            player_run_speed: constants::PLAYER_RUN_SPEED,
            player_turn_speed: constants::PLAYER_TURN_SPEED,
            player_fight_speed: constants::PLAYER_FIGHT_SPEED,
            player_attack_hit_delay: constants::PLAYER_ATTACK_HIT_DELAY,
            jump_distance: constants::JUMP_DISTANCE,
            jump_height: constants::JUMP_HEIGHT,
            jump_duration: constants::JUMP_DURATION,
            golem_near_distance: constants::GOLEM_NEAR_DISTANCE,
            golem_walk_speed: constants::GOLEM_WALK_SPEED,
            golem_attack_hit_delay: constants::GOLEM_ATTACK_HIT_DELAY,
            music_crossfade: constants::MUSIC_CROSSFADE,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Loads the configuration from defaults merged with `AJAW_*` environment variables.
    pub fn load() -> GameResult<Self> {
        Self::from_figment(Self::figment().merge(Env::prefixed("AJAW_")))
    }

    /// A figment seeded with the default configuration, for callers that want to layer their own providers.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(GameConfig::default()))
    }

    /// Extracts and validates a configuration from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> GameResult<Self> {
        let config: GameConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> GameResult<()> {
        if self.player_max_health == 0 || self.golem_max_health == 0 {
            return Err(GameError::InvalidConfig("max health must be at least 1".to_string()));
        }

        for (name, chance) in [
            ("player_hit_chance", self.player_hit_chance),
            ("golem_hit_chance", self.golem_hit_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(GameError::InvalidConfig(format!("{name} must be within [0, 1], got {chance}")));
            }
        }

        for (name, value) in [
            ("death_delay", self.death_delay),
            ("jump_duration", self.jump_duration),
            ("music_crossfade", self.music_crossfade),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(GameError::InvalidConfig(format!("{name} must be a non-negative duration, got {value}")));
            }
        }

        Ok(())
    }
}
