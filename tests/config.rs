use ajaw::config::GameConfig;
use ajaw::constants;
use ajaw::error::GameError;
use figment::providers::{Env, Serialized};
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

#[test]
fn test_defaults_come_from_constants() {
    let config = GameConfig::default();

    assert_that(&config.player_max_health).is_equal_to(constants::PLAYER_MAX_HEALTH);
    assert_that(&config.golem_max_health).is_equal_to(constants::GOLEM_MAX_HEALTH);
    assert_that(&config.player_hit_chance).is_equal_to(constants::PLAYER_HIT_CHANCE);
    assert_that(&config.golem_hit_chance).is_equal_to(constants::GOLEM_HIT_CHANCE);
    assert_that(&config.death_delay).is_equal_to(constants::DEATH_DELAY);
    assert_that(&config.seed).is_none();
}

#[test]
fn test_bare_figment_extracts_the_defaults() {
    let config = GameConfig::from_figment(GameConfig::figment()).expect("defaults are valid");
    assert_eq!(config, GameConfig::default());
}

#[test]
fn test_providers_override_single_fields() {
    let figment = GameConfig::figment()
        .merge(Serialized::default("golem_hit_chance", 0.25))
        .merge(Serialized::default("seed", 7u64));

    let config = GameConfig::from_figment(figment).expect("overrides are valid");

    assert_that(&config.golem_hit_chance).is_equal_to(0.25);
    assert_that(&config.seed).is_equal_to(Some(7));
    assert_that(&config.player_hit_chance).is_equal_to(constants::PLAYER_HIT_CHANCE);
}

#[test]
fn test_environment_overrides() {
    std::env::set_var("AJAWTEST_DEATH_DELAY", "1.5");
    std::env::set_var("AJAWTEST_GOLEM_MAX_HEALTH", "2");

    let figment = GameConfig::figment().merge(Env::prefixed("AJAWTEST_"));
    let config = GameConfig::from_figment(figment).expect("environment overrides are valid");

    assert_that(&config.death_delay).is_equal_to(1.5);
    assert_that(&config.golem_max_health).is_equal_to(2);
}

#[test]
fn test_out_of_range_chance_is_rejected() {
    let figment = GameConfig::figment().merge(Serialized::default("player_hit_chance", 1.5));

    let result = GameConfig::from_figment(figment);

    assert!(matches!(result, Err(GameError::InvalidConfig(_))));
}

#[test]
fn test_zero_health_is_rejected() {
    let figment = GameConfig::figment().merge(Serialized::default("player_max_health", 0));
    assert!(matches!(GameConfig::from_figment(figment), Err(GameError::InvalidConfig(_))));
}

#[test]
fn test_negative_delay_is_rejected() {
    let figment = GameConfig::figment().merge(Serialized::default("death_delay", -1.0));
    assert!(matches!(GameConfig::from_figment(figment), Err(GameError::InvalidConfig(_))));
}

#[test]
fn test_malformed_value_is_a_config_error() {
    let figment = GameConfig::figment().merge(Serialized::default("death_delay", "soon"));
    assert!(matches!(GameConfig::from_figment(figment), Err(GameError::Config(_))));
}
