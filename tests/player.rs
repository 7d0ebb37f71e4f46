mod common;

use ajaw::config::GameConfig;
use ajaw::events::{GameEvent, GameEventKind, Outcome};
use ajaw::level::layout::triggers;
use ajaw::services::{Clip, Sfx, Transform};
use ajaw::systems::player::{self, Mode, Player, PlayerState};
use ajaw::triggers::ColliderTag;
use common::{started, test_config, Harness};
use glam::Vec3;
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

fn player(harness: &Harness) -> &Player {
    harness.game.player().expect("player is spawned")
}

fn fragile() -> GameConfig {
    GameConfig {
        player_max_health: 1,
        ..test_config()
    }
}

#[test]
fn test_spawn_starts_idle_with_full_health() {
    let harness = started(test_config());

    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Idle);
    assert_that(&player(&harness).health()).is_equal_to(3);
    assert_that(&harness.game.hud().health).is_equal_to(3);
    assert_that(&harness.render.looping(harness.player_actor())).is_equal_to(Some(Clip::Idle));
}

#[test]
fn test_running_forward_follows_the_heading() {
    let mut harness = started(test_config());

    harness.press("w");
    harness.run_for(1.0);

    let position = harness.transform(harness.player_actor()).position;
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Run);
    assert_that(&(position - Vec3::new(0.0, 2.0, 0.0)).length()).is_less_than(0.01);

    harness.release("w");
    harness.tick();
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Idle);
}

#[test]
fn test_backing_up_runs_in_reverse() {
    let mut harness = started(test_config());

    harness.press("s");
    harness.tick();

    assert_that(&player(&harness).state()).is_equal_to(PlayerState::RunReverse);
    assert_that(&harness.transform(harness.player_actor()).position.y).is_less_than(0.0);
}

#[test]
fn test_turning_changes_heading_only() {
    let mut harness = started(test_config());

    harness.press("a");
    harness.run_for(0.1);

    let transform = harness.transform(harness.player_actor());
    assert_that(&transform.heading).is_greater_than(0.0);
    assert_eq!(transform.position, Vec3::ZERO);
}

#[test]
fn test_last_hit_ends_the_game_exactly_once() {
    let mut harness = started(fragile());
    harness.record(&[GameEventKind::GameOver]);
    let delay = test_config().death_delay;

    harness.game.send(GameEvent::HitPlayer);
    assert_that(&player(&harness).health()).is_equal_to(0);
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Death);
    assert_that(&harness.game.hud().health).is_equal_to(0);

    harness.run_for(delay - 0.5);
    assert_that(&harness.game.outcome()).is_none();

    harness.run_for(1.0);
    harness.game.send(GameEvent::HitPlayer);
    player::die(harness.game.world_mut());
    harness.run_for(delay + 1.0);

    assert_that(&harness.game.outcome()).is_equal_to(Some(Outcome::Lose));
    assert_eq!(harness.recorded(), vec![GameEvent::GameOver(Outcome::Lose)]);
    assert_that(&harness.game.hud().game_overs).is_equal_to(1);
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Death);
}

#[test]
fn test_heal_while_dying_does_not_cancel_game_over() {
    let mut harness = started(fragile());
    harness.record(&[GameEventKind::GameOver, GameEventKind::SetHealth]);
    let delay = test_config().death_delay;

    harness.game.send(GameEvent::HitPlayer);
    player::heal(harness.game.world_mut());

    assert_that(&player(&harness).health()).is_equal_to(0);
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Death);

    harness.run_for(delay + 0.5);

    assert_eq!(
        harness.recorded(),
        vec![GameEvent::SetHealth(0), GameEvent::GameOver(Outcome::Lose)]
    );
    assert_that(&harness.game.outcome()).is_equal_to(Some(Outcome::Lose));
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Death);
}

#[test]
fn test_hit_with_health_left_recovers() {
    let mut harness = started(test_config());

    harness.game.send(GameEvent::HitPlayer);
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Hit);
    assert_that(&player(&harness).health()).is_equal_to(2);
    assert_that(&harness.audio.sfx_count(Sfx::PlayerHit)).is_equal_to(1);

    harness.run_for(Clip::Hit.duration() + 0.1);
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Idle);
}

#[test]
fn test_heal_is_clamped_to_max() {
    let mut harness = started(test_config());

    harness.game.send(GameEvent::HitPlayer);
    player::heal(harness.game.world_mut());
    player::heal(harness.game.world_mut());

    assert_that(&player(&harness).health()).is_equal_to(3);
    assert_that(&harness.game.hud().health).is_equal_to(3);
}

#[test]
fn test_death_zone_returns_to_the_last_checkpoint() {
    let mut harness = started(test_config());
    let actor = harness.player_actor();
    let checkpoint = Transform::new(Vec3::new(1.0, 1.0, 0.0), 45.0);

    harness.place(actor, checkpoint);
    harness.enter(triggers::CHECKPOINT);
    assert_that(&player(&harness).checkpoint()).is_equal_to(checkpoint);

    harness.place(actor, Transform::new(Vec3::new(5.0, 5.0, 0.0), 0.0));
    harness.enter(triggers::SPIKES);
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Death);
    assert_that(&player(&harness).health()).is_equal_to(2);

    harness.run_for(test_config().death_delay + 0.1);

    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Idle);
    assert_that(&harness.transform(actor)).is_equal_to(checkpoint);
    assert_that(&harness.game.outcome()).is_none();
}

#[test]
fn test_action_is_not_retriggered_while_running() {
    let mut harness = started(test_config());
    harness.record(&[GameEventKind::PlayerActivate]);

    harness.tap("e");
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Action);
    assert_that(&player(&harness).is_action_armed()).is_false();
    harness.tap("e");
    assert_that(&harness.count(&GameEvent::PlayerActivate)).is_equal_to(1);

    harness.run_for(0.7);
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Idle);
    assert_that(&player(&harness).is_action_armed()).is_true();

    harness.tap("e");
    assert_that(&harness.count(&GameEvent::PlayerActivate)).is_equal_to(2);
}

/// Starts running, then leaves the ground trigger with the jump probe. Returns the take-off point.
fn jump_off_ledge(harness: &mut Harness) -> Vec3 {
    harness.press("w");
    harness.tick();
    let from = harness.transform(harness.player_actor()).position;

    harness.collision.exit(ColliderTag::PlayerJumpProbe, triggers::GROUND);
    harness.tick();
    harness.release("w");
    from
}

#[test]
fn test_jump_lands_ahead_on_solid_ground() {
    let mut harness = started(test_config());

    let from = jump_off_ledge(&mut harness);
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Jump);

    harness.run_for(test_config().jump_duration + 0.1);

    let landed = harness.transform(harness.player_actor()).position;
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Idle);
    assert_that(&(landed - (from + Vec3::new(0.0, 2.0, 0.0))).length()).is_less_than(1e-4);
}

#[test]
fn test_jump_into_a_pit_kills() {
    let mut harness = started(test_config());
    // The first running tick moves the player a little; a generous pit covers the landing spot.
    harness.collision.add_pit(Vec3::new(0.0, 2.0, 0.0), 0.5);

    jump_off_ledge(&mut harness);
    harness.run_for(test_config().jump_duration + 0.1);

    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Death);
    assert_that(&player(&harness).health()).is_equal_to(2);
}

#[test]
fn test_jump_requires_running() {
    let mut harness = started(test_config());

    harness.collision.exit(ColliderTag::PlayerJumpProbe, triggers::GROUND);
    harness.tick();

    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Idle);
}

#[test]
fn test_mid_air_hit_does_not_interrupt_the_jump() {
    let mut harness = started(test_config());

    jump_off_ledge(&mut harness);
    harness.game.send(GameEvent::HitPlayer);

    assert_that(&player(&harness).state()).is_equal_to(PlayerState::Jump);
    assert_that(&player(&harness).health()).is_equal_to(2);
}

#[test]
fn test_golem_sighting_enters_fight_mode() {
    let mut harness = started(test_config());
    harness.record(&[GameEventKind::EnterFightMode]);

    harness.enter(triggers::GOLEM_VIEW);

    let golem = harness.golem();
    assert_that(&player(&harness).mode()).is_equal_to(Mode::Fight);
    assert_that(&player(&harness).state()).is_equal_to(PlayerState::FightIdle);
    assert_that(&player(&harness).tracked_enemy()).is_equal_to(Some(golem));
    assert_eq!(harness.recorded(), vec![GameEvent::EnterFightMode { enemy: golem }]);
}

#[test]
fn test_fight_mode_faces_the_golem() {
    let mut harness = started(test_config());
    let golem_actor = harness.golem_actor();
    harness.place(golem_actor, Transform::new(Vec3::new(5.0, 0.0, 0.0), 0.0));

    harness.enter(triggers::GOLEM_VIEW);
    harness.tick();

    let heading = harness.transform(harness.player_actor()).heading;
    assert_that(&(heading + 90.0).abs()).is_less_than(1e-3);
}
