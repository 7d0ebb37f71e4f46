mod common;

use ajaw::config::GameConfig;
use ajaw::events::{GameEvent, GameEventKind};
use ajaw::level::layout::{doors, triggers};
use ajaw::services::headless::AudioCall;
use ajaw::services::{HitTarget, Music, Sfx, Transform};
use ajaw::systems::golem::{Golem, GolemState};
use ajaw::systems::player::PlayerState;
use common::{started, test_config, Harness};
use glam::Vec3;
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

fn golem(harness: &Harness) -> &Golem {
    harness.game.golem(harness.golem()).expect("golem exists")
}

fn brittle() -> GameConfig {
    GameConfig {
        golem_max_health: 1,
        ..test_config()
    }
}

#[test]
fn test_golem_waits_until_it_sees_the_player() {
    let mut harness = started(test_config());
    let start = harness.transform(harness.golem_actor());

    harness.run_for(1.0);

    assert_that(&golem(&harness).is_active()).is_false();
    assert_that(&golem(&harness).state()).is_equal_to(GolemState::Idle);
    assert_that(&harness.transform(harness.golem_actor())).is_equal_to(start);
    assert_that(&harness.collision.hit_volume(HitTarget::Golem(harness.golem())).is_some()).is_true();
}

#[test]
fn test_sighting_activates_and_switches_music() {
    let mut harness = started(test_config());

    harness.enter(triggers::GOLEM_VIEW);

    assert_that(&golem(&harness).is_active()).is_true();
    assert_that(&golem(&harness).tracked()).is_equal_to(Some(harness.player_actor()));
    assert_that(&harness.audio.calls().contains(&AudioCall::Crossfade {
        from: Music::Ambient,
        to: Music::Fight,
        duration: test_config().music_crossfade,
    }))
    .is_true();
}

#[test]
fn test_active_golem_walks_towards_a_distant_player() {
    let mut harness = started(test_config());

    harness.enter(triggers::GOLEM_VIEW);
    harness.run_for(1.0);

    let transform = harness.transform(harness.golem_actor());
    assert_that(&golem(&harness).state()).is_equal_to(GolemState::Walk);
    assert_that(&transform.position.y).is_less_than(12.0);
    assert_that(&transform.position.y).is_greater_than(11.0);
}

#[test]
fn test_last_hit_destroys_the_golem_once() {
    let mut harness = started(brittle());
    harness.record(&[GameEventKind::GolemDestroyed, GameEventKind::DoorOpened]);
    harness.enter(triggers::GOLEM_VIEW);
    let entity = harness.golem();

    harness.game.send(GameEvent::HitEnemy { enemy: entity });

    assert_that(&golem(&harness).health()).is_equal_to(0);
    assert_that(&golem(&harness).state()).is_equal_to(GolemState::Destroyed);
    assert_that(&golem(&harness).is_active()).is_false();
    assert_that(&harness.collision.hit_volume(HitTarget::Golem(entity))).is_none();

    harness.game.send(GameEvent::HitEnemy { enemy: entity });
    let resting = harness.transform(harness.golem_actor());
    harness.run_for(2.0);

    assert_that(&golem(&harness).state()).is_equal_to(GolemState::Destroyed);
    assert_that(&harness.transform(harness.golem_actor())).is_equal_to(resting);
    assert_that(&harness.collision.hit_volume(HitTarget::Golem(entity))).is_none();
    assert_that(&harness.audio.sfx_count(Sfx::GolemDestroyed)).is_equal_to(1);
    assert_eq!(
        harness.recorded(),
        vec![
            GameEvent::DoorOpened {
                door: doors::WOODEN_GUARDED
            },
            GameEvent::GolemDestroyed { golem: entity },
        ]
    );
}

#[test]
fn test_destroying_the_golem_ends_fight_mode() {
    let mut harness = started(brittle());
    harness.enter(triggers::GOLEM_VIEW);
    let entity = harness.golem();

    harness.game.send(GameEvent::HitEnemy { enemy: entity });

    let player = harness.game.player().expect("player is spawned");
    assert_that(&player.tracked_enemy()).is_none();
    assert_that(&player.state()).is_equal_to(PlayerState::Idle);
    assert_that(&harness.game.level().is_door_open(doors::WOODEN_GUARDED)).is_true();
    assert_that(&harness.audio.calls().contains(&AudioCall::Crossfade {
        from: Music::Fight,
        to: Music::Ambient,
        duration: test_config().music_crossfade,
    }))
    .is_true();
}

#[test]
fn test_hit_flashes_red_then_clears() {
    let mut harness = started(test_config());
    let entity = harness.golem();
    let actor = harness.golem_actor();

    harness.game.send(GameEvent::HitEnemy { enemy: entity });
    assert_that(&golem(&harness).health()).is_equal_to(4);
    assert_that(&harness.render.tint(actor).is_some()).is_true();

    harness.run_for(1.3);
    assert_that(&harness.render.tint(actor)).is_none();
    assert_that(&golem(&harness).state()).is_equal_to(GolemState::Idle);
}

#[test]
fn test_hit_during_flash_restarts_it() {
    let mut harness = started(test_config());
    let entity = harness.golem();

    harness.game.send(GameEvent::HitEnemy { enemy: entity });
    harness.run_for(0.2);
    harness.game.send(GameEvent::HitEnemy { enemy: entity });

    assert_that(&golem(&harness).health()).is_equal_to(3);
    assert_that(&harness.render.tint(harness.golem_actor()).is_some()).is_true();
    assert_that(&harness.audio.sfx_count(Sfx::GolemHit)).is_equal_to(2);
}

#[test]
fn test_hits_for_other_golems_are_ignored() {
    let mut harness = started(test_config());
    let stranger = harness.game.world_mut().spawn_empty().id();

    harness.game.send(GameEvent::HitEnemy { enemy: stranger });

    assert_that(&golem(&harness).health()).is_equal_to(5);
}

#[test]
fn test_nearby_golem_attacks_the_player() {
    let mut harness = started(GameConfig {
        golem_hit_chance: 1.0,
        ..test_config()
    });
    let actor = harness.golem_actor();
    harness.place(actor, Transform::new(Vec3::new(0.0, 1.5, 0.0), 180.0));

    harness.enter(triggers::GOLEM_VIEW);
    harness.run_for(4.0);

    let player = harness.game.player().expect("player is spawned");
    assert_that(&player.health()).is_less_than(3);
    assert_that(&harness.game.hud().health).is_equal_to(player.health());
}

#[test]
fn test_player_swing_damages_a_golem_in_reach() {
    let mut harness = started(GameConfig {
        player_hit_chance: 1.0,
        ..test_config()
    });
    let actor = harness.golem_actor();
    harness.place(actor, Transform::new(Vec3::new(0.0, 1.5, 0.0), 180.0));

    harness.enter(triggers::GOLEM_VIEW);
    harness.tap("e");
    harness.run_for(test_config().player_attack_hit_delay + 0.1);

    assert_that(&golem(&harness).health()).is_equal_to(4);
    assert_that(&harness.audio.sfx_count(Sfx::Swing)).is_equal_to(1);
}

#[test]
fn test_stopped_golem_leaves_no_hooks() {
    let mut harness = started(test_config());
    let entity = harness.golem();
    harness.enter(triggers::GOLEM_VIEW);
    harness.game.send(GameEvent::HitEnemy { enemy: entity });

    harness.game.stop();
    harness.run_for(1.0);

    assert_that(&golem(&harness).is_active()).is_false();
    assert_that(&harness.render.tint(harness.golem_actor())).is_none();
    assert_that(&harness.collision.hit_volume(HitTarget::Golem(entity))).is_none();
}
