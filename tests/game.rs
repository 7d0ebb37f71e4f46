mod common;

use ajaw::bus::EventBus;
use ajaw::events::{GameEvent, Outcome};
use ajaw::level::layout::{doors, triggers};
use ajaw::level::{self, ChestId};
use ajaw::sequence::Sequencer;
use ajaw::services::{HitTarget, Sfx};
use common::{build, started, test_config};
use speculoos::prelude::*;

#[test]
fn test_building_does_not_start_anything() {
    let harness = build(test_config());

    assert_that(&harness.game.is_started()).is_false();
    assert_that(&harness.game.player().is_none()).is_true();
    assert_that(&harness.game.world().resource::<EventBus>().is_empty()).is_true();
    assert_that(&harness.game.golems().len()).is_equal_to(1);
    assert_that(&harness.audio.calls().is_empty()).is_true();
}

#[test]
fn test_start_is_idempotent() {
    let mut harness = started(test_config());
    let subscriptions = harness.game.world().resource::<EventBus>().len();

    harness.game.start();

    assert_that(&harness.game.world().resource::<EventBus>().len()).is_equal_to(subscriptions);
}

#[test]
fn test_stop_revokes_every_subscription() {
    let mut harness = started(test_config());
    harness.enter(triggers::GOLEM_VIEW);

    harness.game.stop();

    assert_that(&harness.game.is_started()).is_false();
    assert_that(&harness.game.world().resource::<EventBus>().is_empty()).is_true();
    assert_that(&harness.game.world().resource::<Sequencer>().is_empty()).is_true();
    assert_that(&harness.collision.hit_volume(HitTarget::Player)).is_none();
    assert_that(&harness.render.is_visible(harness.player_actor())).is_false();
}

#[test]
fn test_events_after_stop_have_no_effect() {
    let mut harness = started(test_config());
    harness.game.stop();

    harness.game.send(GameEvent::HitEnemy {
        enemy: harness.golem(),
    });
    harness.game.send(GameEvent::GameOver(Outcome::Lose));
    harness.run_for(1.0);

    assert_that(&harness.game.golem(harness.golem()).map(|golem| golem.health())).is_equal_to(Some(5));
    assert_that(&harness.game.outcome()).is_none();
}

#[test]
fn test_stop_mid_chest_animation_awards_nothing() {
    let mut harness = started(test_config());
    level::open_chest(harness.game.world_mut(), ChestId(0)).expect("chest exists");

    harness.game.stop();
    harness.run_for(3.0);

    assert_that(&harness.game.level().keys()).is_equal_to(0);
    assert_that(&harness.game.hud().keys).is_equal_to(0);
    assert_that(&harness.audio.sfx_count(Sfx::KeyPickup)).is_equal_to(0);
}

#[test]
fn test_cleanup_removes_the_golems() {
    let mut harness = started(test_config());
    let golem = harness.golem();

    harness.game.cleanup();

    assert_that(&harness.game.golems().is_empty()).is_true();
    assert_that(&harness.game.world().get_entity(golem).is_err()).is_true();
}

#[test]
fn test_unbound_keys_are_rejected() {
    let mut harness = started(test_config());
    assert_that(&harness.game.key("f13", true)).is_false();
    assert_that(&harness.game.key("enter", true)).is_true();
}

#[test]
fn test_full_walkthrough_wins() {
    let mut harness = started(test_config());

    harness.interact_with(triggers::switch(0));
    for n in [2, 3, 4, 1] {
        harness.interact_with(triggers::switch(n));
    }
    harness.interact_with(triggers::switch(5));
    harness.interact_with(triggers::CHEST_KEY);
    harness.run_for(1.0);
    harness.interact_with(triggers::KEY_DOOR);

    let golem = harness.golem();
    harness.enter(triggers::GOLEM_VIEW);
    for _ in 0..5 {
        harness.game.send(GameEvent::HitEnemy { enemy: golem });
    }
    harness.exit(triggers::GOLEM_VIEW);

    harness.interact_with(triggers::CHEST_ARTIFACT);
    harness.run_for(1.0);

    let level = harness.game.level();
    for door in [
        doors::WOODEN,
        doors::BOULDER,
        doors::BOULDER_KEY,
        doors::BOULDER_LAST,
        doors::WOODEN_GUARDED,
    ] {
        assert_that(&level.is_door_open(door)).is_true();
        assert_that(&harness.collision.is_passable(door)).is_true();
    }
    assert_that(&harness.game.outcome()).is_equal_to(Some(Outcome::Win));
    assert_that(&harness.game.hud().game_overs).is_equal_to(1);
    assert_that(&harness.audio.sfx_count(Sfx::DoorOpen)).is_equal_to(5);
}
