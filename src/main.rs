//! Headless driver: plays through the first level with scripted input and logs what happens.

use ajaw::config::GameConfig;
use ajaw::formatter::TickFormatter;
use ajaw::game::Game;
use ajaw::level::layout::triggers;
use ajaw::level::LevelLayout;
use ajaw::services::headless::{HeadlessAudio, HeadlessRenderer, ScriptedCollision};
use ajaw::services::{RenderService, Services, Transform};
use ajaw::systems::golem::GolemState;
use ajaw::triggers::{ColliderTag, TriggerId};
use anyhow::Context;
use glam::Vec3;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

const FRAME: f32 = 1.0 / 60.0;

fn setup_logging() -> anyhow::Result<()> {
    // RUST_LOG overrides; default to info for this crate and warn elsewhere
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{name}=info", name = env!("CARGO_CRATE_NAME"))));

    let subscriber = tracing_subscriber::fmt()
        .with_ansi(true)
        .event_format(TickFormatter)
        .with_env_filter(filter)
        .finish()
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(subscriber).context("Could not set global default subscriber")
}

struct Walkthrough {
    game: Game,
    render: HeadlessRenderer,
    collision: ScriptedCollision,
}

impl Walkthrough {
    fn run_for(&mut self, seconds: f32) {
        let frames = (seconds / FRAME).ceil() as usize;
        for _ in 0..frames {
            if self.game.outcome().is_some() {
                return;
            }
            self.game.tick(FRAME);
        }
    }

    fn tap(&mut self, key: &str) {
        self.game.key(key, true);
        self.game.tick(FRAME);
        self.game.key(key, false);
    }

    /// Walks into an interaction volume, uses it, waits for the props to settle and walks out.
    fn operate(&mut self, trigger: TriggerId, settle: f32) {
        self.collision.enter(ColliderTag::PlayerBody, trigger);
        self.game.tick(FRAME);
        self.tap("e");
        self.run_for(settle);
        self.collision.exit(ColliderTag::PlayerBody, trigger);
        self.game.tick(FRAME);
    }

    /// Stands in front of the golem and swings until it crumbles or the game ends.
    fn fight(&mut self) -> anyhow::Result<()> {
        let golem = *self.game.golems().first().context("Level has no golem")?;
        self.collision.enter(ColliderTag::PlayerBody, triggers::GOLEM_VIEW);
        self.game.tick(FRAME);

        for _ in 0..120 {
            let Some(state) = self.game.golem(golem).map(|golem| golem.state()) else {
                break;
            };
            if state == GolemState::Destroyed || self.game.outcome().is_some() {
                break;
            }

            let golem_at = self
                .game
                .golem(golem)
                .map(|golem| self.render.transform(golem.actor()).position)
                .context("Golem vanished")?;
            let player = self.game.player().map(|player| player.actor()).context("No player")?;
            self.render
                .set_transform(player, Transform::new(golem_at - Vec3::new(0.0, 1.5, 0.0), 0.0));

            self.tap("e");
            self.run_for(1.0);
        }

        self.run_for(3.0);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    setup_logging()?;

    let config = GameConfig::load()?;
    let render = HeadlessRenderer::new();
    let collision = ScriptedCollision::new();
    let services = Services::new(render.clone(), HeadlessAudio::new(), collision.clone());
    let mut game = Game::new(services, config, LevelLayout::level01())?;
    game.start();

    let mut walk = Walkthrough { game, render, collision };

    walk.game.key("w", true);
    walk.run_for(1.0);
    walk.game.key("w", false);
    walk.collision.enter(ColliderTag::PlayerBody, triggers::CHECKPOINT);
    walk.run_for(0.5);

    walk.operate(triggers::switch(0), 1.5);
    for switch in [2, 3, 4, 1] {
        walk.operate(triggers::switch(switch), 1.5);
    }
    walk.operate(triggers::switch(5), 1.5);
    walk.operate(triggers::CHEST_KEY, 2.0);
    walk.operate(triggers::KEY_DOOR, 2.0);

    walk.fight()?;

    if walk.game.outcome().is_none() {
        walk.operate(triggers::CHEST_ARTIFACT, 2.0);
    }

    let hud = walk.game.hud().clone();
    info!(
        outcome = ?hud.outcome,
        health = hud.health,
        keys = hud.keys,
        "Walkthrough finished"
    );

    walk.game.cleanup();
    Ok(())
}
