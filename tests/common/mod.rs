#![allow(dead_code)]

use ajaw::{
    bus::EventBus,
    config::GameConfig,
    events::{GameEvent, GameEventKind},
    game::Game,
    level::LevelLayout,
    services::{
        headless::{HeadlessAudio, HeadlessRenderer, ScriptedCollision},
        ActorHandle, RenderService, Services, Transform,
    },
    triggers::{ColliderTag, TriggerId},
};
use bevy_ecs::{entity::Entity, resource::Resource};

pub const FRAME: f32 = 1.0 / 60.0;

/// Every event of the recorded kinds, in publish order.
#[derive(Resource, Default)]
pub struct Recorded(pub Vec<GameEvent>);

/// A game running on headless services, plus handles to inspect what it asked of them.
pub struct Harness {
    pub game: Game,
    pub render: HeadlessRenderer,
    pub audio: HeadlessAudio,
    pub collision: ScriptedCollision,
}

/// Seeded so that coin flips and hit rolls repeat between runs.
pub fn test_config() -> GameConfig {
    GameConfig {
        seed: Some(0x41_4A_41_57),
        ..GameConfig::default()
    }
}

pub fn build(config: GameConfig) -> Harness {
    let render = HeadlessRenderer::new();
    let audio = HeadlessAudio::new();
    let collision = ScriptedCollision::new();
    let services = Services::new(render.clone(), audio.clone(), collision.clone());
    let game = Game::new(services, config, LevelLayout::level01()).expect("level01 should build");

    Harness {
        game,
        render,
        audio,
        collision,
    }
}

/// Builds and starts the first level.
pub fn started(config: GameConfig) -> Harness {
    let mut harness = build(config);
    harness.game.start();
    harness
}

impl Harness {
    pub fn tick(&mut self) {
        self.game.tick(FRAME);
    }

    pub fn run_for(&mut self, seconds: f32) {
        let frames = (seconds / FRAME).ceil() as usize;
        for _ in 0..frames {
            self.game.tick(FRAME);
        }
    }

    pub fn press(&mut self, key: &str) {
        assert!(self.game.key(key, true), "{key} should be bound");
    }

    pub fn release(&mut self, key: &str) {
        assert!(self.game.key(key, false), "{key} should be bound");
    }

    pub fn tap(&mut self, key: &str) {
        self.press(key);
        self.tick();
        self.release(key);
    }

    pub fn enter(&mut self, trigger: TriggerId) {
        self.collision.enter(ColliderTag::PlayerBody, trigger);
        self.tick();
    }

    pub fn exit(&mut self, trigger: TriggerId) {
        self.collision.exit(ColliderTag::PlayerBody, trigger);
        self.tick();
    }

    /// Walks up to an interactable, presses the action key, waits out the action and walks away.
    pub fn interact_with(&mut self, trigger: TriggerId) {
        self.enter(trigger);
        self.tap("e");
        self.run_for(0.7);
        self.exit(trigger);
    }

    pub fn player_actor(&self) -> ActorHandle {
        self.render.handle("Character").expect("player actor is loaded")
    }

    pub fn golem_actor(&self) -> ActorHandle {
        self.render.handle("Golem").expect("golem actor is loaded")
    }

    pub fn golem(&self) -> Entity {
        self.game.golems()[0]
    }

    pub fn place(&mut self, actor: ActorHandle, transform: Transform) {
        self.render.set_transform(actor, transform);
    }

    pub fn transform(&self, actor: ActorHandle) -> Transform {
        self.render.transform(actor)
    }

    /// Starts recording every event of the given kinds.
    pub fn record(&mut self, kinds: &[GameEventKind]) {
        let world = self.game.world_mut();
        world.init_resource::<Recorded>();
        let owner = world.spawn_empty().id();
        let mut bus = world.resource_mut::<EventBus>();
        for &kind in kinds {
            bus.subscribe(kind, owner, |world, event| {
                world.resource_mut::<Recorded>().0.push(event.clone());
            });
        }
    }

    pub fn recorded(&self) -> Vec<GameEvent> {
        self.game
            .world()
            .get_resource::<Recorded>()
            .map(|recorded| recorded.0.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, event: &GameEvent) -> usize {
        self.recorded().iter().filter(|recorded| *recorded == event).count()
    }
}
