//! The world orchestrator: builds the simulation, wires every controller to the
//! bus and owns the lifecycle.

use bevy_ecs::{
    entity::Entity,
    schedule::{ExecutorKind, IntoScheduleConfigs, Schedule},
    world::World,
};
use tracing::{debug, info, trace, warn};

use crate::bus::{publish, EventBus};
use crate::config::GameConfig;
use crate::error::GameResult;
use crate::events::{GameEvent, Outcome};
use crate::formatter;
use crate::level::{self, Level, LevelLayout};
use crate::sequence::{sequence_system, Sequencer};
use crate::services::{ActorHandle, Services, Transform};
use crate::systems::collision::hit_volume_system;
use crate::systems::golem::{self, golem_ai_system, Golem};
use crate::systems::hud::{self, HudState};
use crate::systems::input::Bindings;
use crate::systems::player::{self, player_update_system, Player};
use crate::systems::{animation_clock_system, DeltaTime, GameRng};
use crate::triggers::{trigger_system, TriggerRegistry};

/// The `Game` struct is the main entry point of the gameplay core.
///
/// Construction loads the level and spawns its golems; [`Game::start`] brings the
/// player in and installs every subscription; [`Game::tick`] advances the
/// simulation by one frame.
pub struct Game {
    world: World,
    schedule: Schedule,
    player_owner: Entity,
    player_actor: ActorHandle,
    player_start: Transform,
    hud_owner: Entity,
    golems: Vec<Entity>,
    started: bool,
}

impl Game {
    pub fn new(mut services: Services, config: GameConfig, layout: LevelLayout) -> GameResult<Game> {
        let mut world = World::default();

        let level_owner = world.spawn_empty().id();
        let level = Level::from_layout(&layout, level_owner, services.render.as_mut())?;
        let player_actor = services.render.load_actor(layout.player_actor);
        let golem_actors: Vec<_> = layout
            .golems
            .iter()
            .map(|spawn| services.render.load_actor(spawn.actor))
            .collect();

        let mut triggers = TriggerRegistry::default();
        for (id, kind) in &layout.triggers {
            triggers.register(*id, *kind);
        }

        world.insert_resource(GameRng::new(config.seed));
        world.insert_resource(config);
        world.insert_resource(DeltaTime::default());
        world.insert_resource(EventBus::default());
        world.insert_resource(triggers);
        world.insert_resource(Sequencer::default());
        world.insert_resource(Bindings::default());
        world.insert_resource(HudState::default());
        world.insert_resource(services);
        world.insert_resource(level);

        let mut golems = Vec::with_capacity(layout.golems.len());
        for (spawn, actor) in layout.golems.iter().zip(golem_actors) {
            let entity = golem::spawn_golem(&mut world, actor, spawn.start, spawn.view_trigger);
            if let Some(door) = spawn.guards {
                level::bind_guardian(&mut world, door, entity)?;
            }
            golems.push(entity);
        }

        let player_owner = world.spawn_empty().id();
        let hud_owner = world.spawn_empty().id();

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems(
            (
                trigger_system,
                player_update_system,
                golem_ai_system,
                sequence_system,
                animation_clock_system,
                hit_volume_system,
            )
                .chain(),
        );

        debug!(level = layout.name, golems = golems.len(), "Game built");
        Ok(Game {
            world,
            schedule,
            player_owner,
            player_actor,
            player_start: layout.player_start,
            hud_owner,
            golems,
            started: false,
        })
    }

    /// Brings the player into the level and installs every subscription.
    pub fn start(&mut self) {
        if self.started {
            warn!("Game already started");
            return;
        }

        level::start_level(&mut self.world);
        hud::start_hud(&mut self.world, self.hud_owner);
        player::spawn_player(&mut self.world, self.player_owner, self.player_actor, self.player_start);
        for &entity in &self.golems {
            golem::start_golem(&mut self.world, entity);
        }

        self.started = true;
        info!("Game started");
    }

    /// Tears every controller down. No handler fires for a stopped controller.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }

        player::despawn_player(&mut self.world);
        for &entity in &self.golems {
            golem::stop_golem(&mut self.world, entity);
        }
        level::stop_level(&mut self.world);
        hud::stop_hud(&mut self.world, self.hud_owner);

        self.started = false;
        info!("Game stopped");
    }

    /// Stops the game and removes the golems for good.
    pub fn cleanup(&mut self) {
        self.stop();
        for entity in self.golems.drain(..) {
            golem::despawn_golem(&mut self.world, entity);
        }
    }

    /// Advances the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.world.resource_mut::<DeltaTime>().0 = dt;
        self.schedule.run(&mut self.world);
        formatter::increment_tick();
    }

    /// Publishes an event on the bus, as an external adapter would.
    pub fn send(&mut self, event: GameEvent) {
        publish(&mut self.world, event);
    }

    /// Forwards a physical key press or release. Returns false for unbound keys.
    pub fn key(&mut self, name: &str, pressed: bool) -> bool {
        let Some(key) = self.world.resource::<Bindings>().resolve(name) else {
            trace!(name, "Unbound key");
            return false;
        };
        publish(&mut self.world, GameEvent::Input { key, pressed });
        true
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.world.resource::<HudState>().outcome
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn player(&self) -> Option<&Player> {
        self.world.get_resource::<Player>()
    }

    pub fn golems(&self) -> &[Entity] {
        &self.golems
    }

    pub fn golem(&self, entity: Entity) -> Option<&Golem> {
        self.world.get::<Golem>(entity)
    }

    pub fn level(&self) -> &Level {
        self.world.resource::<Level>()
    }

    pub fn hud(&self) -> &HudState {
        self.world.resource::<HudState>()
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.stop();
    }
}
