//! Golem enemies.
//!
//! A golem stands idle until the player walks into its field of view. From then on
//! [`golem_ai_system`] turns it towards the player every tick and picks between
//! walking, idling and attacking. Attacks and the hit flash are sequences owned by
//! the golem's entity.

use bevy_ecs::{component::Component, entity::Entity, world::World};
use glam::{Vec3, Vec4};
use smallvec::SmallVec;
use strum_macros::IntoStaticStr;
use tracing::{debug, trace};

use crate::actor::{ActorState, Health, StateMachine};
use crate::bus::{publish, EventBus};
use crate::config::GameConfig;
use crate::constants::{
    ATTACK_HEIGHT, GOLEM_ATTACK_RATE, GOLEM_ATTACK_REACH, HIT_FLASH_INTERVAL, HIT_FLASH_PULSES,
};
use crate::events::{GameEvent, GameEventKind};
use crate::sequence::{self, Sequence, SequenceId, Sequencer};
use crate::services::{ActorHandle, Clip, HitTarget, Music, Services, Sfx, Transform};
use crate::systems::player::Player;
use crate::systems::{DeltaTime, GameRng};
use crate::triggers::{ColliderTag, TriggerId, TriggerKind, TriggerRegistry};

/// Red color scale applied while a golem flashes after a hit.
const HIT_TINT: Vec4 = Vec4::new(1.0, 0.0, 0.0, 0.75);
const WALK_ANIMATION_RATE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum GolemState {
    Idle,
    Walk,
    Attack,
    Destroyed,
}

impl ActorState for GolemState {
    fn is_terminal(self) -> bool {
        self == GolemState::Destroyed
    }
}

#[derive(Component, Debug)]
pub struct Golem {
    actor: ActorHandle,
    fsm: StateMachine<GolemState>,
    health: Health,
    /// The player actor being pursued, once activated.
    tracked: Option<ActorHandle>,
    active: bool,
    /// Between `start_golem` and `stop_golem`.
    started: bool,
    view_trigger: TriggerId,
    attack: Option<SequenceId>,
    flash: Option<SequenceId>,
}

impl Golem {
    pub fn actor(&self) -> ActorHandle {
        self.actor
    }

    pub fn state(&self) -> GolemState {
        self.fsm.current()
    }

    pub fn health(&self) -> u8 {
        self.health.current()
    }

    pub fn tracked(&self) -> Option<ActorHandle> {
        self.tracked
    }

    /// Whether the AI loop is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the golem is in play and can be struck.
    pub fn is_present(&self) -> bool {
        self.started && self.fsm.current() != GolemState::Destroyed
    }

    pub fn view_trigger(&self) -> TriggerId {
        self.view_trigger
    }
}

/// Creates a dormant golem at `start`.
pub fn spawn_golem(world: &mut World, actor: ActorHandle, start: Transform, view_trigger: TriggerId) -> Entity {
    let max_health = world.resource::<GameConfig>().golem_max_health;
    world.resource_mut::<Services>().render.set_transform(actor, start);
    let entity = world
        .spawn(Golem {
            actor,
            fsm: StateMachine::new("golem", GolemState::Idle),
            health: Health::full(max_health),
            tracked: None,
            active: false,
            started: false,
            view_trigger,
            attack: None,
            flash: None,
        })
        .id();
    debug!(?entity, ?actor, "Golem spawned");
    entity
}

/// Registers the golem's field of view and subscriptions.
pub fn start_golem(world: &mut World, entity: Entity) {
    let Some((actor, view_trigger)) = world.get_mut::<Golem>(entity).map(|mut golem| {
        golem.started = true;
        (golem.actor, golem.view_trigger)
    }) else {
        return;
    };

    world
        .resource_mut::<TriggerRegistry>()
        .register(view_trigger, TriggerKind::EnemyView(entity));
    {
        let mut services = world.resource_mut::<Services>();
        services.render.set_visible(actor, true);
        services.render.play_animation(actor, Clip::GolemIdle, 1.0, true);
    }

    let mut bus = world.resource_mut::<EventBus>();
    bus.subscribe(GameEventKind::Trigger, entity, move |world, event| {
        if let GameEvent::Trigger(trigger) = event {
            if trigger.collider == ColliderTag::PlayerBody
                && trigger.kind == TriggerKind::EnemyView(entity)
                && trigger.is_enter()
            {
                publish(world, GameEvent::GolemSeesPlayer { golem: entity });
            }
        }
    });
    bus.subscribe(GameEventKind::GolemSeesPlayer, entity, move |world, event| {
        if *event == (GameEvent::GolemSeesPlayer { golem: entity }) {
            let player = world.get_resource::<Player>().map(Player::actor);
            if let Some(player) = player {
                activate(world, entity, player);
            }
        }
    });
    bus.subscribe(GameEventKind::HitEnemy, entity, move |world, event| {
        if *event == (GameEvent::HitEnemy { enemy: entity }) {
            hit(world, entity);
        }
    });
}

/// Halts the golem and releases everything it registered. Safe to call twice.
pub fn stop_golem(world: &mut World, entity: Entity) {
    let Some(actor) = world.get_mut::<Golem>(entity).map(|mut golem| {
        golem.active = false;
        golem.started = false;
        golem.tracked = None;
        golem.actor
    }) else {
        return;
    };

    world.resource_mut::<EventBus>().unsubscribe_all(entity);
    sequence::force_complete_owned(world, entity);
    world.resource_mut::<TriggerRegistry>().unregister_owned(entity);
    let mut services = world.resource_mut::<Services>();
    services.collision.remove_hit_volume(HitTarget::Golem(entity));
    services.render.set_visible(actor, false);
}

/// Stops the golem and removes its entity.
pub fn despawn_golem(world: &mut World, entity: Entity) {
    stop_golem(world, entity);
    world.despawn(entity);
    debug!(?entity, "Golem despawned");
}

/// Starts pursuing `player`.
pub fn activate(world: &mut World, entity: Entity, player: ActorHandle) {
    {
        let Some(mut golem) = world.get_mut::<Golem>(entity) else {
            return;
        };
        if golem.active || golem.state() == GolemState::Destroyed {
            return;
        }
        golem.active = true;
        golem.tracked = Some(player);
    }

    let fade = world.resource::<GameConfig>().music_crossfade;
    world
        .resource_mut::<Services>()
        .audio
        .crossfade(Music::Ambient, Music::Fight, fade);
    debug!(?entity, "Golem activated");
}

/// Requests a state change, running the exit hook of the old state before the enter hook of the new one.
pub fn request_state(world: &mut World, entity: Entity, next: GolemState) {
    let Some(transition) = world.get_mut::<Golem>(entity).and_then(|mut golem| golem.fsm.request(next)) else {
        return;
    };
    exit_state(world, entity, transition.from);
    enter_state(world, entity, transition.to);
}

fn enter_state(world: &mut World, entity: Entity, state: GolemState) {
    let Some(actor) = world.get::<Golem>(entity).map(Golem::actor) else {
        return;
    };

    match state {
        GolemState::Idle => {
            world
                .resource_mut::<Services>()
                .render
                .play_animation(actor, Clip::GolemIdle, 1.0, true);
        }
        GolemState::Walk => {
            world
                .resource_mut::<Services>()
                .render
                .play_animation(actor, Clip::GolemWalk, WALK_ANIMATION_RATE, true);
        }
        GolemState::Attack => start_attack(world, entity, actor),
        GolemState::Destroyed => destroy(world, entity, actor),
    }
}

fn exit_state(world: &mut World, entity: Entity, state: GolemState) {
    if state != GolemState::Attack {
        return;
    }
    let stale = world.get_mut::<Golem>(entity).and_then(|mut golem| golem.attack.take());
    if let Some(id) = stale {
        world.resource_mut::<Sequencer>().cancel(id);
    }
}

/// Swings once; the blow is resolved partway through the animation.
fn start_attack(world: &mut World, entity: Entity, actor: ActorHandle) {
    let hit_delay = world.resource::<GameConfig>().golem_attack_hit_delay;
    let length = Clip::GolemAttack.duration() / GOLEM_ATTACK_RATE;

    let id = sequence::start(
        world,
        entity,
        Sequence::new("golem-attack")
            .play(actor, Clip::GolemAttack, GOLEM_ATTACK_RATE)
            .wait(hit_delay)
            .then(move |world| resolve_attack(world, entity))
            .wait((length - hit_delay).max(0.0))
            .then(move |world| {
                if world.get::<Golem>(entity).is_some_and(|golem| golem.state() == GolemState::Attack) {
                    request_state(world, entity, GolemState::Idle);
                }
            }),
    );
    if let Some(mut golem) = world.get_mut::<Golem>(entity) {
        golem.attack = Some(id);
    }
}

fn resolve_attack(world: &mut World, entity: Entity) {
    let Some(actor) = world
        .get::<Golem>(entity)
        .filter(|golem| golem.active)
        .map(Golem::actor)
    else {
        return;
    };

    let chance = world.resource::<GameConfig>().golem_hit_chance;
    let connects = {
        let services = world.resource::<Services>();
        let transform = services.render.transform(actor);
        let from = transform.position + Vec3::Z * ATTACK_HEIGHT;
        services
            .collision
            .segment_hits(from, from + transform.forward() * GOLEM_ATTACK_REACH)
            .contains(&HitTarget::Player)
    };
    if !connects {
        return;
    }

    let landed = world.resource_mut::<GameRng>().roll(chance);
    trace!(?entity, landed, "Golem blow");
    if landed {
        publish(world, GameEvent::HitPlayer);
    }
}

/// Takes one point of damage, flashing red, or crumbles when none is left.
pub fn hit(world: &mut World, entity: Entity) {
    let (health, actor, stale_flash) = {
        let Some(mut golem) = world.get_mut::<Golem>(entity) else {
            return;
        };
        if golem.state() == GolemState::Destroyed {
            return;
        }
        let health = golem.health.damage();
        (health, golem.actor, golem.flash.take())
    };
    debug!(?entity, health, "Golem hit");
    world.resource_mut::<Services>().audio.play_sfx(Sfx::GolemHit);

    if let Some(id) = stale_flash {
        sequence::force_complete(world, id);
    }

    if health == 0 {
        request_state(world, entity, GolemState::Destroyed);
        return;
    }

    let mut flash = Sequence::new("golem-hit-flash");
    for _ in 0..HIT_FLASH_PULSES {
        flash = flash
            .then(move |world| world.resource_mut::<Services>().render.set_tint(actor, Some(HIT_TINT)))
            .wait(HIT_FLASH_INTERVAL)
            .then(move |world| world.resource_mut::<Services>().render.set_tint(actor, None))
            .wait(HIT_FLASH_INTERVAL);
    }
    let id = sequence::start(world, entity, flash);
    if let Some(mut golem) = world.get_mut::<Golem>(entity) {
        golem.flash = Some(id);
    }
}

/// Enter hook of the terminal state: halts the AI and releases the golem's hooks.
fn destroy(world: &mut World, entity: Entity, actor: ActorHandle) {
    let was_active = {
        let Some(mut golem) = world.get_mut::<Golem>(entity) else {
            return;
        };
        let was_active = golem.active;
        golem.active = false;
        golem.tracked = None;
        was_active
    };

    world.resource_mut::<EventBus>().unsubscribe_all(entity);
    sequence::force_complete_owned(world, entity);
    world.resource_mut::<TriggerRegistry>().unregister_owned(entity);

    let fade = world.resource::<GameConfig>().music_crossfade;
    {
        let mut services = world.resource_mut::<Services>();
        services.render.play_animation(actor, Clip::GolemDestroyed, 1.0, false);
        services.audio.play_sfx(Sfx::GolemDestroyed);
        services.collision.remove_hit_volume(HitTarget::Golem(entity));
        if was_active {
            services.audio.crossfade(Music::Fight, Music::Ambient, fade);
        }
    }

    debug!(?entity, "Golem destroyed");
    publish(world, GameEvent::GolemDestroyed { golem: entity });
}

/// Per-tick AI of every active golem.
pub fn golem_ai_system(world: &mut World) {
    let dt = world.resource::<DeltaTime>().0;
    let active: SmallVec<[Entity; 4]> = world
        .query::<(Entity, &Golem)>()
        .iter(world)
        .filter(|(_, golem)| golem.active)
        .map(|(entity, _)| entity)
        .collect();

    for entity in active {
        think(world, entity, dt);
    }
}

fn think(world: &mut World, entity: Entity, dt: f32) {
    let Some((actor, target, attack)) = world
        .get::<Golem>(entity)
        .filter(|golem| golem.active)
        .and_then(|golem| golem.tracked.map(|target| (golem.actor, target, golem.attack)))
    else {
        return;
    };
    if world.resource::<Sequencer>().is_running(attack) {
        return;
    }

    let (near, speed) = {
        let config = world.resource::<GameConfig>();
        (config.golem_near_distance, config.golem_walk_speed)
    };

    let distance = {
        let mut services = world.resource_mut::<Services>();
        let target = services.render.transform(target).position;
        let mut transform = services.render.transform(actor);
        transform.look_at(target);
        let distance = transform.distance_to(target);
        if distance >= near {
            transform.position += transform.forward() * speed * dt;
        }
        services.render.set_transform(actor, transform);
        distance
    };

    let next = if distance < near {
        if world.resource_mut::<GameRng>().coin() {
            GolemState::Attack
        } else {
            GolemState::Idle
        }
    } else {
        GolemState::Walk
    };
    request_state(world, entity, next);
}
