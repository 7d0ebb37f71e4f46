//! The player controller.
//!
//! Locomotion is polled once per tick by [`player_update_system`]; everything else
//! (input, triggers, hits, fight mode) arrives over the bus. Scripted animations
//! (actions, jumps, death) run as sequences, and while one of them is in flight
//! the per-tick update leaves the player alone.

use bevy_ecs::{entity::Entity, resource::Resource, world::World};
use glam::Vec3;
use strum_macros::IntoStaticStr;
use tracing::{debug, info, trace};

use crate::actor::{ActorState, Health, StateMachine};
use crate::bus::{publish, EventBus};
use crate::config::GameConfig;
use crate::constants::{ATTACK_HEIGHT, PLAYER_ATTACK_REACH};
use crate::events::{GameEvent, GameEventKind, InputKey, Outcome};
use crate::sequence::{self, Sequence, SequenceId, Sequencer};
use crate::services::{ActorHandle, Clip, HitTarget, Services, Sfx, Transform};
use crate::systems::golem::Golem;
use crate::systems::input::InputIntent;
use crate::systems::{DeltaTime, GameRng};
use crate::triggers::{ColliderTag, Phase, TriggerEvent, TriggerKind};

/// Play rate of the run cycle; negative when backing up.
const RUN_ANIMATION_RATE: f32 = 3.0;
const ACTIVATE_ANIMATION_RATE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum PlayerState {
    Idle,
    Run,
    RunReverse,
    Action,
    Death,
    Jump,
    Hit,
    FightIdle,
    FightLeft,
    FightRight,
}

impl ActorState for PlayerState {
    fn is_terminal(self) -> bool {
        self == PlayerState::Death
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Locked onto an enemy: the player faces it and strafes.
    Fight,
}

impl Mode {
    fn rest_state(self) -> PlayerState {
        match self {
            Mode::Normal => PlayerState::Idle,
            Mode::Fight => PlayerState::FightIdle,
        }
    }
}

#[derive(Resource, Debug)]
pub struct Player {
    owner: Entity,
    actor: ActorHandle,
    fsm: StateMachine<PlayerState>,
    mode: Mode,
    health: Health,
    tracked_enemy: Option<Entity>,
    intent: InputIntent,
    /// The action key only fires again once the previous action is done.
    action_armed: bool,
    checkpoint: Transform,
    running: bool,
    game_over_sent: bool,
    action: Option<SequenceId>,
    motion: Option<SequenceId>,
    recovery: Option<SequenceId>,
}

impl Player {
    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn actor(&self) -> ActorHandle {
        self.actor
    }

    pub fn state(&self) -> PlayerState {
        self.fsm.current()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn health(&self) -> u8 {
        self.health.current()
    }

    pub fn tracked_enemy(&self) -> Option<Entity> {
        self.tracked_enemy
    }

    pub fn intent(&self) -> InputIntent {
        self.intent
    }

    pub fn checkpoint(&self) -> Transform {
        self.checkpoint
    }

    pub fn is_action_armed(&self) -> bool {
        self.action_armed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Places the player at `start`, installs its subscriptions and puts it in `Idle`.
pub fn spawn_player(world: &mut World, owner: Entity, actor: ActorHandle, start: Transform) {
    let max_health = world.resource::<GameConfig>().player_max_health;
    {
        let mut services = world.resource_mut::<Services>();
        services.render.set_transform(actor, start);
        services.render.set_visible(actor, true);
    }

    world.insert_resource(Player {
        owner,
        actor,
        fsm: StateMachine::new("player", PlayerState::Idle),
        mode: Mode::Normal,
        health: Health::full(max_health),
        tracked_enemy: None,
        intent: InputIntent::empty(),
        action_armed: true,
        checkpoint: start,
        running: true,
        game_over_sent: false,
        action: None,
        motion: None,
        recovery: None,
    });

    {
        let mut bus = world.resource_mut::<EventBus>();
        bus.subscribe(GameEventKind::Input, owner, |world, event| {
            if let GameEvent::Input { key, pressed } = event {
                on_input(world, *key, *pressed);
            }
        });
        bus.subscribe(GameEventKind::Trigger, owner, |world, event| {
            if let GameEvent::Trigger(trigger) = event {
                on_trigger(world, trigger);
            }
        });
        bus.subscribe(GameEventKind::ActionDone, owner, |world, _| on_action_done(world));
        bus.subscribe(GameEventKind::HitPlayer, owner, |world, _| hit(world));
        bus.subscribe(GameEventKind::GolemSeesPlayer, owner, |world, event| {
            if let GameEvent::GolemSeesPlayer { golem } = event {
                enter_fight_mode(world, *golem);
            }
        });
        bus.subscribe(GameEventKind::GolemDestroyed, owner, |world, event| {
            if let GameEvent::GolemDestroyed { golem } = event {
                if world.resource::<Player>().tracked_enemy == Some(*golem) {
                    exit_fight_mode(world);
                }
            }
        });
    }

    enter_state(world, PlayerState::Idle);
    publish(world, GameEvent::SetHealth(max_health));
    debug!(?owner, ?actor, "Player spawned");
}

/// Tears the player down: no handler or sequence callback acts on it afterwards.
pub fn despawn_player(world: &mut World) {
    let Some((owner, actor)) = world.get_resource_mut::<Player>().map(|mut player| {
        player.running = false;
        (player.owner, player.actor)
    }) else {
        return;
    };

    world.resource_mut::<EventBus>().unsubscribe_all(owner);
    sequence::force_complete_owned(world, owner);
    {
        let mut services = world.resource_mut::<Services>();
        services.collision.remove_hit_volume(HitTarget::Player);
        services.render.set_visible(actor, false);
    }
    world.remove_resource::<Player>();
    debug!(?owner, "Player despawned");
}

/// Requests a state change, running the exit hook of the old state before the enter hook of the new one.
pub fn request_state(world: &mut World, next: PlayerState) {
    let Some(transition) = world.resource_mut::<Player>().fsm.request(next) else {
        return;
    };
    exit_state(world, transition.from);
    enter_state(world, transition.to);
}

fn enter_state(world: &mut World, state: PlayerState) {
    let actor = world.resource::<Player>().actor;
    let looping = |world: &mut World, clip: Clip, rate: f32| {
        world
            .resource_mut::<Services>()
            .render
            .play_animation(actor, clip, rate, true);
    };

    match state {
        PlayerState::Idle => looping(world, Clip::Idle, 1.0),
        PlayerState::Run => looping(world, Clip::Run, RUN_ANIMATION_RATE),
        PlayerState::RunReverse => looping(world, Clip::Run, -RUN_ANIMATION_RATE),
        PlayerState::FightIdle => looping(world, Clip::FightIdle, 1.0),
        PlayerState::FightLeft => looping(world, Clip::FightLeft, 1.0),
        PlayerState::FightRight => looping(world, Clip::FightRight, 1.0),
        PlayerState::Action => start_action(world),
        PlayerState::Death => start_death(world),
        PlayerState::Jump => {
            world
                .resource_mut::<Services>()
                .render
                .play_animation(actor, Clip::Jump, 1.0, false);
        }
        PlayerState::Hit => {
            let mut services = world.resource_mut::<Services>();
            services.render.play_animation(actor, Clip::Hit, 1.0, false);
            services.audio.play_sfx(Sfx::PlayerHit);
        }
    }
}

fn exit_state(world: &mut World, state: PlayerState) {
    let stale = {
        let mut player = world.resource_mut::<Player>();
        match state {
            PlayerState::Action => {
                player.action_armed = true;
                player.action.take()
            }
            PlayerState::Jump => player.motion.take(),
            PlayerState::Death => player.recovery.take(),
            _ => None,
        }
    };

    if let Some(id) = stale {
        world.resource_mut::<Sequencer>().cancel(id);
    }
}

/// Whether a scripted animation currently owns the player.
pub fn is_locked(world: &World) -> bool {
    let player = world.resource::<Player>();
    if player.state() == PlayerState::Death {
        return true;
    }

    let sequencer = world.resource::<Sequencer>();
    if [player.action, player.motion, player.recovery]
        .into_iter()
        .any(|id| sequencer.is_running(id))
    {
        return true;
    }

    let render = &world.resource::<Services>().render;
    render.is_animation_playing(player.actor, Clip::Hit) || render.is_animation_playing(player.actor, Clip::Death)
}

/// Per-tick locomotion.
pub fn player_update_system(world: &mut World) {
    if !world.get_resource::<Player>().is_some_and(Player::is_running) {
        return;
    }
    if is_locked(world) {
        trace!("Player locked by a scripted animation");
        return;
    }

    let dt = world.resource::<DeltaTime>().0;
    match world.resource::<Player>().mode {
        Mode::Normal => normal_move(world, dt),
        Mode::Fight => fight_move(world, dt),
    }
}

fn normal_move(world: &mut World, dt: f32) {
    let (actor, intent) = {
        let player = world.resource::<Player>();
        (player.actor, player.intent)
    };
    let (turn_speed, run_speed) = {
        let config = world.resource::<GameConfig>();
        (config.player_turn_speed, config.player_run_speed)
    };

    let mut requested = PlayerState::Idle;
    {
        let mut services = world.resource_mut::<Services>();
        let mut transform = services.render.transform(actor);

        if intent.contains(InputIntent::LEFT) {
            transform.heading += turn_speed * dt;
            requested = PlayerState::Run;
        }
        if intent.contains(InputIntent::RIGHT) {
            transform.heading -= turn_speed * dt;
            requested = PlayerState::Run;
        }
        if intent.contains(InputIntent::FORWARD) {
            transform.position += transform.forward() * run_speed * dt;
            requested = PlayerState::Run;
        }
        if intent.contains(InputIntent::BACKWARD) {
            transform.position -= transform.forward() * run_speed * dt;
            requested = PlayerState::RunReverse;
        }

        services.render.set_transform(actor, transform);
    }
    request_state(world, requested);
}

fn fight_move(world: &mut World, dt: f32) {
    let (actor, intent, tracked) = {
        let player = world.resource::<Player>();
        (player.actor, player.intent, player.tracked_enemy)
    };
    let Some(enemy) = tracked.and_then(|entity| world.get::<Golem>(entity)).map(Golem::actor) else {
        exit_fight_mode(world);
        return;
    };
    let speed = world.resource::<GameConfig>().player_fight_speed;

    let requested = {
        let mut services = world.resource_mut::<Services>();
        let mut transform = services.render.transform(actor);
        transform.look_at(services.render.transform(enemy).position);

        let (requested, step) = if intent.contains(InputIntent::LEFT) {
            (PlayerState::FightLeft, -transform.right())
        } else if intent.contains(InputIntent::RIGHT) {
            (PlayerState::FightRight, transform.right())
        } else if intent.contains(InputIntent::FORWARD) {
            (PlayerState::Run, transform.forward())
        } else if intent.contains(InputIntent::BACKWARD) {
            (PlayerState::RunReverse, -transform.forward())
        } else {
            (PlayerState::FightIdle, Vec3::ZERO)
        };
        transform.position += step * speed * dt;
        services.render.set_transform(actor, transform);
        requested
    };
    request_state(world, requested);
}

fn on_input(world: &mut World, key: InputKey, pressed: bool) {
    {
        let mut player = world.resource_mut::<Player>();
        player.intent.set(key.into(), pressed);
    }
    if key == InputKey::Act && pressed {
        try_action(world);
    }
}

fn on_trigger(world: &mut World, trigger: &TriggerEvent) {
    match (trigger.collider, trigger.kind, trigger.phase) {
        (ColliderTag::PlayerJumpProbe, TriggerKind::Ledge, Phase::Exit) => jump(world),
        (ColliderTag::PlayerBody, TriggerKind::DeathZone, Phase::Enter) => die(world),
        (ColliderTag::PlayerBody, TriggerKind::SafeGround, Phase::Enter) => record_checkpoint(world),
        _ => {}
    }
}

fn try_action(world: &mut World) {
    if !world.resource::<Player>().action_armed || is_locked(world) {
        trace!("Action ignored");
        return;
    }
    request_state(world, PlayerState::Action);
}

/// Interacts with the world in normal mode, swings at the tracked enemy in fight mode.
fn start_action(world: &mut World) {
    let (owner, actor, mode) = {
        let mut player = world.resource_mut::<Player>();
        player.action_armed = false;
        (player.owner, player.actor, player.mode)
    };

    let script = match mode {
        Mode::Normal => Sequence::new("player-activate")
            .animate(actor, Clip::Activate, ACTIVATE_ANIMATION_RATE)
            .then(finish_action),
        Mode::Fight => {
            let hit_delay = world.resource::<GameConfig>().player_attack_hit_delay;
            world.resource_mut::<Services>().audio.play_sfx(Sfx::Swing);
            Sequence::new("player-attack")
                .play(actor, Clip::FightAttack, 1.0)
                .wait(hit_delay)
                .then(resolve_attack)
                .wait((Clip::FightAttack.duration() - hit_delay).max(0.0))
                .then(finish_action)
        }
    };

    let id = sequence::start(world, owner, script);
    world.resource_mut::<Player>().action = Some(id);

    if mode == Mode::Normal {
        publish(world, GameEvent::PlayerActivate);
    }
}

fn finish_action(world: &mut World) {
    if world.get_resource::<Player>().is_some_and(Player::is_running) {
        publish(world, GameEvent::ActionDone);
    }
}

/// Casts the attack segment and rolls a hit for every golem it touches.
fn resolve_attack(world: &mut World) {
    let Some(actor) = world
        .get_resource::<Player>()
        .filter(|player| player.running)
        .map(Player::actor)
    else {
        return;
    };

    let chance = world.resource::<GameConfig>().player_hit_chance;
    let targets = {
        let services = world.resource::<Services>();
        let transform = services.render.transform(actor);
        let from = transform.position + Vec3::Z * ATTACK_HEIGHT;
        services
            .collision
            .segment_hits(from, from + transform.forward() * PLAYER_ATTACK_REACH)
    };

    for target in targets {
        let HitTarget::Golem(enemy) = target else {
            continue;
        };
        let landed = world.resource_mut::<GameRng>().roll(chance);
        trace!(?enemy, landed, "Player swing");
        if landed {
            publish(world, GameEvent::HitEnemy { enemy });
        }
    }
}

fn on_action_done(world: &mut World) {
    let (state, mode) = {
        let player = world.resource::<Player>();
        (player.state(), player.mode)
    };
    if state == PlayerState::Action {
        request_state(world, mode.rest_state());
    }
}

/// Takes one point of damage. Hits are ignored while dying.
pub fn hit(world: &mut World) {
    let (state, health) = {
        let mut player = world.resource_mut::<Player>();
        if !player.running || player.state() == PlayerState::Death {
            trace!("Hit ignored");
            return;
        }
        let state = player.state();
        (state, player.health.damage())
    };
    debug!(health, "Player hit");
    publish(world, GameEvent::SetHealth(health));

    if health == 0 {
        request_state(world, PlayerState::Death);
    } else if state == PlayerState::Jump {
        // Mid-air hits hurt but do not interrupt the jump.
        world.resource_mut::<Services>().audio.play_sfx(Sfx::PlayerHit);
    } else {
        request_state(world, PlayerState::Hit);
    }
}

/// Restores one point of health, up to the maximum. A dying player cannot be healed.
pub fn heal(world: &mut World) {
    let health = {
        let mut player = world.resource_mut::<Player>();
        if !player.running || player.state() == PlayerState::Death {
            trace!("Heal ignored");
            return;
        }
        player.health.heal()
    };
    publish(world, GameEvent::SetHealth(health));
}

/// Environmental death (spikes, falling): costs one point and always ends in `Death`.
pub fn die(world: &mut World) {
    let health = {
        let mut player = world.resource_mut::<Player>();
        if !player.running || player.state() == PlayerState::Death {
            return;
        }
        player.health.damage()
    };
    debug!(health, "Player died");
    publish(world, GameEvent::SetHealth(health));
    request_state(world, PlayerState::Death);
}

fn start_death(world: &mut World) {
    let (owner, actor) = {
        let player = world.resource::<Player>();
        (player.owner, player.actor)
    };
    let delay = world.resource::<GameConfig>().death_delay;
    world
        .resource_mut::<Services>()
        .render
        .play_animation(actor, Clip::Death, 1.0, false);

    let id = sequence::start(world, owner, Sequence::new("player-death").wait(delay).then(finish_death));
    world.resource_mut::<Player>().recovery = Some(id);
}

/// Ends the game when no health is left, otherwise respawns at the last checkpoint.
fn finish_death(world: &mut World) {
    let Some(player) = world.get_resource::<Player>().filter(|player| player.running) else {
        return;
    };

    if player.health.is_depleted() {
        if player.game_over_sent {
            return;
        }
        world.resource_mut::<Player>().game_over_sent = true;
        info!("Player has no health left");
        publish(world, GameEvent::GameOver(Outcome::Lose));
        return;
    }

    let rest = player.mode.rest_state();
    reset_player_pos(world);
    request_state(world, rest);
}

/// Moves the player back to the last safe-ground checkpoint.
pub fn reset_player_pos(world: &mut World) {
    let (actor, checkpoint) = {
        let player = world.resource::<Player>();
        (player.actor, player.checkpoint)
    };
    world.resource_mut::<Services>().render.set_transform(actor, checkpoint);
    debug!(position = ?checkpoint.position, "Player reset to checkpoint");
}

fn record_checkpoint(world: &mut World) {
    let actor = world.resource::<Player>().actor;
    let transform = world.resource::<Services>().render.transform(actor);
    world.resource_mut::<Player>().checkpoint = transform;
    trace!(position = ?transform.position, "Checkpoint recorded");
}

/// Leaps off a ledge: a ballistic arc to a point ahead, landing on whatever ground is there.
pub fn jump(world: &mut World) {
    let (owner, actor, state) = {
        let player = world.resource::<Player>();
        (player.owner, player.actor, player.state())
    };
    if state != PlayerState::Run || is_locked(world) {
        trace!(?state, "Jump ignored");
        return;
    }

    let (distance, height, duration) = {
        let config = world.resource::<GameConfig>();
        (config.jump_distance, config.jump_height, config.jump_duration)
    };
    let (from, to, solid) = {
        let services = world.resource::<Services>();
        let transform = services.render.transform(actor);
        let target = transform.position + transform.forward() * distance;
        let ground = services.collision.ground_height(target);
        let landing = Vec3::new(target.x, target.y, ground.unwrap_or(transform.position.z));
        (transform.position, landing, ground.is_some())
    };

    request_state(world, PlayerState::Jump);
    let id = sequence::start(
        world,
        owner,
        Sequence::new("player-jump")
            .motion(actor, from, to, height, duration)
            .then(move |world| land(world, solid)),
    );
    world.resource_mut::<Player>().motion = Some(id);
    debug!(?from, ?to, "Player jumped");
}

fn land(world: &mut World, solid: bool) {
    let Some(player) = world.get_resource::<Player>().filter(|player| player.running) else {
        return;
    };
    if player.state() != PlayerState::Jump {
        return;
    }

    if solid {
        let rest = player.mode.rest_state();
        request_state(world, rest);
    } else {
        die(world);
    }
}

/// Locks onto `enemy`.
pub fn enter_fight_mode(world: &mut World, enemy: Entity) {
    let state = {
        let mut player = world.resource_mut::<Player>();
        if !player.running || player.mode == Mode::Fight {
            return;
        }
        player.mode = Mode::Fight;
        player.tracked_enemy = Some(enemy);
        player.state()
    };
    debug!(?enemy, "Entering fight mode");
    publish(world, GameEvent::EnterFightMode { enemy });

    if matches!(state, PlayerState::Idle | PlayerState::Run | PlayerState::RunReverse) {
        request_state(world, PlayerState::FightIdle);
    }
}

/// Drops the enemy lock and returns to normal locomotion.
pub fn exit_fight_mode(world: &mut World) {
    let state = {
        let mut player = world.resource_mut::<Player>();
        if player.mode != Mode::Fight {
            return;
        }
        player.mode = Mode::Normal;
        player.tracked_enemy = None;
        player.state()
    };
    debug!("Leaving fight mode");
    publish(world, GameEvent::ExitFightMode);

    if matches!(
        state,
        PlayerState::FightIdle | PlayerState::FightLeft | PlayerState::FightRight
    ) {
        request_state(world, PlayerState::Idle);
    }
}
