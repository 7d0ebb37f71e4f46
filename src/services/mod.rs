//! Narrow interfaces to the collaborators the gameplay core drives but does not own.
//!
//! Rendering, audio and collision detection are injected into the [`World`](bevy_ecs::world::World)
//! as a single [`Services`] resource when a [`Game`](crate::game::Game) is built, instead of
//! being reached through ambient globals.

use bevy_ecs::{entity::Entity, resource::Resource};
use glam::{Vec3, Vec4};
use smallvec::SmallVec;
use strum_macros::{EnumIter, IntoStaticStr};

use crate::level::DoorId;
use crate::triggers::{ColliderTag, Overlap};

pub mod headless;

/// Opaque handle to a loaded actor or animated prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorHandle(pub u32);

/// Position plus heading (degrees around the up axis) of an actor.
///
/// A heading of zero faces +Y; positive headings turn counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec3,
    pub heading: f32,
}

impl Transform {
    pub fn new(position: Vec3, heading: f32) -> Self {
        Self { position, heading }
    }

    /// Unit vector the actor is facing, on the ground plane.
    pub fn forward(&self) -> Vec3 {
        let (sin, cos) = self.heading.to_radians().sin_cos();
        Vec3::new(-sin, cos, 0.0)
    }

    /// Unit vector to the actor's right, on the ground plane.
    pub fn right(&self) -> Vec3 {
        let (sin, cos) = self.heading.to_radians().sin_cos();
        Vec3::new(cos, sin, 0.0)
    }

    /// Turns the actor to face `target`, ignoring height. Does nothing if the target is directly above or below.
    pub fn look_at(&mut self, target: Vec3) {
        let delta = target - self.position;
        if delta.x.abs() <= f32::EPSILON && delta.y.abs() <= f32::EPSILON {
            return;
        }
        self.heading = (-delta.x).atan2(delta.y).to_degrees();
    }

    /// Planar distance to another point.
    pub fn distance_to(&self, target: Vec3) -> f32 {
        (target - self.position).truncate().length()
    }
}

/// Animation clips known to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
pub enum Clip {
    Idle,
    Run,
    Activate,
    Death,
    Jump,
    Hit,
    FightAttack,
    FightIdle,
    FightLeft,
    FightRight,
    GolemIdle,
    GolemWalk,
    GolemAttack,
    GolemDestroyed,
    SwitchActivate,
    ChestOpen,
    BoulderDoorOpen,
    WoodDoorOpen,
}

impl Clip {
    /// Length of the clip at a play rate of 1, in seconds.
    pub const fn duration(self) -> f32 {
        match self {
            Clip::Idle | Clip::FightIdle | Clip::GolemIdle => 2.0,
            Clip::Run | Clip::GolemWalk => 1.0,
            Clip::FightLeft | Clip::FightRight => 0.8,
            Clip::Activate => 1.2,
            Clip::Death => 2.0,
            Clip::Jump => 0.8,
            Clip::Hit => 0.6,
            Clip::FightAttack => 0.8,
            Clip::GolemAttack => 2.0,
            Clip::GolemDestroyed => 2.5,
            Clip::SwitchActivate => 1.0,
            Clip::ChestOpen => 1.5,
            Clip::BoulderDoorOpen => 2.0,
            Clip::WoodDoorOpen => 1.0,
        }
    }
}

/// One-shot sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
pub enum Sfx {
    SwitchClick,
    SwitchReset,
    DoorOpen,
    ChestOpen,
    KeyPickup,
    Locked,
    Swing,
    PlayerHit,
    GolemHit,
    GolemDestroyed,
}

/// Music tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
pub enum Music {
    Ambient,
    Fight,
}

/// Something that can be struck by an attack segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTarget {
    Player,
    Golem(Entity),
}

/// Rendering and animation collaborator.
pub trait RenderService: Send + Sync {
    fn load_actor(&mut self, name: &str) -> ActorHandle;
    fn play_animation(&mut self, actor: ActorHandle, clip: Clip, rate: f32, looping: bool);
    fn is_animation_playing(&self, actor: ActorHandle, clip: Clip) -> bool;
    fn transform(&self, actor: ActorHandle) -> Transform;
    fn set_transform(&mut self, actor: ActorHandle, transform: Transform);
    fn set_visible(&mut self, actor: ActorHandle, visible: bool);
    /// Applies (or with `None`, clears) a color scale on the actor.
    fn set_tint(&mut self, actor: ActorHandle, tint: Option<Vec4>);
    /// Advances animation clocks; called once per tick.
    fn advance(&mut self, _dt: f32) {}
}

/// Audio collaborator.
pub trait AudioService: Send + Sync {
    fn play_sfx(&mut self, sfx: Sfx);
    fn play_music(&mut self, music: Music, looping: bool);
    fn crossfade(&mut self, from: Music, to: Music, duration: f32);
}

/// Collision collaborator.
pub trait CollisionService: Send + Sync {
    /// Returns and clears the trigger overlaps recorded for `collider` since the last call.
    fn drain_overlaps(&mut self, collider: ColliderTag) -> Vec<Overlap>;
    /// Hit volumes intersected by the segment `from`-`to`.
    fn segment_hits(&self, from: Vec3, to: Vec3) -> SmallVec<[HitTarget; 4]>;
    /// Places (or moves) the hit volume of `target`.
    fn set_hit_volume(&mut self, target: HitTarget, center: Vec3, radius: f32);
    fn remove_hit_volume(&mut self, target: HitTarget);
    /// Clears the blocking collision mask of a door so actors can pass through.
    fn set_passable(&mut self, door: DoorId);
    /// Height of walkable ground under `at`, or `None` over a pit.
    fn ground_height(&self, at: Vec3) -> Option<f32>;
}

/// The injected collaborator set.
#[derive(Resource)]
pub struct Services {
    pub render: Box<dyn RenderService>,
    pub audio: Box<dyn AudioService>,
    pub collision: Box<dyn CollisionService>,
}

impl Services {
    pub fn new(
        render: impl RenderService + 'static,
        audio: impl AudioService + 'static,
        collision: impl CollisionService + 'static,
    ) -> Self {
        Self {
            render: Box::new(render),
            audio: Box::new(audio),
            collision: Box::new(collision),
        }
    }
}
