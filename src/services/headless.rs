//! In-memory collaborators for running the core without a window.
//!
//! Each service is a cheap handle around shared state, so the driver (or a test)
//! can keep a clone after moving the original into [`Services`](super::Services)
//! and inspect what the core asked for.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Vec3, Vec4};
use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::trace;

use super::{ActorHandle, AudioService, Clip, CollisionService, HitTarget, Music, RenderService, Sfx, Transform};
use crate::level::DoorId;
use crate::triggers::{ColliderTag, Overlap, Phase, TriggerId};

#[derive(Debug, Default)]
struct ActorRecord {
    name: String,
    transform: Transform,
    visible: bool,
    tint: Option<Vec4>,
    looping: Option<Clip>,
    /// Remaining play time of one-shot clips.
    one_shots: HashMap<Clip, f32>,
}

#[derive(Debug, Default)]
struct RenderState {
    actors: Vec<ActorRecord>,
    played: Vec<(ActorHandle, Clip)>,
}

impl RenderState {
    fn actor(&mut self, handle: ActorHandle) -> Option<&mut ActorRecord> {
        self.actors.get_mut(handle.0 as usize)
    }
}

/// Renderer that tracks transforms and clip timing without drawing anything.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    state: Arc<Mutex<RenderState>>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a previously loaded actor by name.
    pub fn handle(&self, name: &str) -> Option<ActorHandle> {
        let state = self.state.lock();
        state
            .actors
            .iter()
            .position(|actor| actor.name == name)
            .map(|index| ActorHandle(index as u32))
    }

    /// Every clip started so far, in order.
    pub fn played(&self) -> Vec<(ActorHandle, Clip)> {
        self.state.lock().played.clone()
    }

    /// Clips started on a single actor, in order.
    pub fn played_by(&self, actor: ActorHandle) -> Vec<Clip> {
        self.state
            .lock()
            .played
            .iter()
            .filter(|(handle, _)| *handle == actor)
            .map(|(_, clip)| *clip)
            .collect()
    }

    pub fn looping(&self, actor: ActorHandle) -> Option<Clip> {
        self.state.lock().actor(actor).and_then(|record| record.looping)
    }

    pub fn is_visible(&self, actor: ActorHandle) -> bool {
        self.state.lock().actor(actor).is_some_and(|record| record.visible)
    }

    pub fn tint(&self, actor: ActorHandle) -> Option<Vec4> {
        self.state.lock().actor(actor).and_then(|record| record.tint)
    }
}

impl RenderService for HeadlessRenderer {
    fn load_actor(&mut self, name: &str) -> ActorHandle {
        let mut state = self.state.lock();
        let handle = ActorHandle(state.actors.len() as u32);
        state.actors.push(ActorRecord {
            name: name.to_string(),
            visible: true,
            ..Default::default()
        });
        trace!(name, ?handle, "Loaded actor");
        handle
    }

    fn play_animation(&mut self, actor: ActorHandle, clip: Clip, rate: f32, looping: bool) {
        let mut state = self.state.lock();
        state.played.push((actor, clip));
        let Some(record) = state.actor(actor) else {
            return;
        };
        if looping {
            record.looping = Some(clip);
            record.one_shots.clear();
        } else {
            record.looping = None;
            record.one_shots.insert(clip, clip.duration() / rate.abs().max(f32::EPSILON));
        }
    }

    fn is_animation_playing(&self, actor: ActorHandle, clip: Clip) -> bool {
        let mut state = self.state.lock();
        state
            .actor(actor)
            .is_some_and(|record| record.looping == Some(clip) || record.one_shots.contains_key(&clip))
    }

    fn transform(&self, actor: ActorHandle) -> Transform {
        let mut state = self.state.lock();
        state.actor(actor).map(|record| record.transform).unwrap_or_default()
    }

    fn set_transform(&mut self, actor: ActorHandle, transform: Transform) {
        if let Some(record) = self.state.lock().actor(actor) {
            record.transform = transform;
        }
    }

    fn set_visible(&mut self, actor: ActorHandle, visible: bool) {
        if let Some(record) = self.state.lock().actor(actor) {
            record.visible = visible;
        }
    }

    fn set_tint(&mut self, actor: ActorHandle, tint: Option<Vec4>) {
        if let Some(record) = self.state.lock().actor(actor) {
            record.tint = tint;
        }
    }

    fn advance(&mut self, dt: f32) {
        let mut state = self.state.lock();
        for record in state.actors.iter_mut() {
            record.one_shots.retain(|_, remaining| {
                *remaining -= dt;
                *remaining > 0.0
            });
        }
    }
}

/// A request the core made of the audio collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCall {
    Sfx(Sfx),
    Music { music: Music, looping: bool },
    Crossfade { from: Music, to: Music, duration: f32 },
}

/// Audio sink that only records requests.
#[derive(Debug, Clone, Default)]
pub struct HeadlessAudio {
    calls: Arc<Mutex<Vec<AudioCall>>>,
}

impl HeadlessAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().clone()
    }

    pub fn sfx_count(&self, sfx: Sfx) -> usize {
        self.calls.lock().iter().filter(|call| **call == AudioCall::Sfx(sfx)).count()
    }
}

impl AudioService for HeadlessAudio {
    fn play_sfx(&mut self, sfx: Sfx) {
        self.calls.lock().push(AudioCall::Sfx(sfx));
    }

    fn play_music(&mut self, music: Music, looping: bool) {
        self.calls.lock().push(AudioCall::Music { music, looping });
    }

    fn crossfade(&mut self, from: Music, to: Music, duration: f32) {
        self.calls.lock().push(AudioCall::Crossfade { from, to, duration });
    }
}

#[derive(Debug, Default)]
struct CollisionState {
    pending: HashMap<ColliderTag, Vec<Overlap>>,
    volumes: Vec<(HitTarget, Vec3, f32)>,
    passable: Vec<DoorId>,
    ground: f32,
    pits: Vec<(Vec3, f32)>,
}

/// Collision collaborator whose trigger overlaps are scripted by the caller.
///
/// Hit volumes are spheres and the ground is a flat plane with optional circular pits.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCollision {
    state: Arc<Mutex<CollisionState>>,
}

impl ScriptedCollision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an overlap to be reported on the next drain for `collider`.
    pub fn push(&self, collider: ColliderTag, trigger: TriggerId, phase: Phase) {
        self.state
            .lock()
            .pending
            .entry(collider)
            .or_default()
            .push(Overlap { trigger, phase });
    }

    /// Queues an enter overlap; the collider stays inside until a matching exit.
    pub fn enter(&self, collider: ColliderTag, trigger: TriggerId) {
        self.push(collider, trigger, Phase::Enter);
    }

    pub fn exit(&self, collider: ColliderTag, trigger: TriggerId) {
        self.push(collider, trigger, Phase::Exit);
    }

    pub fn is_passable(&self, door: DoorId) -> bool {
        self.state.lock().passable.contains(&door)
    }

    pub fn hit_volume(&self, target: HitTarget) -> Option<(Vec3, f32)> {
        self.state
            .lock()
            .volumes
            .iter()
            .find(|(t, _, _)| *t == target)
            .map(|(_, center, radius)| (*center, *radius))
    }

    pub fn add_pit(&self, center: Vec3, radius: f32) {
        self.state.lock().pits.push((center, radius));
    }
}

/// Shortest distance between `point` and the segment `from`-`to`.
fn segment_distance(point: Vec3, from: Vec3, to: Vec3) -> f32 {
    let segment = to - from;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(from);
    }
    let t = ((point - from).dot(segment) / length_squared).clamp(0.0, 1.0);
    point.distance(from + segment * t)
}

impl CollisionService for ScriptedCollision {
    fn drain_overlaps(&mut self, collider: ColliderTag) -> Vec<Overlap> {
        self.state.lock().pending.remove(&collider).unwrap_or_default()
    }

    fn segment_hits(&self, from: Vec3, to: Vec3) -> SmallVec<[HitTarget; 4]> {
        self.state
            .lock()
            .volumes
            .iter()
            .filter(|(_, center, radius)| segment_distance(*center, from, to) <= *radius)
            .map(|(target, _, _)| *target)
            .collect()
    }

    fn set_hit_volume(&mut self, target: HitTarget, center: Vec3, radius: f32) {
        let mut state = self.state.lock();
        match state.volumes.iter_mut().find(|(t, _, _)| *t == target) {
            Some(volume) => *volume = (target, center, radius),
            None => state.volumes.push((target, center, radius)),
        }
    }

    fn remove_hit_volume(&mut self, target: HitTarget) {
        self.state.lock().volumes.retain(|(t, _, _)| *t != target);
    }

    fn set_passable(&mut self, door: DoorId) {
        let mut state = self.state.lock();
        if !state.passable.contains(&door) {
            state.passable.push(door);
        }
    }

    fn ground_height(&self, at: Vec3) -> Option<f32> {
        let state = self.state.lock();
        let over_pit = state
            .pits
            .iter()
            .any(|(center, radius)| (at - *center).truncate().length() <= *radius);
        (!over_pit).then_some(state.ground)
    }
}
