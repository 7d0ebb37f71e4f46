//! Timed sequences: scripted chains of waits, animations, motions and callbacks.
//!
//! A sequence holds its own progress cursor and is advanced by the
//! [`sequence_system`] once per tick. Callbacks run synchronously inside the tick
//! that reaches them. Controllers keep the [`SequenceId`] of anything they have in
//! flight and consult [`Sequencer::is_active`] to skip conflicting logic.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use bevy_ecs::{entity::Entity, resource::Resource, world::World};
use glam::Vec3;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::services::{ActorHandle, Clip, Services, Transform};
use crate::systems::DeltaTime;

/// A deferred action run against the world.
pub type Callback = Box<dyn FnOnce(&mut World) + Send + Sync>;

pub enum Step {
    /// Idle for the given number of seconds.
    Wait(f32),
    /// Start a one-shot clip and continue immediately.
    Play { actor: ActorHandle, clip: Clip, rate: f32 },
    /// Start a one-shot clip and wait until it has played through.
    Animate { actor: ActorHandle, clip: Clip, rate: f32 },
    /// Carry an actor along a parabolic arc from `from` to `to`, peaking `apex` above the straight line.
    Move {
        actor: ActorHandle,
        from: Vec3,
        to: Vec3,
        apex: f32,
        duration: f32,
    },
    Invoke(Callback),
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Wait(seconds) => f.debug_tuple("Wait").field(seconds).finish(),
            Step::Play { actor, clip, rate } => f
                .debug_struct("Play")
                .field("actor", actor)
                .field("clip", clip)
                .field("rate", rate)
                .finish(),
            Step::Animate { actor, clip, rate } => f
                .debug_struct("Animate")
                .field("actor", actor)
                .field("clip", clip)
                .field("rate", rate)
                .finish(),
            Step::Move { actor, from, to, .. } => f
                .debug_struct("Move")
                .field("actor", actor)
                .field("from", from)
                .field("to", to)
                .finish_non_exhaustive(),
            Step::Invoke(_) => f.write_str("Invoke"),
        }
    }
}

/// Position along a ballistic arc at progress `t` in `[0, 1]`.
pub fn arc_point(from: Vec3, to: Vec3, apex: f32, t: f32) -> Vec3 {
    let mut point = from.lerp(to, t);
    point.z += 4.0 * apex * t * (1.0 - t);
    point
}

#[derive(Debug)]
pub struct Sequence {
    name: &'static str,
    steps: VecDeque<Step>,
    /// Time spent in the current `Move` step.
    elapsed: f32,
}

impl Sequence {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: VecDeque::new(),
            elapsed: 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn wait(mut self, seconds: f32) -> Self {
        self.steps.push_back(Step::Wait(seconds));
        self
    }

    pub fn play(mut self, actor: ActorHandle, clip: Clip, rate: f32) -> Self {
        self.steps.push_back(Step::Play { actor, clip, rate });
        self
    }

    pub fn animate(mut self, actor: ActorHandle, clip: Clip, rate: f32) -> Self {
        self.steps.push_back(Step::Animate { actor, clip, rate });
        self
    }

    pub fn motion(mut self, actor: ActorHandle, from: Vec3, to: Vec3, apex: f32, duration: f32) -> Self {
        self.steps.push_back(Step::Move {
            actor,
            from,
            to,
            apex,
            duration,
        });
        self
    }

    pub fn then<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&mut World) + Send + Sync + 'static,
    {
        self.steps.push_back(Step::Invoke(Box::new(callback)));
        self
    }

    pub fn is_complete(&self) -> bool {
        self.steps.is_empty()
    }

    /// Advances by `dt` seconds. Returns true once every step has run, or if the
    /// sequence was cancelled by one of its own callbacks.
    fn advance(&mut self, id: SequenceId, world: &mut World, mut dt: f32) -> bool {
        while let Some(step) = self.steps.front_mut() {
            match step {
                Step::Wait(remaining) => {
                    if dt < *remaining {
                        *remaining -= dt;
                        return false;
                    }
                    dt -= *remaining;
                    self.steps.pop_front();
                }
                Step::Play { actor, clip, rate } => {
                    let (actor, clip, rate) = (*actor, *clip, *rate);
                    self.steps.pop_front();
                    world
                        .resource_mut::<Services>()
                        .render
                        .play_animation(actor, clip, rate, false);
                }
                Step::Animate { actor, clip, rate } => {
                    let (actor, clip, rate) = (*actor, *clip, *rate);
                    self.steps.pop_front();
                    world
                        .resource_mut::<Services>()
                        .render
                        .play_animation(actor, clip, rate, false);
                    self.steps
                        .push_front(Step::Wait(clip.duration() / rate.abs().max(f32::EPSILON)));
                }
                Step::Move {
                    actor,
                    from,
                    to,
                    apex,
                    duration,
                } => {
                    self.elapsed += dt;
                    let t = if *duration <= 0.0 {
                        1.0
                    } else {
                        (self.elapsed / *duration).min(1.0)
                    };
                    let position = arc_point(*from, *to, *apex, t);
                    let actor = *actor;
                    let mut services = world.resource_mut::<Services>();
                    let heading = services.render.transform(actor).heading;
                    services.render.set_transform(actor, Transform::new(position, heading));

                    if t < 1.0 {
                        return false;
                    }
                    dt = (self.elapsed - duration.max(0.0)).max(0.0);
                    self.elapsed = 0.0;
                    self.steps.pop_front();
                }
                Step::Invoke(_) => {
                    if let Some(Step::Invoke(callback)) = self.steps.pop_front() {
                        callback(world);
                    }
                    if !world.resource::<Sequencer>().is_active(id) {
                        trace!(sequence = self.name, "Sequence cancelled by its own callback");
                        return true;
                    }
                }
            }
        }
        true
    }

    /// Runs every remaining callback immediately, skipping waits and animations.
    /// Motions snap to their end point.
    fn finish(mut self, world: &mut World) {
        while let Some(step) = self.steps.pop_front() {
            match step {
                Step::Invoke(callback) => callback(world),
                Step::Move { actor, to, .. } => {
                    let mut services = world.resource_mut::<Services>();
                    let heading = services.render.transform(actor).heading;
                    services.render.set_transform(actor, Transform::new(to, heading));
                }
                Step::Wait(_) | Step::Play { .. } | Step::Animate { .. } => {}
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceId(u64);

#[derive(Debug)]
struct Running {
    owner: Entity,
    /// `None` while the sequence is being advanced.
    sequence: Option<Sequence>,
}

/// Owns every sequence in flight.
#[derive(Resource, Debug, Default)]
pub struct Sequencer {
    running: BTreeMap<SequenceId, Running>,
    next_id: u64,
}

impl Sequencer {
    /// Whether the sequence is still in flight.
    pub fn is_active(&self, id: SequenceId) -> bool {
        self.running.contains_key(&id)
    }

    /// Whether the sequence has finished, been force-completed or been cancelled.
    pub fn is_complete(&self, id: SequenceId) -> bool {
        !self.is_active(id)
    }

    /// Convenience for controllers that store an optional handle.
    pub fn is_running(&self, id: Option<SequenceId>) -> bool {
        id.is_some_and(|id| self.is_active(id))
    }

    /// Abandons a sequence without running any of its remaining steps.
    pub fn cancel(&mut self, id: SequenceId) -> bool {
        let cancelled = self.running.remove(&id).is_some();
        if cancelled {
            trace!(?id, "Sequence cancelled");
        }
        cancelled
    }

    /// Abandons every sequence owned by `owner`.
    pub fn cancel_owned(&mut self, owner: Entity) -> usize {
        let before = self.running.len();
        self.running.retain(|_, running| running.owner != owner);
        before - self.running.len()
    }

    pub fn owned_by(&self, owner: Entity) -> SmallVec<[SequenceId; 4]> {
        self.running
            .iter()
            .filter(|(_, running)| running.owner == owner)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}

/// Starts `sequence` on behalf of `owner`. Leading steps that take no time (clip
/// starts, callbacks) run immediately, inside the caller's tick.
pub fn start(world: &mut World, owner: Entity, sequence: Sequence) -> SequenceId {
    let id = {
        let mut sequencer = world.resource_mut::<Sequencer>();
        let id = SequenceId(sequencer.next_id);
        sequencer.next_id += 1;
        sequencer.running.insert(id, Running { owner, sequence: None });
        id
    };
    debug!(?id, name = sequence.name, ?owner, "Sequence started");
    drive(world, id, sequence, 0.0);
    id
}

/// Advances a detached sequence and puts it back if it is still in flight.
fn drive(world: &mut World, id: SequenceId, mut sequence: Sequence, dt: f32) {
    let done = sequence.advance(id, world, dt);
    let mut sequencer = world.resource_mut::<Sequencer>();
    if done {
        if sequencer.running.remove(&id).is_some() {
            trace!(?id, name = sequence.name, "Sequence complete");
        }
    } else if let Some(running) = sequencer.running.get_mut(&id) {
        running.sequence = Some(sequence);
    }
}

/// Completes a sequence synchronously: remaining callbacks run now, in order.
/// Returns false if the sequence was not in flight.
pub fn force_complete(world: &mut World, id: SequenceId) -> bool {
    let Some(running) = world.resource_mut::<Sequencer>().running.remove(&id) else {
        return false;
    };
    // A sequence detached for advancing is completing on its own.
    if let Some(sequence) = running.sequence {
        debug!(?id, name = sequence.name, "Sequence force-completed");
        sequence.finish(world);
    }
    true
}

/// Force-completes every sequence owned by `owner`, oldest first.
pub fn force_complete_owned(world: &mut World, owner: Entity) -> usize {
    let ids = world.resource::<Sequencer>().owned_by(owner);
    ids.into_iter().filter(|id| force_complete(world, *id)).count()
}

/// Advances every sequence in flight by `dt` seconds.
pub fn tick(world: &mut World, dt: f32) {
    let ids: SmallVec<[SequenceId; 16]> = world.resource::<Sequencer>().running.keys().copied().collect();

    for id in ids {
        let sequence = world
            .resource_mut::<Sequencer>()
            .running
            .get_mut(&id)
            .and_then(|running| running.sequence.take());
        if let Some(sequence) = sequence {
            drive(world, id, sequence, dt);
        }
    }
}

pub fn sequence_system(world: &mut World) {
    let dt = world.resource::<DeltaTime>().0;
    tick(world, dt);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_peaks_halfway() {
        let from = Vec3::ZERO;
        let to = Vec3::new(0.0, 2.0, 0.0);
        assert_eq!(arc_point(from, to, 1.0, 0.0), from);
        assert_eq!(arc_point(from, to, 1.0, 1.0), to);
        assert_eq!(arc_point(from, to, 1.0, 0.5), Vec3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn builder_keeps_step_order() {
        let sequence = Sequence::new("test").wait(1.0).then(|_| {}).wait(2.0);
        assert_eq!(sequence.steps.len(), 3);
        assert!(matches!(sequence.steps[0], Step::Wait(w) if w == 1.0));
        assert!(matches!(sequence.steps[1], Step::Invoke(_)));
        assert!(!sequence.is_complete());
    }
}
