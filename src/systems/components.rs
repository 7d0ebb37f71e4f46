use bevy_ecs::resource::Resource;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seconds elapsed since the previous tick.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct DeltaTime(pub f32);

/// The single source of randomness for hit rolls and AI decisions.
#[derive(Resource, Debug, Clone)]
pub struct GameRng(SmallRng);

impl GameRng {
    /// Seeds deterministically when `seed` is given, from the thread RNG otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(SmallRng::seed_from_u64(seed)),
            None => Self(SmallRng::from_rng(&mut rand::rng())),
        }
    }

    /// Returns true with probability `chance`, clamped to `[0, 1]`.
    pub fn roll(&mut self, chance: f32) -> bool {
        self.0.random_bool(f64::from(chance.clamp(0.0, 1.0)))
    }

    /// A fair coin flip.
    pub fn coin(&mut self) -> bool {
        self.0.random_bool(0.5)
    }
}
