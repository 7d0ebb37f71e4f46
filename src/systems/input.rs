use std::collections::HashMap;

use bevy_ecs::resource::Resource;
use bitflags::bitflags;

use crate::events::InputKey;

bitflags! {
    /// Logical keys currently held by the player.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputIntent: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const FORWARD = 1 << 2;
        const BACKWARD = 1 << 3;
        const CENTER = 1 << 4;
        const ACT = 1 << 5;
    }
}

impl From<InputKey> for InputIntent {
    fn from(key: InputKey) -> Self {
        match key {
            InputKey::Left => InputIntent::LEFT,
            InputKey::Right => InputIntent::RIGHT,
            InputKey::Forward => InputIntent::FORWARD,
            InputKey::Backward => InputIntent::BACKWARD,
            InputKey::Center => InputIntent::CENTER,
            InputKey::Act => InputIntent::ACT,
        }
    }
}

/// Maps physical key names to logical keys.
#[derive(Debug, Clone, Resource)]
pub struct Bindings {
    key_bindings: HashMap<&'static str, InputKey>,
}

impl Default for Bindings {
    fn default() -> Self {
        let key_bindings = HashMap::from([
            // Movement
            ("arrow_left", InputKey::Left),
            ("a", InputKey::Left),
            ("arrow_right", InputKey::Right),
            ("d", InputKey::Right),
            ("arrow_up", InputKey::Forward),
            ("w", InputKey::Forward),
            ("arrow_down", InputKey::Backward),
            ("s", InputKey::Backward),
            // Camera
            ("q", InputKey::Center),
            ("home", InputKey::Center),
            // Action
            ("e", InputKey::Act),
            ("enter", InputKey::Act),
        ]);

        Self { key_bindings }
    }
}

impl Bindings {
    pub fn resolve(&self, name: &str) -> Option<InputKey> {
        self.key_bindings.get(name).copied()
    }

    pub fn bind(&mut self, name: &'static str, key: InputKey) -> Option<InputKey> {
        self.key_bindings.insert(name, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_wasd_share_keys() {
        let bindings = Bindings::default();
        assert_eq!(bindings.resolve("arrow_up"), Some(InputKey::Forward));
        assert_eq!(bindings.resolve("w"), bindings.resolve("arrow_up"));
        assert_eq!(bindings.resolve("enter"), Some(InputKey::Act));
        assert_eq!(bindings.resolve("f12"), None);
    }

    #[test]
    fn intent_tracks_held_keys() {
        let mut intent = InputIntent::empty();
        intent.insert(InputKey::Forward.into());
        intent.insert(InputKey::Left.into());
        intent.remove(InputKey::Forward.into());
        assert_eq!(intent, InputIntent::LEFT);
    }
}
