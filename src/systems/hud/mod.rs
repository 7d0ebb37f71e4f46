//! The model behind the heads-up display.
//!
//! The core never draws anything; it only publishes HUD events. [`HudState`]
//! subscribes to them and keeps the latest values, which is what a GUI layer
//! renders from (hearts, key count, the "Action: E/Enter" hint, messages and
//! the game-over screen).

use bevy_ecs::{entity::Entity, resource::Resource, world::World};
use tracing::{debug, info};

use crate::bus::EventBus;
use crate::constants::PLAYER_MAX_HEALTH;
use crate::events::{GameEvent, GameEventKind, Outcome};

#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct HudState {
    pub health: u8,
    pub keys: u32,
    /// Most recent message shown to the player.
    pub message: Option<String>,
    /// Whether the action hint is visible.
    pub action_hint: bool,
    pub outcome: Option<Outcome>,
    /// Number of game-over notifications received.
    pub game_overs: u32,
}

impl Default for HudState {
    fn default() -> Self {
        Self {
            health: PLAYER_MAX_HEALTH,
            keys: 0,
            message: None,
            action_hint: false,
            outcome: None,
            game_overs: 0,
        }
    }
}

impl HudState {
    fn apply(&mut self, event: &GameEvent) {
        match event {
            GameEvent::SetHealth(health) => self.health = *health,
            GameEvent::UpdateKeyCount(keys) => self.keys = *keys,
            GameEvent::ShowMessage(text) => self.message = Some(text.clone()),
            GameEvent::ActionActive => self.action_hint = true,
            GameEvent::ActionDeactive => self.action_hint = false,
            GameEvent::GameOver(outcome) => {
                self.outcome = Some(*outcome);
                self.game_overs += 1;
                self.action_hint = false;
                info!(%outcome, "Game over");
            }
            _ => {}
        }
    }
}

const HUD_EVENTS: [GameEventKind; 6] = [
    GameEventKind::SetHealth,
    GameEventKind::UpdateKeyCount,
    GameEventKind::ShowMessage,
    GameEventKind::ActionActive,
    GameEventKind::ActionDeactive,
    GameEventKind::GameOver,
];

pub fn start_hud(world: &mut World, owner: Entity) {
    world.insert_resource(HudState::default());
    let mut bus = world.resource_mut::<EventBus>();
    for kind in HUD_EVENTS {
        bus.subscribe(kind, owner, |world, event| {
            if let Some(mut hud) = world.get_resource_mut::<HudState>() {
                hud.apply(event);
            }
        });
    }
    debug!(?owner, "HUD listening");
}

pub fn stop_hud(world: &mut World, owner: Entity) {
    world.resource_mut::<EventBus>().unsubscribe_all(owner);
    if let Some(mut hud) = world.get_resource_mut::<HudState>() {
        hud.action_hint = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_follows_focus_events() {
        let mut hud = HudState::default();
        hud.apply(&GameEvent::ActionActive);
        assert!(hud.action_hint);
        hud.apply(&GameEvent::ActionDeactive);
        assert!(!hud.action_hint);
    }

    #[test]
    fn game_over_hides_hint_and_counts() {
        let mut hud = HudState::default();
        hud.apply(&GameEvent::ActionActive);
        hud.apply(&GameEvent::GameOver(Outcome::Lose));
        assert_eq!(hud.outcome, Some(Outcome::Lose));
        assert_eq!(hud.game_overs, 1);
        assert!(!hud.action_hint);
    }
}
