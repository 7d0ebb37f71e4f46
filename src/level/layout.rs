//! Static description of a level: its props, how they are wired, and where actors start.

use glam::Vec3;

use super::{ChestId, ChestReward, DoorGate, DoorId, DoorKind, GroupId, Interactable, SwitchId, SwitchLink};
use crate::services::Transform;
use crate::triggers::{TriggerId, TriggerKind};

#[derive(Debug, Clone)]
pub struct DoorSpec {
    pub id: DoorId,
    pub actor: &'static str,
    pub kind: DoorKind,
    pub gate: DoorGate,
}

#[derive(Debug, Clone)]
pub struct SwitchSpec {
    pub id: SwitchId,
    pub actor: &'static str,
    pub link: SwitchLink,
}

#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub id: GroupId,
    pub sequence: Vec<SwitchId>,
    pub door: DoorId,
}

#[derive(Debug, Clone)]
pub struct ChestSpec {
    pub id: ChestId,
    pub actor: &'static str,
    pub reward: ChestReward,
}

#[derive(Debug, Clone)]
pub struct GolemSpawn {
    pub actor: &'static str,
    pub start: Transform,
    /// Id under which the golem's field of view is registered.
    pub view_trigger: TriggerId,
    /// Door that opens when this golem is destroyed.
    pub guards: Option<DoorId>,
}

#[derive(Debug, Clone)]
pub struct LevelLayout {
    pub name: &'static str,
    pub player_actor: &'static str,
    pub player_start: Transform,
    pub doors: Vec<DoorSpec>,
    pub switches: Vec<SwitchSpec>,
    pub groups: Vec<GroupSpec>,
    pub chests: Vec<ChestSpec>,
    /// Static trigger volumes; golem view fields are registered by the golems themselves.
    pub triggers: Vec<(TriggerId, TriggerKind)>,
    pub golems: Vec<GolemSpawn>,
}

/// Doors of the first level.
pub mod doors {
    use super::DoorId;

    pub const WOODEN: DoorId = DoorId(0);
    pub const BOULDER: DoorId = DoorId(1);
    pub const BOULDER_KEY: DoorId = DoorId(2);
    pub const BOULDER_LAST: DoorId = DoorId(3);
    pub const WOODEN_GUARDED: DoorId = DoorId(4);
}

/// Trigger ids of the first level.
pub mod triggers {
    use super::TriggerId;

    /// Interaction range of switch `n` is `SWITCH_BASE + n`.
    pub const SWITCH_BASE: u32 = 0;
    pub const CHEST_KEY: TriggerId = TriggerId(10);
    pub const CHEST_ARTIFACT: TriggerId = TriggerId(11);
    pub const KEY_DOOR: TriggerId = TriggerId(20);
    pub const GROUND: TriggerId = TriggerId(30);
    pub const CHECKPOINT: TriggerId = TriggerId(31);
    pub const SPIKES: TriggerId = TriggerId(40);
    pub const GOLEM_VIEW: TriggerId = TriggerId(50);

    pub const fn switch(n: u8) -> TriggerId {
        TriggerId(SWITCH_BASE + n as u32)
    }
}

impl LevelLayout {
    /// The temple: a wooden door behind switch 0, a boulder door behind an ordered
    /// group of four switches, a key door, a switch door and a door guarded by a golem.
    pub fn level01() -> Self {
        let order_group = GroupId(1);

        let doors = vec![
            DoorSpec {
                id: doors::WOODEN,
                actor: "Wooden_Door_Basic",
                kind: DoorKind::Wooden,
                gate: DoorGate::Switch,
            },
            DoorSpec {
                id: doors::BOULDER,
                actor: "Boulder_Door",
                kind: DoorKind::Boulder,
                gate: DoorGate::Switch,
            },
            DoorSpec {
                id: doors::BOULDER_KEY,
                actor: "Boulder_Door.001",
                kind: DoorKind::Boulder,
                gate: DoorGate::Key,
            },
            DoorSpec {
                id: doors::BOULDER_LAST,
                actor: "Boulder_Door.002",
                kind: DoorKind::Boulder,
                gate: DoorGate::Switch,
            },
            DoorSpec {
                id: doors::WOODEN_GUARDED,
                actor: "Wooden_Door_Basic.001",
                kind: DoorKind::Wooden,
                gate: DoorGate::Enemy(None),
            },
        ];

        let switch_actors = ["Switch.000", "Switch.001", "Switch.002", "Switch.003", "Switch.004", "Switch.005"];
        let switches = switch_actors
            .into_iter()
            .enumerate()
            .map(|(n, actor)| SwitchSpec {
                id: SwitchId(n as u8),
                actor,
                link: match n {
                    0 => SwitchLink::Door(doors::WOODEN),
                    1..=4 => SwitchLink::Group(order_group),
                    _ => SwitchLink::Door(doors::BOULDER_LAST),
                },
            })
            .collect();

        let groups = vec![GroupSpec {
            id: order_group,
            sequence: vec![SwitchId(2), SwitchId(3), SwitchId(4), SwitchId(1)],
            door: doors::BOULDER,
        }];

        let chests = vec![
            ChestSpec {
                id: ChestId(0),
                actor: "Box_long_looseLid.000",
                reward: ChestReward::Key,
            },
            ChestSpec {
                id: ChestId(1),
                actor: "Box_long_looseLid.001",
                reward: ChestReward::Artifact,
            },
        ];

        let mut level_triggers: Vec<(TriggerId, TriggerKind)> = (0..switch_actors.len() as u8)
            .map(|n| (triggers::switch(n), TriggerKind::Interact(Interactable::Switch(SwitchId(n)))))
            .collect();
        level_triggers.extend([
            (triggers::CHEST_KEY, TriggerKind::Interact(Interactable::Chest(ChestId(0)))),
            (triggers::CHEST_ARTIFACT, TriggerKind::Interact(Interactable::Chest(ChestId(1)))),
            (triggers::KEY_DOOR, TriggerKind::Interact(Interactable::KeyDoor(doors::BOULDER_KEY))),
            (triggers::GROUND, TriggerKind::Ledge),
            (triggers::CHECKPOINT, TriggerKind::SafeGround),
            (triggers::SPIKES, TriggerKind::DeathZone),
        ]);

        Self {
            name: "level01",
            player_actor: "Character",
            player_start: Transform::new(Vec3::ZERO, 0.0),
            doors,
            switches,
            groups,
            chests,
            triggers: level_triggers,
            golems: vec![GolemSpawn {
                actor: "Golem",
                start: Transform::new(Vec3::new(0.0, 12.0, 0.0), 180.0),
                view_trigger: triggers::GOLEM_VIEW,
                guards: Some(doors::WOODEN_GUARDED),
            }],
        }
    }
}
