//! The level puzzle engine: switches, order groups, doors, chests and keys.
//!
//! The [`Level`] resource holds the puzzle state and answers pure questions about
//! it. The free functions in this module apply an operation to the running world,
//! which also covers the animation, audio, collision and HUD side effects.

use std::collections::BTreeMap;

use bevy_ecs::{entity::Entity, resource::Resource, world::World};
use tracing::{debug, info, trace, warn};

use crate::bus::{publish, EventBus};
use crate::error::LevelError;
use crate::events::{GameEvent, GameEventKind, Outcome};
use crate::sequence::{self, Sequence};
use crate::services::{ActorHandle, Clip, Music, RenderService, Services, Sfx};
use crate::triggers::{ColliderTag, TriggerKind};

pub mod layout;

pub use layout::LevelLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwitchId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChestId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DoorId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u8);

/// A level object the player can operate with the action key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interactable {
    Switch(SwitchId),
    Chest(ChestId),
    KeyDoor(DoorId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorKind {
    Wooden,
    Boulder,
}

impl DoorKind {
    fn open_clip(self) -> Clip {
        match self {
            DoorKind::Wooden => Clip::WoodDoorOpen,
            DoorKind::Boulder => Clip::BoulderDoorOpen,
        }
    }
}

/// What has to happen for a door to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorGate {
    /// Opened by a switch or by a completed order group.
    Switch,
    /// Consumes one key.
    Key,
    /// Opened when its guardian is defeated. The guardian is bound once spawned.
    Enemy(Option<Entity>),
}

#[derive(Debug, Clone)]
pub struct Door {
    pub kind: DoorKind,
    pub gate: DoorGate,
    actor: ActorHandle,
    open: bool,
}

impl Door {
    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Where a switch sends its activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchLink {
    Door(DoorId),
    Group(GroupId),
}

#[derive(Debug, Clone)]
pub struct Switch {
    pub link: SwitchLink,
    actor: ActorHandle,
    activated: bool,
}

impl Switch {
    pub fn is_activated(&self) -> bool {
        self.activated
    }
}

/// Switches that must be activated in exactly `sequence` order to open `door`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderGroup {
    pub sequence: Vec<SwitchId>,
    pub door: DoorId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestReward {
    Key,
    /// The artifact; finding it wins the game.
    Artifact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestState {
    Closed,
    Opening,
    Open,
}

#[derive(Debug, Clone)]
pub struct Chest {
    pub reward: ChestReward,
    actor: ActorHandle,
    state: ChestState,
}

impl Chest {
    pub fn state(&self) -> ChestState {
        self.state
    }
}

/// Keys carried by the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyCounter {
    count: u32,
}

impl KeyCounter {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn add(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    /// Uses up one key. Returns false, leaving the count at zero, if there is none.
    pub fn take(&mut self) -> bool {
        match self.count.checked_sub(1) {
            Some(count) => {
                self.count = count;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The switch is still animating from a previous activation.
    Busy,
    /// The linked door is now open.
    Opened(DoorId),
    /// The order group advanced to `step` without being completed.
    Advanced { group: GroupId, step: usize },
    /// Out of order: every switch of the group was reset.
    Reset(GroupId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestOutcome {
    Opening,
    /// Already opening or open; nothing happened.
    AlreadyOpened,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDoorOutcome {
    Opened,
    AlreadyOpen,
    /// No key was available.
    Locked,
}

#[derive(Resource, Debug)]
pub struct Level {
    owner: Entity,
    running: bool,
    switches: BTreeMap<SwitchId, Switch>,
    groups: BTreeMap<GroupId, OrderGroup>,
    doors: BTreeMap<DoorId, Door>,
    chests: BTreeMap<ChestId, Chest>,
    keys: KeyCounter,
    focus: Option<Interactable>,
}

impl Level {
    /// Builds the puzzle state for `layout`, loading the actor of every animated prop.
    pub fn from_layout(layout: &LevelLayout, owner: Entity, render: &mut dyn RenderService) -> Result<Self, LevelError> {
        let doors: BTreeMap<_, _> = layout
            .doors
            .iter()
            .map(|spec| {
                let door = Door {
                    kind: spec.kind,
                    gate: spec.gate,
                    actor: render.load_actor(spec.actor),
                    open: false,
                };
                (spec.id, door)
            })
            .collect();

        let mut groups = BTreeMap::new();
        for spec in &layout.groups {
            if !doors.contains_key(&spec.door) {
                return Err(LevelError::UnknownDoor(spec.door));
            }
            groups.insert(
                spec.id,
                OrderGroup {
                    sequence: spec.sequence.clone(),
                    door: spec.door,
                },
            );
        }

        let mut switches = BTreeMap::new();
        for spec in &layout.switches {
            match spec.link {
                SwitchLink::Door(door) if !doors.contains_key(&door) => return Err(LevelError::UnknownDoor(door)),
                SwitchLink::Group(group) => match groups.get(&group) {
                    None => return Err(LevelError::UnknownGroup(group)),
                    Some(order) if !order.sequence.contains(&spec.id) => {
                        return Err(LevelError::NotInGroup { switch: spec.id, group })
                    }
                    Some(_) => {}
                },
                SwitchLink::Door(_) => {}
            }
            switches.insert(
                spec.id,
                Switch {
                    link: spec.link,
                    actor: render.load_actor(spec.actor),
                    activated: false,
                },
            );
        }

        for (&group, order) in &groups {
            if let Some(missing) = order.sequence.iter().find(|id| !switches.contains_key(id)) {
                return Err(LevelError::NotInGroup { switch: *missing, group });
            }
        }

        let chests = layout
            .chests
            .iter()
            .map(|spec| {
                let chest = Chest {
                    reward: spec.reward,
                    actor: render.load_actor(spec.actor),
                    state: ChestState::Closed,
                };
                (spec.id, chest)
            })
            .collect();

        Ok(Self {
            owner,
            running: false,
            switches,
            groups,
            doors,
            chests,
            keys: KeyCounter::default(),
            focus: None,
        })
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn switch(&self, id: SwitchId) -> Option<&Switch> {
        self.switches.get(&id)
    }

    pub fn door(&self, id: DoorId) -> Option<&Door> {
        self.doors.get(&id)
    }

    pub fn chest(&self, id: ChestId) -> Option<&Chest> {
        self.chests.get(&id)
    }

    pub fn group(&self, id: GroupId) -> Option<&OrderGroup> {
        self.groups.get(&id)
    }

    pub fn is_door_open(&self, id: DoorId) -> bool {
        self.doors.get(&id).is_some_and(Door::is_open)
    }

    pub fn keys(&self) -> u32 {
        self.keys.count()
    }

    pub fn focus(&self) -> Option<Interactable> {
        self.focus
    }

    /// Applies a switch activation to the puzzle state only.
    ///
    /// A grouped switch counts only if every switch before it in the group's
    /// sequence is already activated; otherwise the whole group is reset.
    pub fn press_switch(&mut self, id: SwitchId) -> Result<SwitchOutcome, LevelError> {
        let link = self.switches.get(&id).ok_or(LevelError::UnknownSwitch(id))?.link;

        let group = match link {
            SwitchLink::Door(door) => {
                self.set_activated(id, true);
                return Ok(SwitchOutcome::Opened(door));
            }
            SwitchLink::Group(group) => group,
        };

        let order = self.groups.get(&group).ok_or(LevelError::UnknownGroup(group))?;
        let step = order
            .sequence
            .iter()
            .position(|switch| *switch == id)
            .ok_or(LevelError::NotInGroup { switch: id, group })?;
        let in_order = order.sequence[..step]
            .iter()
            .all(|prior| self.switches.get(prior).is_some_and(Switch::is_activated));
        let complete = step + 1 == order.sequence.len();
        let (door, members) = (order.door, order.sequence.clone());

        if !in_order {
            for member in members {
                self.set_activated(member, false);
            }
            return Ok(SwitchOutcome::Reset(group));
        }

        self.set_activated(id, true);
        if complete {
            Ok(SwitchOutcome::Opened(door))
        } else {
            Ok(SwitchOutcome::Advanced { group, step })
        }
    }

    fn set_activated(&mut self, id: SwitchId, activated: bool) {
        if let Some(switch) = self.switches.get_mut(&id) {
            switch.activated = activated;
        }
    }
}

/// Installs the level's subscriptions and starts the ambient music.
pub fn start_level(world: &mut World) {
    let owner = {
        let mut level = world.resource_mut::<Level>();
        level.running = true;
        level.owner
    };

    {
        let mut bus = world.resource_mut::<EventBus>();
        bus.subscribe(GameEventKind::Trigger, owner, |world, event| {
            if let GameEvent::Trigger(trigger) = event {
                if let (ColliderTag::PlayerBody, TriggerKind::Interact(target)) = (trigger.collider, trigger.kind) {
                    update_focus(world, target, trigger.is_enter());
                }
            }
        });
        bus.subscribe(GameEventKind::PlayerActivate, owner, |world, _| interact(world));
        bus.subscribe(GameEventKind::GolemDestroyed, owner, |world, event| {
            if let GameEvent::GolemDestroyed { golem } = event {
                defeat_enemy(world, *golem);
            }
        });
    }

    world.resource_mut::<Services>().audio.play_music(Music::Ambient, true);
    debug!(?owner, "Level started");
}

/// Revokes the level's subscriptions and settles its in-flight animations.
pub fn stop_level(world: &mut World) {
    let owner = {
        let mut level = world.resource_mut::<Level>();
        level.running = false;
        level.focus = None;
        level.owner
    };
    world.resource_mut::<EventBus>().unsubscribe_all(owner);
    sequence::force_complete_owned(world, owner);
    debug!(?owner, "Level stopped");
}

fn update_focus(world: &mut World, target: Interactable, entered: bool) {
    let event = {
        let mut level = world.resource_mut::<Level>();
        if entered {
            level.focus = Some(target);
            GameEvent::ActionActive
        } else if level.focus == Some(target) {
            level.focus = None;
            GameEvent::ActionDeactive
        } else {
            return;
        }
    };
    trace!(?target, entered, "Interaction focus changed");
    publish(world, event);
}

/// Operates whatever the player is currently standing at.
pub fn interact(world: &mut World) {
    let Some(target) = world.resource::<Level>().focus else {
        trace!("Nothing to interact with");
        return;
    };

    let result = match target {
        Interactable::Switch(id) => activate_switch(world, id).map(|outcome| debug!(?id, ?outcome, "Switch activated")),
        Interactable::Chest(id) => open_chest(world, id).map(|outcome| debug!(?id, ?outcome, "Chest activated")),
        Interactable::KeyDoor(id) => use_key_door(world, id).map(|outcome| debug!(?id, ?outcome, "Key door used")),
    };
    if let Err(error) = result {
        warn!(?target, %error, "Ignoring interaction");
    }
}

/// Activates a switch, playing its one-shot animation and opening any door it completes.
pub fn activate_switch(world: &mut World, id: SwitchId) -> Result<SwitchOutcome, LevelError> {
    let actor = world
        .resource::<Level>()
        .switch(id)
        .ok_or(LevelError::UnknownSwitch(id))?
        .actor;

    {
        let mut services = world.resource_mut::<Services>();
        if services.render.is_animation_playing(actor, Clip::SwitchActivate) {
            trace!(?id, "Switch still animating");
            return Ok(SwitchOutcome::Busy);
        }
        services.render.play_animation(actor, Clip::SwitchActivate, 1.0, false);
        services.audio.play_sfx(Sfx::SwitchClick);
    }

    let outcome = world.resource_mut::<Level>().press_switch(id)?;
    match outcome {
        SwitchOutcome::Opened(door) => {
            open_door(world, door)?;
        }
        SwitchOutcome::Reset(group) => {
            debug!(?id, ?group, "Switch activated out of order, group reset");
            world.resource_mut::<Services>().audio.play_sfx(Sfx::SwitchReset);
        }
        SwitchOutcome::Advanced { group, step } => trace!(?id, ?group, step, "Order group advanced"),
        SwitchOutcome::Busy => {}
    }
    Ok(outcome)
}

/// Opens a chest once. The reward is handed out when the lid animation finishes.
pub fn open_chest(world: &mut World, id: ChestId) -> Result<ChestOutcome, LevelError> {
    let (owner, actor) = {
        let mut level = world.resource_mut::<Level>();
        let owner = level.owner;
        let chest = level.chests.get_mut(&id).ok_or(LevelError::UnknownChest(id))?;
        if chest.state != ChestState::Closed {
            return Ok(ChestOutcome::AlreadyOpened);
        }
        chest.state = ChestState::Opening;
        (owner, chest.actor)
    };

    world.resource_mut::<Services>().audio.play_sfx(Sfx::ChestOpen);
    sequence::start(
        world,
        owner,
        Sequence::new("chest-open")
            .animate(actor, Clip::ChestOpen, 1.0)
            .then(move |world| award_chest(world, id)),
    );
    Ok(ChestOutcome::Opening)
}

fn award_chest(world: &mut World, id: ChestId) {
    let (reward, keys) = {
        let mut level = world.resource_mut::<Level>();
        if !level.running {
            return;
        }
        let Some(chest) = level.chests.get_mut(&id) else {
            return;
        };
        chest.state = ChestState::Open;
        let reward = chest.reward;
        let keys = match reward {
            ChestReward::Key => level.keys.add(),
            ChestReward::Artifact => level.keys.count(),
        };
        (reward, keys)
    };

    match reward {
        ChestReward::Key => {
            debug!(?id, keys, "Key found");
            world.resource_mut::<Services>().audio.play_sfx(Sfx::KeyPickup);
            publish(world, GameEvent::UpdateKeyCount(keys));
            publish(world, GameEvent::ShowMessage("You found a key".to_string()));
        }
        ChestReward::Artifact => {
            info!(?id, "Artifact found");
            publish(world, GameEvent::GameOver(Outcome::Win));
        }
    }
}

/// Tries to open a key-gated door with one of the player's keys.
///
/// The key count is published whatever the result, so the HUD stays consistent.
pub fn use_key_door(world: &mut World, id: DoorId) -> Result<KeyDoorOutcome, LevelError> {
    let (outcome, keys) = {
        let mut level = world.resource_mut::<Level>();
        let door = level.doors.get(&id).ok_or(LevelError::UnknownDoor(id))?;
        if door.gate != DoorGate::Key {
            return Err(LevelError::NotKeyGated(id));
        }
        let already_open = door.open;
        let outcome = if already_open {
            KeyDoorOutcome::AlreadyOpen
        } else if level.keys.take() {
            KeyDoorOutcome::Opened
        } else {
            KeyDoorOutcome::Locked
        };
        (outcome, level.keys.count())
    };

    match outcome {
        KeyDoorOutcome::Opened => {
            open_door(world, id)?;
        }
        KeyDoorOutcome::Locked => {
            world.resource_mut::<Services>().audio.play_sfx(Sfx::Locked);
            publish(world, GameEvent::ShowMessage("The door is locked".to_string()));
        }
        KeyDoorOutcome::AlreadyOpen => {}
    }
    publish(world, GameEvent::UpdateKeyCount(keys));
    Ok(outcome)
}

/// Binds the enemy whose defeat opens `door`.
pub fn bind_guardian(world: &mut World, door: DoorId, guardian: Entity) -> Result<(), LevelError> {
    let mut level = world.resource_mut::<Level>();
    let entry = level.doors.get_mut(&door).ok_or(LevelError::UnknownDoor(door))?;
    match entry.gate {
        DoorGate::Enemy(_) => {
            entry.gate = DoorGate::Enemy(Some(guardian));
            Ok(())
        }
        _ => Err(LevelError::NotEnemyGated(door)),
    }
}

/// Opens every door guarded by `enemy`. Returns how many were opened.
pub fn defeat_enemy(world: &mut World, enemy: Entity) -> usize {
    let guarded: Vec<DoorId> = world
        .resource::<Level>()
        .doors
        .iter()
        .filter(|(_, door)| door.gate == DoorGate::Enemy(Some(enemy)))
        .map(|(id, _)| *id)
        .collect();

    guarded
        .into_iter()
        .filter(|door| matches!(open_door(world, *door), Ok(true)))
        .count()
}

/// Opens a door for good. Returns false if it was already open.
pub fn open_door(world: &mut World, id: DoorId) -> Result<bool, LevelError> {
    let (kind, actor) = {
        let mut level = world.resource_mut::<Level>();
        let door = level.doors.get_mut(&id).ok_or(LevelError::UnknownDoor(id))?;
        if door.open {
            return Ok(false);
        }
        door.open = true;
        (door.kind, door.actor)
    };

    {
        let mut services = world.resource_mut::<Services>();
        services.render.play_animation(actor, kind.open_clip(), 1.0, false);
        services.audio.play_sfx(Sfx::DoorOpen);
        services.collision.set_passable(id);
    }
    debug!(?id, ?kind, "Door opened");
    publish(world, GameEvent::DoorOpened { door: id });
    Ok(true)
}
