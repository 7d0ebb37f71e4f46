//! Synchronous publish/subscribe routing for [`GameEvent`]s.
//!
//! The bus lives in the [`World`] as a resource, and handlers receive `&mut World`
//! so they can reach any other resource, including the bus itself. Publishing is
//! depth-first: a handler that publishes runs the nested dispatch to completion
//! before the outer dispatch moves on to the next handler.
//!
//! Dispatch takes a snapshot of the matching subscriptions (in registration order)
//! when `publish` is called. A subscription revoked before its turn is skipped,
//! which is what lets an owner tear itself down in the middle of a dispatch.
//! Subscriptions added during dispatch only see later publishes. A handler that
//! is currently running is not re-entered by a nested publish of the same kind.

use bevy_ecs::{entity::Entity, resource::Resource, world::World};
use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::events::{GameEvent, GameEventKind};

/// A boxed event handler.
pub type Handler = Box<dyn FnMut(&mut World, &GameEvent) + Send + Sync>;

/// Identifies a single subscription for individual revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    kind: GameEventKind,
    owner: Entity,
    once: bool,
    /// `None` while the handler is executing.
    handler: Option<Handler>,
}

#[derive(Resource, Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl EventBus {
    /// Registers `handler` for every event of `kind` until revoked.
    pub fn subscribe<F>(&mut self, kind: GameEventKind, owner: Entity, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut World, &GameEvent) + Send + Sync + 'static,
    {
        self.insert(kind, owner, false, Box::new(handler))
    }

    /// Registers `handler` for the next event of `kind` only.
    pub fn subscribe_once<F>(&mut self, kind: GameEventKind, owner: Entity, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut World, &GameEvent) + Send + Sync + 'static,
    {
        self.insert(kind, owner, true, Box::new(handler))
    }

    fn insert(&mut self, kind: GameEventKind, owner: Entity, once: bool, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        trace!(?id, ?kind, ?owner, once, "Subscribed");
        self.subscriptions.push(Subscription {
            id,
            kind,
            owner,
            once,
            handler: Some(handler),
        });
        id
    }

    /// Revokes a single subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        before != self.subscriptions.len()
    }

    /// Revokes every subscription registered by `owner`, returning how many were removed.
    pub fn unsubscribe_all(&mut self, owner: Entity) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.owner != owner);
        let removed = before - self.subscriptions.len();
        trace!(?owner, removed, "Ignoring all events");
        removed
    }

    /// Number of live subscriptions held by `owner`.
    pub fn subscription_count(&self, owner: Entity) -> usize {
        self.subscriptions.iter().filter(|s| s.owner == owner).count()
    }

    /// Number of live subscriptions for `kind`.
    pub fn subscribers(&self, kind: GameEventKind) -> usize {
        self.subscriptions.iter().filter(|s| s.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    fn snapshot(&self, kind: GameEventKind) -> SmallVec<[SubscriptionId; 8]> {
        self.subscriptions.iter().filter(|s| s.kind == kind).map(|s| s.id).collect()
    }

    /// Takes the handler out for execution. One-shot subscriptions are revoked here,
    /// before they run, so a nested publish can never fire them twice.
    fn take(&mut self, id: SubscriptionId) -> Option<(Handler, bool)> {
        let index = self.subscriptions.iter().position(|s| s.id == id)?;
        if self.subscriptions[index].once {
            let subscription = self.subscriptions.remove(index);
            return subscription.handler.map(|handler| (handler, true));
        }
        self.subscriptions[index].handler.take().map(|handler| (handler, false))
    }

    /// Puts a handler back, unless its subscription was revoked while it ran.
    fn restore(&mut self, id: SubscriptionId, handler: Handler) {
        if let Some(subscription) = self.subscriptions.iter_mut().find(|s| s.id == id) {
            subscription.handler = Some(handler);
        }
    }
}

/// Delivers `event` synchronously to every current subscriber of its kind.
///
/// Publishing an event nobody listens to is not an error.
pub fn publish(world: &mut World, event: GameEvent) {
    let kind = event.kind();
    let Some(bus) = world.get_resource::<EventBus>() else {
        warn!(?kind, "Event published without an event bus");
        return;
    };

    let targets = bus.snapshot(kind);
    trace!(?kind, handlers = targets.len(), "Publishing event");

    for id in targets {
        let Some((mut handler, once)) = world.get_resource_mut::<EventBus>().and_then(|mut bus| bus.take(id)) else {
            continue;
        };

        handler(world, &event);

        if !once {
            if let Some(mut bus) = world.get_resource_mut::<EventBus>() {
                bus.restore(id, handler);
            }
        }
    }
}
