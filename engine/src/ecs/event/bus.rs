//! Synchronous type-keyed publish/subscribe dispatch.
//!
//! The [`EventBus`] lets systems communicate within a frame without knowing
//! about each other: a subscriber registers a handler for an event type, and
//! [`emit`](EventBus::emit) invokes every handler for that type immediately,
//! in subscription order, before returning.
//!
//! # Type Erasure
//!
//! Internally the bus stores one handler list per event `TypeId`, boxed
//! behind an erased trait and downcast back to the concrete list on access,
//! the same heterogeneous-storage shape the component pools use.
//!
//! # Subscriptions are persistent
//!
//! Handlers stay registered until explicitly removed with
//! [`unsubscribe`](EventBus::unsubscribe) (by the token returned from
//! [`subscribe`](EventBus::subscribe)) or dropped wholesale with
//! [`clear`](EventBus::clear). There is no need to rebuild subscriptions
//! every frame.
//!
//! # Dispatch semantics
//!
//! All handlers for an emission receive the *same* event instance by mutable
//! reference: a later handler observes mutations made by earlier ones. While
//! an event type is mid-dispatch its handler list is detached from the bus,
//! so a handler that re-emits the same type finds no subscribers (no
//! unbounded recursion); emitting *other* event types nests normally, and
//! subscriptions made during a dispatch only receive events emitted after
//! that dispatch completes.

use std::{
    any::{Any, TypeId, type_name},
    collections::{HashMap, HashSet},
};

use log::trace;

use crate::ecs::{event::Event, registry::Registry};

/// A handle identifying one subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// The stored form of a handler: full mutable access to the world and the
/// bus, plus the in-flight event.
type Handler<E> = Box<dyn FnMut(&mut Registry, &mut EventBus, &mut E)>;

struct Subscriber<E: Event> {
    id: Subscription,
    handler: Handler<E>,
}

/// The concrete per-event-type handler list behind the erased storage.
struct HandlerList<E: Event> {
    subscribers: Vec<Subscriber<E>>,
}

impl<E: Event> Default for HandlerList<E> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

/// What the bus needs from a handler list without knowing its event type.
trait ErasedHandlers {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove(&mut self, raw: u64) -> bool;
    fn len(&self) -> usize;
}

impl<E: Event> ErasedHandlers for HandlerList<E> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove(&mut self, raw: u64) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id.0 != raw);
        self.subscribers.len() != before
    }

    fn len(&self) -> usize {
        self.subscribers.len()
    }
}

/// Synchronous type-keyed publish/subscribe dispatcher.
pub struct EventBus {
    /// Type-erased handler lists, keyed by event TypeId.
    handlers: HashMap<TypeId, Box<dyn ErasedHandlers>>,

    /// Next subscription token. Monotonic, never reused.
    next_token: u64,

    /// Tokens unsubscribed while their list was detached mid-dispatch;
    /// applied when the list is reattached and swept once no dispatch is
    /// in flight.
    dead: HashSet<u64>,

    /// Nesting depth of in-progress dispatches.
    dispatching: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a bus with no subscriptions.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            next_token: 0,
            dead: HashSet::new(),
            dispatching: 0,
        }
    }

    /// Register a handler for event type `E`, appended after any existing
    /// handlers for that type (dispatch is FIFO in subscription order).
    ///
    /// Returns a [`Subscription`] token for later removal.
    pub fn subscribe<E, F>(&mut self, handler: F) -> Subscription
    where
        E: Event,
        F: FnMut(&mut Registry, &mut EventBus, &mut E) + 'static,
    {
        let token = Subscription(self.next_token);
        self.next_token += 1;

        let list = self
            .handlers
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(HandlerList::<E>::default()) as Box<dyn ErasedHandlers>);
        let list = list
            .as_any_mut()
            .downcast_mut::<HandlerList<E>>()
            .expect("handler list keyed by event type holds a different type");
        list.subscribers.push(Subscriber {
            id: token,
            handler: Box::new(handler),
        });

        token
    }

    /// Remove the subscription identified by `token`.
    ///
    /// Returns `true` if the handler was removed immediately. Returns `false`
    /// for unknown tokens, and for handlers whose list is currently detached
    /// by an in-progress dispatch; those are removed when the dispatch ends,
    /// though they may still run for the event already in flight.
    pub fn unsubscribe(&mut self, token: Subscription) -> bool {
        for list in self.handlers.values_mut() {
            if list.remove(token.0) {
                return true;
            }
        }
        // Only a dispatch in flight can be hiding the token's list; with
        // none running, an unmatched token is simply unknown.
        if self.dispatching > 0 {
            self.dead.insert(token.0);
        }
        false
    }

    /// Returns the number of live subscriptions for event type `E`.
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.handlers
            .get(&TypeId::of::<E>())
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Drop every subscription for every event type.
    pub fn clear(&mut self) {
        self.handlers.clear();
        self.dead.clear();
    }

    /// Synchronously deliver `event` to every subscriber of `E`, in
    /// subscription order, passing the same instance by mutable reference.
    ///
    /// Emitting an event type with no subscribers is a silent no-op.
    pub fn emit<E: Event>(&mut self, registry: &mut Registry, mut event: E) {
        let type_id = TypeId::of::<E>();
        let Some(mut detached) = self.handlers.remove(&type_id) else {
            trace!("no subscribers for {}", type_name::<E>());
            return;
        };
        self.dispatching += 1;

        {
            let list = detached
                .as_any_mut()
                .downcast_mut::<HandlerList<E>>()
                .expect("handler list keyed by event type holds a different type");
            for subscriber in list.subscribers.iter_mut() {
                if self.dead.contains(&subscriber.id.0) {
                    continue;
                }
                (subscriber.handler)(registry, self, &mut event);
            }
            // Apply unsubscribes that arrived while the list was detached.
            list.subscribers.retain(|s| !self.dead.remove(&s.id.0));
        }

        // Handlers subscribed during the dispatch landed in a fresh list;
        // reattach with the original subscribers first to keep FIFO order.
        if let Some(mut fresh) = self.handlers.remove(&type_id) {
            let fresh = fresh
                .as_any_mut()
                .downcast_mut::<HandlerList<E>>()
                .expect("handler list keyed by event type holds a different type");
            let list = detached
                .as_any_mut()
                .downcast_mut::<HandlerList<E>>()
                .expect("handler list keyed by event type holds a different type");
            list.subscribers.append(&mut fresh.subscribers);
        }
        self.handlers.insert(type_id, detached);

        self.dispatching -= 1;
        if self.dispatching == 0 {
            // Every deferred removal was consumed on reattach; anything left
            // named a token no list ever held.
            self.dead.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::ecs::registry::Registry;

    #[derive(Debug)]
    struct Damage {
        amount: u32,
    }
    impl Event for Damage {}

    #[derive(Debug)]
    struct Heal;
    impl Event for Heal {}

    #[test]
    fn emit_without_subscribers_is_a_noop() {
        let mut bus = EventBus::new();
        let mut registry = Registry::new();

        bus.emit(&mut registry, Damage { amount: 1 });
    }

    #[test]
    fn handlers_run_in_subscription_order_exactly_once() {
        // Given - subscribers A, B, C registered in that order
        let mut bus = EventBus::new();
        let mut registry = Registry::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for name in ["a", "b", "c"] {
            let order = Rc::clone(&order);
            bus.subscribe::<Damage, _>(move |_, _, _| order.borrow_mut().push(name));
        }

        // When
        bus.emit(&mut registry, Damage { amount: 1 });

        // Then
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn later_handlers_see_earlier_mutations() {
        // Given - the first handler doubles the damage
        let mut bus = EventBus::new();
        let mut registry = Registry::new();
        let seen = Rc::new(RefCell::new(0));

        bus.subscribe::<Damage, _>(|_, _, event| event.amount *= 2);
        {
            let seen = Rc::clone(&seen);
            bus.subscribe::<Damage, _>(move |_, _, event| *seen.borrow_mut() = event.amount);
        }

        // When
        bus.emit(&mut registry, Damage { amount: 21 });

        // Then - the second handler observed the doubled value
        assert_eq!(*seen.borrow(), 42);
    }

    #[test]
    fn events_are_scoped_by_type() {
        // Given
        let mut bus = EventBus::new();
        let mut registry = Registry::new();
        let hits = Rc::new(RefCell::new(0u32));

        {
            let hits = Rc::clone(&hits);
            bus.subscribe::<Damage, _>(move |_, _, _| *hits.borrow_mut() += 1);
        }

        // When - emitting a different event type
        bus.emit(&mut registry, Heal);

        // Then
        assert_eq!(*hits.borrow(), 0);

        // And When
        bus.emit(&mut registry, Damage { amount: 1 });
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn unsubscribe_removes_a_handler() {
        // Given
        let mut bus = EventBus::new();
        let mut registry = Registry::new();
        let hits = Rc::new(RefCell::new(0u32));

        let token = {
            let hits = Rc::clone(&hits);
            bus.subscribe::<Damage, _>(move |_, _, _| *hits.borrow_mut() += 1)
        };
        assert_eq!(bus.subscriber_count::<Damage>(), 1);

        // When
        assert!(bus.unsubscribe(token));
        bus.emit(&mut registry, Damage { amount: 1 });

        // Then
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(bus.subscriber_count::<Damage>(), 0);

        // And - unsubscribing again reports nothing removed
        assert!(!bus.unsubscribe(token));
    }

    #[test]
    fn unsubscribing_unknown_tokens_retains_no_state() {
        // Given - a token that has already been removed
        let mut bus = EventBus::new();
        let mut registry = Registry::new();
        let token = bus.subscribe::<Damage, _>(|_, _, _| {});
        assert!(bus.unsubscribe(token));

        // When - unsubscribing it again, repeatedly, outside any dispatch
        assert!(!bus.unsubscribe(token));
        assert!(!bus.unsubscribe(token));

        // Then - no deferred-removal entry accumulates
        assert!(bus.dead.is_empty());

        // And When - an unknown token is unsubscribed mid-dispatch
        bus.subscribe::<Damage, _>(move |_, bus, _| {
            bus.unsubscribe(token);
        });
        bus.emit(&mut registry, Damage { amount: 1 });

        // Then - the leftover is swept once the dispatch ends
        assert!(bus.dead.is_empty());
    }

    #[test]
    fn clear_drops_all_subscriptions() {
        let mut bus = EventBus::new();
        bus.subscribe::<Damage, _>(|_, _, _| {});
        bus.subscribe::<Heal, _>(|_, _, _| {});

        bus.clear();

        assert_eq!(bus.subscriber_count::<Damage>(), 0);
        assert_eq!(bus.subscriber_count::<Heal>(), 0);
    }

    #[test]
    fn handlers_may_emit_other_event_types() {
        // Given - a Damage handler that emits Heal, and a Heal counter
        let mut bus = EventBus::new();
        let mut registry = Registry::new();
        let heals = Rc::new(RefCell::new(0u32));

        {
            let heals = Rc::clone(&heals);
            bus.subscribe::<Heal, _>(move |_, _, _| *heals.borrow_mut() += 1);
        }
        bus.subscribe::<Damage, _>(|registry, bus, _| bus.emit(registry, Heal));

        // When
        bus.emit(&mut registry, Damage { amount: 1 });

        // Then - the nested dispatch ran synchronously
        assert_eq!(*heals.borrow(), 1);
    }

    #[test]
    fn reemitting_the_dispatching_type_finds_no_handlers() {
        // Given - a handler that re-emits its own event type
        let mut bus = EventBus::new();
        let mut registry = Registry::new();
        let hits = Rc::new(RefCell::new(0u32));

        {
            let hits = Rc::clone(&hits);
            bus.subscribe::<Damage, _>(move |registry, bus, _| {
                *hits.borrow_mut() += 1;
                // The Damage list is detached while this runs.
                bus.emit(registry, Damage { amount: 0 });
            });
        }

        // When
        bus.emit(&mut registry, Damage { amount: 1 });

        // Then - exactly one invocation, no runaway recursion
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn subscriptions_made_during_dispatch_start_with_the_next_emit() {
        // Given - a handler that subscribes another handler
        let mut bus = EventBus::new();
        let mut registry = Registry::new();
        let hits = Rc::new(RefCell::new(0u32));

        {
            let hits = Rc::clone(&hits);
            bus.subscribe::<Damage, _>(move |_, bus, _| {
                let hits = Rc::clone(&hits);
                bus.subscribe::<Damage, _>(move |_, _, _| *hits.borrow_mut() += 1);
            });
        }

        // When - first emit only runs the subscribing handler
        bus.emit(&mut registry, Damage { amount: 1 });
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(bus.subscriber_count::<Damage>(), 2);

        // Then - the new handler runs on the next emit
        bus.emit(&mut registry, Damage { amount: 1 });
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn unsubscribe_during_dispatch_takes_effect_after_it() {
        // Given - handler A unsubscribes handler B mid-dispatch
        let mut bus = EventBus::new();
        let mut registry = Registry::new();
        let hits = Rc::new(RefCell::new(0u32));

        let token = {
            let hits = Rc::clone(&hits);
            bus.subscribe::<Damage, _>(move |_, _, _| *hits.borrow_mut() += 1)
        };
        // The victim is first in FIFO order, so it still runs for the event
        // already in flight before the remover executes.
        bus.subscribe::<Damage, _>(move |_, bus, _| {
            bus.unsubscribe(token);
        });

        // When
        bus.emit(&mut registry, Damage { amount: 1 });
        assert_eq!(*hits.borrow(), 1);

        // Then - the victim is gone for the following emits
        bus.emit(&mut registry, Damage { amount: 1 });
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(bus.subscriber_count::<Damage>(), 1);
    }

    #[test]
    fn handlers_can_mutate_the_registry() {
        // Given - a handler that destroys the entity named in the event
        #[derive(Debug)]
        struct Killed {
            target: crate::ecs::Entity,
        }
        impl Event for Killed {}

        let mut bus = EventBus::new();
        let mut registry = Registry::new();
        let entity = registry.create_entity();
        registry.update();

        bus.subscribe::<Killed, _>(|registry, _, event| {
            registry.destroy_entity(event.target);
        });

        // When
        bus.emit(&mut registry, Killed { target: entity });
        registry.update();

        // Then - the id was recycled, proving the destroy went through
        let reused = registry.create_entity();
        assert_eq!(reused, entity);
    }
}
