//! Systems: per-frame logic over signature-matched entities.
//!
//! A system declares its component requirements once, when it is registered,
//! by building a [`Signature`]; the registry then keeps the system's match
//! list current across flushes. Each frame the external driver calls
//! [`Registry::run_system`](crate::ecs::Registry::run_system), which hands
//! the system a [`Context`] with its current match list and mutable access to
//! the world.
//!
//! # Structural mutation contract
//!
//! While iterating `ctx.entities`, a system may freely call
//! `ctx.registry.destroy_entity`, `add_component`, or `remove_component`:
//! destruction is always deferred to the next flush, and component changes
//! only affect match lists at the next flush, so the slice being iterated is
//! never invalidated mid-update. Systems must not call
//! [`Registry::update`](crate::ecs::Registry::update) from inside `update`.

use crate::ecs::{
    component,
    entity::Entity,
    error::Error,
    event::EventBus,
    registry::Registry,
    signature::Signature,
};

/// Everything a system sees during one update call.
pub struct Context<'a> {
    /// The system's current match list, fixed for the duration of the call.
    pub entities: &'a [Entity],

    /// The world. Component reads/writes are immediate; structural changes
    /// are deferred to the next flush.
    pub registry: &'a mut Registry,

    /// The event bus, for emitting and (re)wiring subscriptions.
    pub events: &'a mut EventBus,

    /// Seconds elapsed since the previous frame.
    pub delta: f32,
}

/// A logic unit operating on all entities matching a component signature.
pub trait System: 'static {
    /// Declare the component types this system requires. Called exactly once,
    /// when the system is registered; the resulting signature never changes.
    fn requirements(types: &component::Registry) -> Result<Signature, Error>
    where
        Self: Sized;

    /// Per-frame behavior over the matched entities.
    fn update(&mut self, ctx: Context<'_>);
}
