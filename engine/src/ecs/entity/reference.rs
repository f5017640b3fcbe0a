//! Scoped entity views.
//!
//! [`EntityRef`] and [`EntityMut`] pair an [`Entity`] handle with a borrow of
//! its owning registry, giving the handle-centric API of a classic ECS
//! (`entity.add(..)`, `entity.get::<C>()`, `entity.destroy()`) without the
//! handle itself holding a back-pointer. The borrow makes the "handles never
//! own state" rule explicit: a view cannot outlive the registry, and a
//! mutable view excludes every other access while it is held.

use crate::ecs::{
    component::Component,
    entity::Entity,
    error::Error,
    registry::Registry,
};

/// A read-only view of one entity's components.
pub struct EntityRef<'w> {
    entity: Entity,
    registry: &'w Registry,
}

impl<'w> EntityRef<'w> {
    #[inline]
    pub(crate) fn new(entity: Entity, registry: &'w Registry) -> Self {
        Self { entity, registry }
    }

    /// The underlying handle.
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Returns `true` if the entity currently has component `C`.
    #[inline]
    pub fn has<C: Component>(&self) -> bool {
        self.registry.has_component::<C>(self.entity)
    }

    /// Read component `C`, failing if the entity does not have it.
    #[inline]
    pub fn get<C: Component>(&self) -> Result<&C, Error> {
        self.registry.get_component::<C>(self.entity)
    }
}

/// A mutable view of one entity, forwarding the full component lifecycle to
/// the owning registry.
pub struct EntityMut<'w> {
    entity: Entity,
    registry: &'w mut Registry,
}

impl<'w> EntityMut<'w> {
    #[inline]
    pub(crate) fn new(entity: Entity, registry: &'w mut Registry) -> Self {
        Self { entity, registry }
    }

    /// The underlying handle.
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Attach component `C`, overwriting any existing value.
    #[inline]
    pub fn add<C: Component>(&mut self, value: C) -> Result<&mut Self, Error> {
        self.registry.add_component(self.entity, value)?;
        Ok(self)
    }

    /// Detach component `C`. The stored value becomes logically invalid but
    /// stays allocated.
    #[inline]
    pub fn remove<C: Component>(&mut self) -> Result<&mut Self, Error> {
        self.registry.remove_component::<C>(self.entity)?;
        Ok(self)
    }

    /// Returns `true` if the entity currently has component `C`.
    #[inline]
    pub fn has<C: Component>(&self) -> bool {
        self.registry.has_component::<C>(self.entity)
    }

    /// Read component `C`, failing if the entity does not have it.
    #[inline]
    pub fn get<C: Component>(&self) -> Result<&C, Error> {
        self.registry.get_component::<C>(self.entity)
    }

    /// Mutate component `C`, failing if the entity does not have it.
    #[inline]
    pub fn get_mut<C: Component>(&mut self) -> Result<&mut C, Error> {
        self.registry.get_component_mut::<C>(self.entity)
    }

    /// Mark the entity for destruction at the next flush. Nothing is removed
    /// synchronously.
    #[inline]
    pub fn destroy(self) {
        self.registry.destroy_entity(self.entity);
    }
}
