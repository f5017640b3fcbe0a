//! The Registry is the central container for all entities, components, and
//! systems in the ECS.
//!
//! It owns every piece of shared state: the component type registry, one
//! [`Pool`] per component type, the per-entity signature table, the system
//! table with each system's match list, and the two pending sets that defer
//! structural changes to frame boundaries.
//!
//! # Frame protocol
//!
//! ```rust,ignore
//! loop {
//!     registry.update();                                 // flush
//!     registry.run_system::<MovementSystem>(&mut bus, delta)?;
//!     registry.run_system::<CollisionSystem>(&mut bus, delta)?;
//!     // ... render from component state ...
//! }
//! ```
//!
//! # Deferred structural mutation
//!
//! `create_entity` and `destroy_entity` never touch system match lists
//! directly; they queue the entity and [`update`](Registry::update) applies
//! the change. Component adds/removes write data immediately (reads through
//! `get_component`/`has_component` are consistent right away) but the
//! affected entity's system memberships are likewise only re-evaluated at the
//! next flush. Systems therefore never see their entity list change while
//! they iterate it.
//!
//! # Entity lifecycle
//!
//! A given id moves through `Free` → `PendingAdd` → `Active` →
//! `PendingDestroy` → `Free`. Destroyed ids are recycled FIFO, and a
//! recycled id always starts with an empty signature.

use std::{
    any::{Any, TypeId, type_name},
    collections::BTreeSet,
    mem,
};

use crossbeam::queue::SegQueue;
use log::{debug, trace, warn};

use crate::ecs::{
    component::{self, AnyPool, Component, Pool},
    entity::{self, Entity, EntityMut, EntityRef},
    error::Error,
    event::EventBus,
    signature::Signature,
    system::{Context, System},
};

/// Object-safe view of a registered system, adding downcast hooks to
/// [`System`] so `get_system` can recover the concrete type.
trait DynSystem: System {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> DynSystem for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One registered system: its immutable requirement signature, its current
/// match list, and the system itself.
struct SystemEntry {
    type_id: TypeId,
    name: &'static str,
    signature: Signature,
    entities: Vec<Entity>,
    /// `None` only while the system is detached by `run_system`.
    system: Option<Box<dyn DynSystem>>,
}

/// The orchestrator: entity lifecycle, component storage, system matching.
#[derive(Default)]
pub struct Registry {
    /// Component type id assignment, shared with system requirement building.
    types: component::Registry,

    /// One pool per component type, indexed by component id. Pools are
    /// created lazily on the first `add_component` for the type.
    pools: Vec<Option<Box<dyn AnyPool>>>,

    /// One signature per entity id. Grows with the id space, never shrinks;
    /// a destroyed entity's slot is cleared and reused with its id.
    signatures: Vec<Signature>,

    /// Next fresh entity id, used when the free queue is empty.
    next_entity: u32,

    /// Destroyed ids awaiting reuse, FIFO.
    free_ids: SegQueue<entity::Id>,

    /// Entities whose system memberships must be (re)evaluated at the next
    /// flush: newly created entities and entities whose signature changed.
    /// Ordered so the flush processes ascending ids.
    pending_match: BTreeSet<Entity>,

    /// Entities marked for destruction at the next flush. A set, so multiple
    /// destroys before a flush collapse into one.
    pending_destroy: BTreeSet<Entity>,

    /// Registered systems, in registration order. At most one entry per
    /// system type.
    systems: Vec<SystemEntry>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The component type registry, for building signatures outside of
    /// system registration.
    #[inline]
    pub fn types(&self) -> &component::Registry {
        &self.types
    }

    // ---------------- entities ----------------

    /// Create a new entity, reusing a destroyed id if one is available.
    ///
    /// The entity joins no system until the next [`update`](Registry::update)
    /// flush, but components can be attached to it immediately.
    pub fn create_entity(&mut self) -> Entity {
        let id = match self.free_ids.pop() {
            Some(id) => id,
            None => {
                let id = entity::Id::from(self.next_entity);
                self.next_entity += 1;
                self.signatures.push(Signature::new());
                id
            }
        };

        let entity = Entity::new(id);
        self.pending_match.insert(entity);
        debug!("created entity {}", entity.index());
        entity
    }

    /// Mark an entity for destruction at the next flush.
    ///
    /// Idempotent before the flush: destroying the same entity twice frees
    /// its id once. Destroying an id that was never created is ignored with
    /// a warning.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if entity.index() >= self.signatures.len() {
            warn!(
                "attempted to destroy an entity that was never created: {}",
                entity.index()
            );
            return;
        }
        self.pending_destroy.insert(entity);
        debug!("entity {} marked for destruction", entity.index());
    }

    /// Get a read-only view of an entity, if its id has ever been issued.
    pub fn entity(&self, entity: Entity) -> Option<EntityRef<'_>> {
        (entity.index() < self.signatures.len()).then(|| EntityRef::new(entity, self))
    }

    /// Get a mutable view of an entity, if its id has ever been issued.
    pub fn entity_mut(&mut self, entity: Entity) -> Option<EntityMut<'_>> {
        (entity.index() < self.signatures.len()).then(|| EntityMut::new(entity, self))
    }

    // ---------------- components ----------------

    /// Attach component `C` to an entity, overwriting any previous value.
    ///
    /// Registers the component type and creates/grows its pool as needed.
    /// Reads see the new value immediately; system memberships follow at the
    /// next flush.
    pub fn add_component<C: Component>(&mut self, entity: Entity, value: C) -> Result<(), Error> {
        let id = self.types.register::<C>()?;
        let index = entity.index();
        if index >= self.signatures.len() {
            return Err(Error::OutOfRange {
                index,
                len: self.signatures.len(),
            });
        }

        if self.pools.len() <= id.index() {
            self.pools.resize_with(id.index() + 1, || None);
        }
        let slot = self.pools[id.index()]
            .get_or_insert_with(|| Box::new(Pool::<C>::new()) as Box<dyn AnyPool>);
        if slot.len() <= index {
            slot.resize(index + 1);
        }
        let pool = slot
            .as_any_mut()
            .downcast_mut::<Pool<C>>()
            .expect("pool keyed by component id holds a different type");
        pool.set(index, value)?;

        self.signatures[index].set(id);
        self.pending_match.insert(entity);
        trace!("entity {} gained {}", index, type_name::<C>());
        Ok(())
    }

    /// Detach component `C` from an entity.
    ///
    /// Only the signature bit is cleared; the pool slot keeps its (now
    /// logically invalid) value until overwritten.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) -> Result<(), Error> {
        let id = self
            .types
            .get::<C>()
            .ok_or(Error::NotFound(type_name::<C>()))?;
        let index = entity.index();
        let len = self.signatures.len();
        let signature = self
            .signatures
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })?;
        signature.reset(id);
        self.pending_match.insert(entity);
        trace!("entity {} lost {}", index, type_name::<C>());
        Ok(())
    }

    /// Returns `true` if the entity currently has component `C`.
    pub fn has_component<C: Component>(&self, entity: Entity) -> bool {
        let Some(id) = self.types.get::<C>() else {
            return false;
        };
        self.signatures
            .get(entity.index())
            .map(|signature| signature.test(id))
            .unwrap_or(false)
    }

    /// Read component `C` of an entity.
    ///
    /// Fails with [`Error::MissingComponent`] if the entity's signature bit
    /// is clear; the pool slot may hold stale data and is never returned.
    pub fn get_component<C: Component>(&self, entity: Entity) -> Result<&C, Error> {
        let id = self.component_id_of::<C>(entity)?;
        let pool = self.pools[id.index()]
            .as_ref()
            .ok_or(Error::NotFound(type_name::<C>()))?;
        let pool = pool
            .as_any()
            .downcast_ref::<Pool<C>>()
            .expect("pool keyed by component id holds a different type");
        pool.get(entity.index())
    }

    /// Mutate component `C` of an entity. Same contract as
    /// [`get_component`](Registry::get_component).
    pub fn get_component_mut<C: Component>(&mut self, entity: Entity) -> Result<&mut C, Error> {
        let id = self.component_id_of::<C>(entity)?;
        let pool = self.pools[id.index()]
            .as_mut()
            .ok_or(Error::NotFound(type_name::<C>()))?;
        let pool = pool
            .as_any_mut()
            .downcast_mut::<Pool<C>>()
            .expect("pool keyed by component id holds a different type");
        pool.get_mut(entity.index())
    }

    /// Resolve `C`'s id and verify the entity's signature bit is set.
    fn component_id_of<C: Component>(&self, entity: Entity) -> Result<component::Id, Error> {
        let id = self
            .types
            .get::<C>()
            .ok_or(Error::NotFound(type_name::<C>()))?;
        let index = entity.index();
        let signature = self.signatures.get(index).ok_or(Error::OutOfRange {
            index,
            len: self.signatures.len(),
        })?;
        if !signature.test(id) {
            return Err(Error::MissingComponent {
                entity: index,
                component: type_name::<C>(),
            });
        }
        Ok(id)
    }

    // ---------------- systems ----------------

    /// Register a system. Its requirement signature is built once, here, via
    /// [`System::requirements`]; at most one instance of a given system type
    /// may be registered.
    ///
    /// Systems only match entities flushed *after* registration, so register
    /// systems during setup, before creating entities.
    pub fn add_system<S: System>(&mut self, system: S) -> Result<(), Error> {
        let type_id = TypeId::of::<S>();
        if self.system_index(type_id).is_some() {
            return Err(Error::AlreadyRegistered(type_name::<S>()));
        }

        let signature = S::requirements(&self.types)?;
        debug!("registered system {}", type_name::<S>());
        self.systems.push(SystemEntry {
            type_id,
            name: type_name::<S>(),
            signature,
            entities: Vec::new(),
            system: Some(Box::new(system)),
        });
        Ok(())
    }

    /// Remove a system, dropping it and its match list.
    pub fn remove_system<S: System>(&mut self) -> Result<(), Error> {
        let index = self
            .system_index(TypeId::of::<S>())
            .ok_or(Error::NotFound(type_name::<S>()))?;
        self.systems.remove(index);
        debug!("removed system {}", type_name::<S>());
        Ok(())
    }

    /// Returns `true` if a system of type `S` is registered.
    pub fn has_system<S: System>(&self) -> bool {
        self.system_index(TypeId::of::<S>()).is_some()
    }

    /// Get a registered system by type.
    pub fn get_system<S: System>(&self) -> Result<&S, Error> {
        let index = self
            .system_index(TypeId::of::<S>())
            .ok_or(Error::NotFound(type_name::<S>()))?;
        self.systems[index]
            .system
            .as_ref()
            .and_then(|system| system.as_any().downcast_ref::<S>())
            .ok_or(Error::NotFound(type_name::<S>()))
    }

    /// Get mutable access to a registered system by type.
    pub fn get_system_mut<S: System>(&mut self) -> Result<&mut S, Error> {
        let index = self
            .system_index(TypeId::of::<S>())
            .ok_or(Error::NotFound(type_name::<S>()))?;
        self.systems[index]
            .system
            .as_mut()
            .and_then(|system| system.as_any_mut().downcast_mut::<S>())
            .ok_or(Error::NotFound(type_name::<S>()))
    }

    /// The entities currently matched to system `S`.
    pub fn system_entities<S: System>(&self) -> Result<&[Entity], Error> {
        let index = self
            .system_index(TypeId::of::<S>())
            .ok_or(Error::NotFound(type_name::<S>()))?;
        Ok(&self.systems[index].entities)
    }

    /// Run one system's per-frame update.
    ///
    /// The system and a stable copy of its match list are detached for the
    /// duration of the call, so the system gets full mutable access to the
    /// registry while iterating its entities.
    pub fn run_system<S: System>(&mut self, events: &mut EventBus, delta: f32) -> Result<(), Error> {
        let type_id = TypeId::of::<S>();
        let index = self
            .system_index(type_id)
            .ok_or(Error::NotFound(type_name::<S>()))?;
        let mut system = self.systems[index]
            .system
            .take()
            .ok_or(Error::NotFound(type_name::<S>()))?;
        let entities = mem::take(&mut self.systems[index].entities);

        system.update(Context {
            entities: &entities,
            registry: self,
            events,
            delta,
        });

        // Reattach. The system may have removed itself mid-update, in which
        // case it simply drops here.
        if let Some(index) = self.system_index(type_id) {
            let entry = &mut self.systems[index];
            entry.entities = entities;
            entry.system = Some(system);
        }
        Ok(())
    }

    fn system_index(&self, type_id: TypeId) -> Option<usize> {
        self.systems.iter().position(|entry| entry.type_id == type_id)
    }

    // ---------------- the flush ----------------

    /// Apply all deferred structural changes. Call once per frame, before
    /// running systems.
    ///
    /// Phase 1 re-evaluates system membership for every entity created or
    /// whose signature changed since the last flush; phase 2 processes
    /// destroys. Adds run before destroys, so an entity created and destroyed
    /// within the same frame passes through the match lists without any
    /// system update observing it. Each phase walks entities in ascending id
    /// order.
    pub fn update(&mut self) {
        let pending = mem::take(&mut self.pending_match);
        if !pending.is_empty() {
            trace!("flush: matching {} entities", pending.len());
        }
        for entity in pending {
            let signature = &self.signatures[entity.index()];
            for entry in &mut self.systems {
                let matches = signature.contains_all(&entry.signature);
                let present = entry.entities.contains(&entity);
                if matches && !present {
                    trace!("entity {} joins {}", entity.index(), entry.name);
                    entry.entities.push(entity);
                } else if !matches && present {
                    trace!("entity {} leaves {}", entity.index(), entry.name);
                    entry.entities.retain(|e| *e != entity);
                }
            }
        }

        let doomed = mem::take(&mut self.pending_destroy);
        for entity in doomed {
            for entry in &mut self.systems {
                entry.entities.retain(|e| *e != entity);
            }
            self.signatures[entity.index()].clear();
            self.free_ids.push(entity.id());
            debug!("destroyed entity {}, id recycled", entity.index());
        }
    }
}
