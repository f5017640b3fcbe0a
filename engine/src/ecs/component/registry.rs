//! Registration of component types.
//!
//! The registry maps each distinct component type to a stable [`Id`],
//! assigning a new one on first use. Ids are dense from zero and never
//! reused, even if every instance of a type is removed, which makes them
//! directly usable as signature bit positions and pool-table indices.
//!
//! The registry uses lock-free reads for the TypeId→Id lookup via `DashMap`,
//! so the hot path (resolving an already-registered type inside
//! `add_component`/`get_component`) never takes a lock. The id space is
//! bounded by [`MAX_COMPONENT_TYPES`]; overflowing it is reported rather than
//! silently corrupting signatures.

use std::{
    any::{TypeId, type_name},
    sync::RwLock,
    sync::atomic::{AtomicU32, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};

use crate::ecs::{
    component::{Component, Id},
    error::Error,
    signature::MAX_COMPONENT_TYPES,
};

/// Assigns and looks up component type ids.
///
/// Owned by the ECS [`Registry`](crate::ecs::Registry); there is no process
/// global counter, so two independent worlds each get their own dense id
/// space.
pub struct Registry {
    /// Map from TypeId to component Id. Lock-free reads via sharded
    /// concurrent hashmap.
    type_map: DashMap<TypeId, Id>,

    /// Type names indexed by id, for diagnostics. Protected by RwLock for
    /// rare writes.
    names: RwLock<Vec<&'static str>>,

    /// Next available component identifier.
    next_id: AtomicU32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a new, empty component type registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            type_map: DashMap::new(),
            names: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(0),
        }
    }

    /// Register component type `C` and get its identifier.
    ///
    /// Idempotent: if `C` is already registered, the existing id is returned.
    /// Fails with [`Error::CapacityExceeded`] once more than
    /// [`MAX_COMPONENT_TYPES`] distinct types have been registered.
    pub fn register<C: Component>(&self) -> Result<Id, Error> {
        let type_id = TypeId::of::<C>();

        // Fast path: already registered (lock-free read).
        if let Some(id) = self.type_map.get(&type_id) {
            return Ok(*id);
        }

        // Slow path: the entry API closes the race where two callers both
        // miss the fast path.
        match self.type_map.entry(type_id) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
                if raw as usize >= MAX_COMPONENT_TYPES {
                    // The counter is past the cap for good; every further
                    // first-time registration fails the same way.
                    return Err(Error::CapacityExceeded {
                        limit: MAX_COMPONENT_TYPES,
                    });
                }
                let id = Id::new(raw);

                let mut names = self.names.write().unwrap();
                debug_assert_eq!(names.len(), raw as usize);
                names.push(type_name::<C>());

                entry.insert(id);
                Ok(id)
            }
        }
    }

    /// Get the id for component type `C`, if registered.
    #[inline]
    pub fn get<C: Component>(&self) -> Option<Id> {
        self.type_map.get(&TypeId::of::<C>()).map(|entry| *entry)
    }

    /// Get the type name recorded for an id, if assigned.
    #[inline]
    pub fn name_of(&self, id: Id) -> Option<&'static str> {
        self.names.read().unwrap().get(id.index()).copied()
    }

    /// The number of distinct component types registered so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.type_map.len()
    }

    /// Returns `true` if no component types have been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.type_map.is_empty()
    }
}
