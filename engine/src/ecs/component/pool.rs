//! Per-component-type storage pools.
//!
//! A [`Pool<C>`] is a dense vector of `C` indexed directly by entity id:
//! slot `i` belongs to entity id `i`, whether or not that entity currently
//! has the component. Presence is decided by the entity's signature bit, not
//! by the pool, so a slot whose bit is clear holds stale (default or
//! previously-removed) data that must not be read.
//!
//! The registry stores one pool per registered component type behind the
//! type-erased [`AnyPool`] capability, downcasting back to the concrete
//! `Pool<C>` for typed access. Pools grow on demand and never shrink.

use std::any::Any;

use crate::ecs::{component::Component, error::Error};

/// Type-erased view of a pool, enough for the registry to manage storage
/// without knowing the component type.
pub trait AnyPool {
    /// Grow the pool to at least `len` slots.
    fn resize(&mut self, len: usize);

    /// Drop all stored values. Used only at full pool teardown.
    fn clear(&mut self);

    /// The current number of slots.
    fn len(&self) -> usize;

    /// Returns `true` if the pool holds no slots.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Downcast hook for typed read access.
    fn as_any(&self) -> &dyn Any;

    /// Downcast hook for typed write access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense, type-safe storage for one component type, indexed by entity id.
#[derive(Debug, Default)]
pub struct Pool<C: Component> {
    slots: Vec<C>,
}

impl<C: Component> Pool<C> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Append a value, extending the pool by one slot.
    pub fn add(&mut self, value: C) {
        self.slots.push(value);
    }

    /// Overwrite the slot at `index`.
    pub fn set(&mut self, index: usize, value: C) -> Result<(), Error> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Read the slot at `index`.
    ///
    /// The caller must have verified via the entity's signature that the slot
    /// is live; an index past the pool's size is an error, a stale slot is
    /// not detectable here.
    pub fn get(&self, index: usize) -> Result<&C, Error> {
        self.slots.get(index).ok_or(Error::OutOfRange {
            index,
            len: self.slots.len(),
        })
    }

    /// Mutable access to the slot at `index`. Same contract as
    /// [`get`](Pool::get).
    pub fn get_mut(&mut self, index: usize) -> Result<&mut C, Error> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }
}

impl<C: Component> AnyPool for Pool<C> {
    fn resize(&mut self, len: usize) {
        // Grow only; entity ids already covered keep their data.
        if len > self.slots.len() {
            self.slots.resize_with(len, C::default);
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug, Clone, PartialEq)]
    struct Health {
        points: u32,
    }

    #[test]
    fn resize_default_constructs_slots() {
        // Given
        let mut pool = Pool::<Health>::new();
        assert!(AnyPool::is_empty(&pool));

        // When
        pool.resize(4);

        // Then
        assert_eq!(AnyPool::len(&pool), 4);
        assert_eq!(*pool.get(3).unwrap(), Health::default());
    }

    #[test]
    fn resize_never_shrinks() {
        // Given
        let mut pool = Pool::<Health>::new();
        pool.resize(8);
        pool.set(7, Health { points: 7 }).unwrap();

        // When - "shrinking"
        pool.resize(2);

        // Then - existing slots survive
        assert_eq!(AnyPool::len(&pool), 8);
        assert_eq!(pool.get(7).unwrap().points, 7);
    }

    #[test]
    fn set_and_get_round_trip() {
        // Given
        let mut pool = Pool::<Health>::new();
        pool.resize(3);

        // When
        pool.set(1, Health { points: 42 }).unwrap();

        // Then
        assert_eq!(pool.get(1).unwrap().points, 42);
        assert_eq!(pool.get_mut(1).unwrap().points, 42);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let mut pool = Pool::<Health>::new();
        pool.resize(2);

        assert_eq!(
            pool.set(2, Health { points: 1 }),
            Err(Error::OutOfRange { index: 2, len: 2 })
        );
        assert_eq!(pool.get(5), Err(Error::OutOfRange { index: 5, len: 2 }));
    }

    #[test]
    fn add_appends_a_slot() {
        let mut pool = Pool::<Health>::new();
        pool.add(Health { points: 9 });

        assert_eq!(AnyPool::len(&pool), 1);
        assert_eq!(pool.get(0).unwrap().points, 9);
    }

    #[test]
    fn clear_drops_all_values() {
        let mut pool = Pool::<Health>::new();
        pool.resize(5);

        AnyPool::clear(&mut pool);

        assert!(AnyPool::is_empty(&pool));
    }

    #[test]
    fn downcast_through_any_pool() {
        // Given - a pool behind the erased capability
        let mut erased: Box<dyn AnyPool> = Box::new(Pool::<Health>::new());
        erased.resize(1);

        // When
        let pool = erased
            .as_any_mut()
            .downcast_mut::<Pool<Health>>()
            .unwrap();
        pool.set(0, Health { points: 3 }).unwrap();

        // Then
        let pool = erased.as_any().downcast_ref::<Pool<Health>>().unwrap();
        assert_eq!(pool.get(0).unwrap().points, 3);
    }
}
