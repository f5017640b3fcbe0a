//! Component management for the ECS.
//!
//! Components are plain data records attached to entities, keyed by their
//! Rust type. This module provides:
//!
//! - [`Component`]: the trait bound every component type must satisfy
//! - [`Id`]: the dense integer identifier assigned to each component type
//! - [`Registry`]: assignment and lookup of component type ids
//! - [`Pool`]: per-type dense storage indexed by entity id
//!
//! Component types must be default-constructible because pools grow by
//! default-constructing empty slots; a slot only becomes meaningful once the
//! owning entity's signature bit is set.

mod pool;
pub mod registry;

pub use pool::{AnyPool, Pool};
pub use registry::Registry;

/// A component identifier. Dense, starting at zero, assigned once per
/// distinct component type and never reused.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Construct a component Id from a raw u32 value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the index of this id in indexable storage (e.g. the pool table).
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// A trait representing a component in the ECS.
///
/// Blanket-implemented for every `Default + 'static` type: the `Default`
/// bound is what lets pools grow with placeholder slots ahead of the entity
/// actually receiving a value.
pub trait Component: Default + 'static {}

impl<T: Default + 'static> Component for T {}
