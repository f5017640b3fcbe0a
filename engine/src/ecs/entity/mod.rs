//! Entity handles.
//!
//! An [`Entity`] is a lightweight identity: an integer id and nothing else.
//! All of an entity's data lives in the [`Registry`](crate::ecs::Registry);
//! the handle is a capability to reach into that storage, not an owner of it.
//!
//! Ids are unique among live entities and recycled FIFO after destruction.
//! There is no generation counter: a handle kept across a destroy-and-flush
//! boundary may silently alias a different logical entity. Callers that
//! retain handles across frames must re-validate them; the core does not
//! detect stale use.

mod reference;

pub use reference::{EntityMut, EntityRef};

/// An entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Get the index of this id in indexable storage (e.g. the signature
    /// table and component pools).
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A handle to a game object.
///
/// Equality and ordering compare by id only: two handles with equal id are
/// the same entity regardless of how they were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity {
    id: Id,
}

impl Entity {
    /// Construct a handle for a known id. Only the registry mints handles
    /// for fresh ids; this is exposed to the crate for that purpose.
    #[inline]
    pub(crate) const fn new(id: Id) -> Self {
        Self { id }
    }

    /// Get the id of this entity.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the index of this entity in indexable storage.
    #[inline]
    pub fn index(&self) -> usize {
        self.id.index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_id_only() {
        let a = Entity::new(Id::from(7));
        let b = Entity::new(Id::from(7));
        let c = Entity::new(Id::from(8));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ordering_follows_ids() {
        let low = Entity::new(Id::from(1));
        let high = Entity::new(Id::from(2));

        assert!(low < high);
    }

    #[test]
    fn index_matches_id() {
        let entity = Entity::new(Id::from(42));
        assert_eq!(entity.index(), 42);
        assert_eq!(entity.id().index(), 42);
    }
}
