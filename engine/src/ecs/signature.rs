//! Component signatures.
//!
//! A [`Signature`] is a fixed-width bit vector with one bit per registered
//! component type. Entities carry one describing which components they hold;
//! systems carry one describing which components they require. The registry
//! matches entities to systems by testing whether the system's signature is a
//! subset of the entity's.

use fixedbitset::FixedBitSet;

use crate::ecs::{component, error::Error};

/// The maximum number of distinct component types a signature can describe.
///
/// This is a process-wide hard cap: registering more component types fails
/// with [`Error::CapacityExceeded`].
pub const MAX_COMPONENT_TYPES: usize = 32;

/// A fixed-width set of component type ids.
///
/// Two signatures combine via subset testing to answer "does this entity have
/// all of this system's required components" (see
/// [`contains_all`](Signature::contains_all)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    bits: FixedBitSet,
}

impl Default for Signature {
    fn default() -> Self {
        Self::new()
    }
}

impl Signature {
    /// Create a signature with no bits set.
    pub fn new() -> Self {
        Self {
            bits: FixedBitSet::with_capacity(MAX_COMPONENT_TYPES),
        }
    }

    /// Set the bit for the given component type id.
    #[inline]
    pub fn set(&mut self, id: component::Id) {
        self.bits.insert(id.index());
    }

    /// Clear the bit for the given component type id.
    #[inline]
    pub fn reset(&mut self, id: component::Id) {
        self.bits.set(id.index(), false);
    }

    /// Test the bit for the given component type id.
    #[inline]
    pub fn test(&self, id: component::Id) -> bool {
        self.bits.contains(id.index())
    }

    /// Clear all bits.
    #[inline]
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Returns `true` if no bits are set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    /// Returns `true` if every bit set in `required` is also set here.
    ///
    /// This is the system-matching predicate:
    /// `(entity & required) == required`.
    #[inline]
    pub fn contains_all(&self, required: &Signature) -> bool {
        required.bits.is_subset(&self.bits)
    }

    /// Register component type `C` and set its bit, consuming and returning
    /// the signature so requirements can be chained:
    ///
    /// ```rust,ignore
    /// let signature = Signature::new()
    ///     .require::<Transform>(types)?
    ///     .require::<Rigidbody>(types)?;
    /// ```
    pub fn require<C: component::Component>(
        mut self,
        types: &component::Registry,
    ) -> Result<Self, Error> {
        self.set(types.register::<C>()?);
        Ok(self)
    }
}
