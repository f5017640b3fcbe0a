//! Error type for ECS contract violations.
//!
//! The original error policy of a typical hand-rolled ECS is "undefined
//! behavior on misuse". Here every precondition violation surfaces as a typed
//! error so that logic bugs in systems fail fast instead of reading stale
//! slots or dangling match lists.

use thiserror::Error;

/// Errors that can occur in the ECS core.
///
/// All variants represent caller contract violations rather than recoverable
/// runtime faults; the core never retries or masks them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Indexed a pool or the signature table past its current size.
    #[error("index {index} out of range (len {len})")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The current size of the indexed storage.
        len: usize,
    },

    /// Looked up a system or component type that was never registered.
    #[error("{0} is not registered")]
    NotFound(&'static str),

    /// Registered more distinct component types than a signature can hold.
    #[error("component type limit of {limit} exceeded")]
    CapacityExceeded {
        /// The fixed signature bit-width.
        limit: usize,
    },

    /// Registered a second instance of a system type.
    #[error("system {0} is already registered")]
    AlreadyRegistered(&'static str),

    /// Read a component from an entity whose signature bit is clear.
    #[error("entity {entity} has no {component}")]
    MissingComponent {
        /// The entity id.
        entity: usize,
        /// The component type name.
        component: &'static str,
    },
}
