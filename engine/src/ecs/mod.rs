pub mod component;
pub mod entity;
pub mod event;
pub mod registry;
pub mod signature;
pub mod system;

mod error;

pub use component::Component;
pub use entity::Entity;
pub use error::Error;
pub use event::{Event, EventBus, Subscription};
pub use registry::Registry;
pub use signature::{MAX_COMPONENT_TYPES, Signature};
pub use system::{Context, System};
