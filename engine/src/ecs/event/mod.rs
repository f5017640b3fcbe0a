pub mod bus;

pub use bus::{EventBus, Subscription};

/// Marker trait for event types.
///
/// Events are plain data carried by value through
/// [`EventBus::emit`](bus::EventBus::emit); the only requirement is that they
/// own their data (`'static`), since handlers are stored across frames.
pub trait Event: 'static {}
