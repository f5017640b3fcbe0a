//! Ember is a small data-oriented core for 2D games.
//!
//! The crate is organized around a classic Entity Component System: game
//! objects are plain integer [`Entity`](ecs::Entity) handles, their data lives
//! in per-type [`Pool`](ecs::component::Pool)s owned by a central
//! [`Registry`](ecs::Registry), and behavior is expressed as
//! [`System`](ecs::System)s matched to entities by bitset
//! [`Signature`](ecs::Signature)s. Cross-system notifications go through a
//! synchronous [`EventBus`](ecs::EventBus).
//!
//! Rendering, audio, input, and the frame loop itself are external drivers
//! that consume this crate's public contract; nothing here blocks, spawns
//! threads, or schedules work.

pub mod ecs;
