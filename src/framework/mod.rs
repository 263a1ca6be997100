//! Generic actor framework for session-scoped state.
//!
//! This module provides the building blocks the cart store and the checkout
//! orchestrator are built on: one state value per actor, commands processed
//! one at a time, and every state change published to subscribers.
//!
//! # Main Components
//!
//! - [`SessionEntity`] - Trait that session state types implement
//! - [`SessionActor`] - Generic actor that owns the state and runs the command loop
//! - [`SessionClient`] - Typed command sender plus state subscription
//! - [`FrameworkError`] - Transport errors
//!
//! # Testing
//!
//! See [`mock`] for utilities to test clients without spawning actors.

pub mod core;
pub mod mock;

pub use self::core::*;
