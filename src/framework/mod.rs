//! Generic actor framework for message-driven services.
//!
//! This module provides the building blocks every component of the system runs on.
//!
//! # Main Components
//!
//! - [`Actor`] - Trait that components implement to run as isolated processes
//! - [`Addr`] - Cloneable mailbox handle; [`ask`] adds request/response on top
//! - [`Registry`] - Service directory with membership subscriptions
//! - [`GroupRouter`] - Round-robin delivery over a registry group
//! - [`FrameworkError`] - Transport-level failures
//!
//! # Testing
//!
//! See [`mock`] module for mock actors that stand in for real actors.

pub mod core;
pub mod mock;
pub mod registry;
pub mod router;

// Re-export core types for convenience
pub use core::{ask, spawn, Actor, ActorId, Addr, Context, FrameworkError};
pub use registry::{Registry, ServiceEvent, ServiceKey, Subscription};
pub use router::GroupRouter;
