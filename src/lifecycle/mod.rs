//! Runtime orchestration and lifecycle management.
//!
//! # Main Components
//!
//! - [`RentARoomSystem`] - Starts the root coordinator and its brokers, and shuts everything down
//! - [`Config`] - Startup settings with environment overrides
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod config;
pub mod system;
pub mod tracing;

pub use config::*;
pub use system::*;
pub use self::tracing::setup_tracing;
