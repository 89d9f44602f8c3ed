//! Type-safe request/response access to the running system.

pub mod rent_a_room_client;

pub use rent_a_room_client::*;
