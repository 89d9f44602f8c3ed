//! Pure data structures: hotels, rooms and reservation requests.
//!
//! Nothing in here knows about actors; the state machines are plain synchronous code
//! that the [`hotel_actor`](crate::hotel_actor) wraps.

pub mod hotel;
pub mod reservation;

pub use hotel::*;
pub use reservation::*;
