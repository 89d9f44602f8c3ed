//! Short-lived actors spawned per request to collect replies from many hotels.

pub mod data;
pub mod reservation;

pub use data::DataAggregator;
pub use reservation::ReservationAggregator;
