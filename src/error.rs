//! Error types for requests made to the rental system.

use crate::model::{HotelError, HotelId, ReservationId};
use thiserror::Error;

/// Input rejected before any actor is involved.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("A reservation must name at least one hotel")]
    EmptyReservation,

    #[error("Room count for hotel {0} must be positive")]
    NonPositiveRoomCount(HotelId),

    #[error("Hotel {0} appears more than once in the reservation")]
    DuplicateHotel(HotelId),

    #[error("Hotel name must not be empty")]
    EmptyHotelName,

    #[error("A hotel needs at least one room")]
    NoRooms,
}

/// Errors answered to a client request.
///
/// The saga variants carry every hotel failure they collected; their `Display` renders
/// a header line followed by one `  - <error>` line per failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RentError {
    #[error("There is no hotel with ID {0}")]
    UnknownHotel(HotelId),

    #[error("There is no reservation with number {0}")]
    UnknownReservation(ReservationId),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Failed to make the reservation:{}", bullets(.0))]
    ReservationFailed(Vec<HotelError>),

    #[error("Failed to cancel the reservation:{}", bullets(.0))]
    CancellationFailed(Vec<HotelError>),

    #[error("Failed to confirm the reservation:{}", bullets(.0))]
    ConfirmationFailed(Vec<HotelError>),

    #[error("Reservation {0} is still being processed")]
    ReservationBusy(ReservationId),

    #[error("No broker available")]
    NoBroker,

    #[error("The system is shutting down")]
    ShuttingDown,
}

fn bullets(errors: &[HotelError]) -> String {
    errors.iter().map(|err| format!("\n  - {err}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saga_failures_render_one_line_per_hotel() {
        let err = RentError::ReservationFailed(vec![
            HotelError::HotelGone { hotel: "a".into() },
            HotelError::InsufficientRooms {
                hotel: "b".into(),
                requested: 3,
                available: 1,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Failed to make the reservation:\n  - Hotel a no longer exists\n  - Trying to reserve 3 rooms at hotel b while only 1 rooms are available."
        );
    }

    #[test]
    fn test_validation_errors_convert() {
        let err: RentError = ValidationError::NoRooms.into();
        assert_eq!(err.to_string(), "A hotel needs at least one room");
    }
}
