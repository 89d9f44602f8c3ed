use crate::error::ValidationError;
use crate::model::HotelId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Reservation number handed to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(String);

impl ReservationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ReservationId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ReservationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How many rooms to reserve at which hotels.
///
/// Always non-empty, with each hotel named once and a positive room count; both
/// construction and deserialisation go through the same validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(HotelId, u32)>", into = "Vec<(HotelId, u32)>")]
pub struct ReservationRequest {
    rooms: Vec<(HotelId, u32)>,
}

impl ReservationRequest {
    pub fn new(
        rooms: impl IntoIterator<Item = (HotelId, u32)>,
    ) -> Result<Self, ValidationError> {
        let rooms: Vec<(HotelId, u32)> = rooms.into_iter().collect();
        if rooms.is_empty() {
            return Err(ValidationError::EmptyReservation);
        }
        let mut seen = HashSet::new();
        for (hotel, count) in &rooms {
            if *count == 0 {
                return Err(ValidationError::NonPositiveRoomCount(hotel.clone()));
            }
            if !seen.insert(hotel) {
                return Err(ValidationError::DuplicateHotel(hotel.clone()));
            }
        }
        Ok(Self { rooms })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HotelId, u32)> {
        self.rooms.iter().map(|(hotel, count)| (hotel, *count))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl TryFrom<Vec<(HotelId, u32)>> for ReservationRequest {
    type Error = ValidationError;

    fn try_from(rooms: Vec<(HotelId, u32)>) -> Result<Self, Self::Error> {
        Self::new(rooms)
    }
}

impl From<ReservationRequest> for Vec<(HotelId, u32)> {
    fn from(request: ReservationRequest) -> Self {
        request.rooms
    }
}
