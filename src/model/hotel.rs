use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a hotel. Doubles as the name of the actor managing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HotelId(String);

impl HotelId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HotelId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for HotelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for HotelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(Uuid);

impl RoomId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Available,
    PendingReservation,
    Reserved,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "Available",
            Self::PendingReservation => "PendingReservation",
            Self::Reserved => "Reserved",
        };
        f.write_str(label)
    }
}

/// What a caller tried to do with a held room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomAction {
    Cancel,
    Confirm,
}

impl fmt::Display for RoomAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancel => f.write_str("remove a reservation from"),
            Self::Confirm => f.write_str("confirm a reservation on"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    id: RoomId,
    status: RoomStatus,
}

impl Room {
    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }
}

/// Errors raised by hotel operations.
///
/// Carried back to the reservation saga, which aggregates them into the final answer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HotelError {
    #[error("Trying to reserve {requested} rooms at hotel {hotel} while only {available} rooms are available.")]
    InsufficientRooms {
        hotel: HotelId,
        requested: u32,
        available: usize,
    },

    #[error("Hotel {hotel} has no room {room}")]
    UnknownRoom { hotel: HotelId, room: RoomId },

    #[error("Trying to {action} room {room} while it's status is {actual} instead of PendingReservation")]
    InvalidTransition {
        action: RoomAction,
        room: RoomId,
        actual: RoomStatus,
    },

    #[error("Hotel {hotel} holds no rooms for this reservation")]
    UnknownReservation { hotel: HotelId },

    #[error("Hotel {hotel} no longer exists")]
    HotelGone { hotel: HotelId },
}

/// A named hotel and its rooms, in creation order.
///
/// Room state only moves along `Available -> PendingReservation -> Reserved` or back
/// from `PendingReservation` to `Available`. A reserved room stays reserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    id: HotelId,
    name: String,
    rooms: Vec<Room>,
}

impl Hotel {
    /// Creates a hotel with `room_count` available rooms and a fresh id.
    pub fn new(name: impl Into<String>, room_count: u32) -> Self {
        let rooms = (0..room_count)
            .map(|_| Room {
                id: RoomId::generate(),
                status: RoomStatus::Available,
            })
            .collect();
        Self {
            id: HotelId::generate(),
            name: name.into(),
            rooms,
        }
    }

    pub fn id(&self) -> &HotelId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Rooms that are pending or reserved.
    pub fn occupied(&self) -> usize {
        self.rooms
            .iter()
            .filter(|room| room.status != RoomStatus::Available)
            .count()
    }

    pub fn available(&self) -> usize {
        self.rooms.len() - self.occupied()
    }

    pub fn status_of(&self, room: RoomId) -> Option<RoomStatus> {
        self.rooms.iter().find(|r| r.id == room).map(Room::status)
    }

    /// Puts `count` available rooms on hold, or none at all.
    ///
    /// Rooms are taken in creation order.
    pub fn reserve_rooms(&mut self, count: u32) -> Result<Vec<RoomId>, HotelError> {
        let available = self.available();
        if count as usize > available {
            return Err(HotelError::InsufficientRooms {
                hotel: self.id.clone(),
                requested: count,
                available,
            });
        }

        let held: Vec<RoomId> = self
            .rooms
            .iter_mut()
            .filter(|room| room.status == RoomStatus::Available)
            .take(count as usize)
            .map(|room| {
                room.status = RoomStatus::PendingReservation;
                room.id
            })
            .collect();
        Ok(held)
    }

    /// Releases a held room.
    pub fn cancel_reservation(&mut self, room: RoomId) -> Result<(), HotelError> {
        self.transition(room, RoomAction::Cancel)
    }

    /// Makes a held room a final reservation.
    pub fn confirm_reservation(&mut self, room: RoomId) -> Result<(), HotelError> {
        self.transition(room, RoomAction::Confirm)
    }

    fn transition(&mut self, room: RoomId, action: RoomAction) -> Result<(), HotelError> {
        let hotel = &self.id;
        let target = self
            .rooms
            .iter_mut()
            .find(|r| r.id == room)
            .ok_or_else(|| HotelError::UnknownRoom {
                hotel: hotel.clone(),
                room,
            })?;
        if target.status != RoomStatus::PendingReservation {
            return Err(HotelError::InvalidTransition {
                action,
                room,
                actual: target.status,
            });
        }
        target.status = match action {
            RoomAction::Cancel => RoomStatus::Available,
            RoomAction::Confirm => RoomStatus::Reserved,
        };
        Ok(())
    }

    /// Human-readable status block, one line per room.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Hotel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hotel: {} (ID: {})", self.name, self.id)?;
        write!(
            f,
            " - Rooms available: {}/{}",
            self.available(),
            self.rooms.len()
        )?;
        for room in &self.rooms {
            write!(f, "\n    - RoomID: {} ({})", room.id, room.status)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_hotel_has_only_available_rooms() {
        let hotel = Hotel::new("Ritz", 3);
        assert_eq!(hotel.rooms().len(), 3);
        assert_eq!(hotel.available(), 3);
        assert_eq!(hotel.occupied(), 0);
    }

    #[test]
    fn test_reserve_holds_rooms_in_creation_order() {
        let mut hotel = Hotel::new("Ritz", 3);
        let first_two: Vec<RoomId> = hotel.rooms()[..2].iter().map(Room::id).collect();

        let held = hotel.reserve_rooms(2).unwrap();
        assert_eq!(held, first_two);
        assert_eq!(hotel.occupied(), 2);
        assert_eq!(hotel.status_of(held[0]), Some(RoomStatus::PendingReservation));
    }

    #[test]
    fn test_reserve_is_all_or_nothing() {
        let mut hotel = Hotel::new("Ritz", 2);
        hotel.reserve_rooms(1).unwrap();

        let err = hotel.reserve_rooms(2).unwrap_err();
        assert_eq!(
            err,
            HotelError::InsufficientRooms {
                hotel: hotel.id().clone(),
                requested: 2,
                available: 1,
            }
        );
        assert_eq!(hotel.occupied(), 1);
        assert_eq!(
            err.to_string(),
            format!(
                "Trying to reserve 2 rooms at hotel {} while only 1 rooms are available.",
                hotel.id()
            )
        );
    }

    #[test]
    fn test_cancel_frees_the_room() {
        let mut hotel = Hotel::new("Ritz", 1);
        let room = hotel.reserve_rooms(1).unwrap()[0];
        hotel.cancel_reservation(room).unwrap();
        assert_eq!(hotel.status_of(room), Some(RoomStatus::Available));
        assert_eq!(hotel.available(), 1);
    }

    #[test]
    fn test_confirmed_room_is_final() {
        let mut hotel = Hotel::new("Ritz", 1);
        let room = hotel.reserve_rooms(1).unwrap()[0];
        hotel.confirm_reservation(room).unwrap();
        assert_eq!(hotel.status_of(room), Some(RoomStatus::Reserved));

        let err = hotel.cancel_reservation(room).unwrap_err();
        assert_eq!(
            err,
            HotelError::InvalidTransition {
                action: RoomAction::Cancel,
                room,
                actual: RoomStatus::Reserved,
            }
        );
        assert_eq!(
            err.to_string(),
            format!(
                "Trying to remove a reservation from room {room} while it's status is Reserved instead of PendingReservation"
            )
        );
        assert_eq!(hotel.occupied(), 1);
    }

    #[test]
    fn test_transition_of_available_room_is_rejected() {
        let mut hotel = Hotel::new("Ritz", 1);
        let room = hotel.rooms()[0].id();
        let err = hotel.confirm_reservation(room).unwrap_err();
        assert!(matches!(
            err,
            HotelError::InvalidTransition {
                action: RoomAction::Confirm,
                actual: RoomStatus::Available,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            format!(
                "Trying to confirm a reservation on room {room} while it's status is Available instead of PendingReservation"
            )
        );
    }

    #[test]
    fn test_unknown_room() {
        let mut hotel = Hotel::new("Ritz", 1);
        let stranger = Hotel::new("Other", 1).rooms()[0].id();
        assert!(matches!(
            hotel.cancel_reservation(stranger),
            Err(HotelError::UnknownRoom { .. })
        ));
    }

    #[test]
    fn test_describe_lists_every_room() {
        let mut hotel = Hotel::new("Ritz", 2);
        let held = hotel.reserve_rooms(1).unwrap()[0];
        let text = hotel.describe();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], format!("Hotel: Ritz (ID: {})", hotel.id()));
        assert_eq!(lines[1], " - Rooms available: 1/2");
        assert_eq!(
            lines[2],
            format!("    - RoomID: {held} (PendingReservation)")
        );
        assert!(lines[3].ends_with("(Available)"));
        assert_eq!(lines.len(), 4);
    }
}
