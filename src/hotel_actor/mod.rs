//! Hotel manager: the actor that owns one hotel's rooms.
//!
//! Each hotel runs as its own actor, named by the hotel id and registered under
//! [`HOTEL_SERVICE`]. It remembers which rooms it holds for which reservation, so the
//! saga only ever speaks in reservation ids.

use crate::error::RentError;
use crate::framework::{spawn, Actor, Addr, Context, Registry, ServiceKey};
use crate::messages::{respond, DataMessage, HotelCommand, SagaMessage, Status};
use crate::model::{Hotel, HotelError, ReservationId, RoomId};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Registry group every hotel manager joins.
pub const HOTEL_SERVICE: ServiceKey<HotelCommand> = ServiceKey::new("hotel-manager");

pub struct HotelManager {
    hotel: Hotel,
    held: HashMap<ReservationId, Vec<RoomId>>,
}

impl HotelManager {
    pub fn new(hotel: Hotel) -> Self {
        Self {
            hotel,
            held: HashMap::new(),
        }
    }

    /// Spawns a manager for `hotel` and registers it before returning, so a lookup
    /// right after creation already finds it.
    pub fn start(hotel: Hotel, registry: &Registry) -> Addr<HotelCommand> {
        let name = hotel.id().to_string();
        let addr = spawn(name, Self::new(hotel));
        registry.register(HOTEL_SERVICE, addr.clone());
        addr
    }

    fn reserve(
        &mut self,
        reservation: ReservationId,
        rooms: u32,
    ) -> Result<Vec<RoomId>, HotelError> {
        let held = self.hotel.reserve_rooms(rooms)?;
        self.held
            .entry(reservation)
            .or_default()
            .extend(held.iter().copied());
        Ok(held)
    }

    /// Applies `step` to every room held for `reservation`. All rooms are attempted;
    /// the first failure is reported.
    fn settle(
        &mut self,
        reservation: &ReservationId,
        step: fn(&mut Hotel, RoomId) -> Result<(), HotelError>,
    ) -> Result<(), HotelError> {
        let rooms = self
            .held
            .remove(reservation)
            .ok_or_else(|| HotelError::UnknownReservation {
                hotel: self.hotel.id().clone(),
            })?;
        let mut outcome = Ok(());
        for room in rooms {
            if let Err(err) = step(&mut self.hotel, room) {
                warn!(hotel = %self.hotel.id(), %room, error = %err, "Room could not be settled");
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        outcome
    }

    fn gone(&self) -> HotelError {
        HotelError::HotelGone {
            hotel: self.hotel.id().clone(),
        }
    }
}

fn reply_to_saga(saga: &Addr<SagaMessage>, msg: SagaMessage) {
    if saga.tell(msg).is_err() {
        debug!(saga = %saga.name(), "Reservation aggregator already stopped");
    }
}

#[async_trait]
impl Actor for HotelManager {
    type Message = HotelCommand;

    async fn started(&mut self, _ctx: &mut Context<HotelCommand>) {
        info!(
            hotel = %self.hotel.id(),
            name = %self.hotel.name(),
            rooms = self.hotel.rooms().len(),
            "Hotel opened"
        );
    }

    async fn handle(&mut self, msg: HotelCommand, ctx: &mut Context<HotelCommand>) {
        match msg {
            HotelCommand::Describe { report_to } => {
                let description = DataMessage::Description(self.hotel.describe());
                if report_to.tell(description).is_err() {
                    debug!(hotel = %self.hotel.id(), "Data aggregator already stopped");
                }
            }
            HotelCommand::Reserve {
                reservation,
                rooms,
                reply_to,
            } => {
                let result = self.reserve(reservation.clone(), rooms);
                match &result {
                    Ok(_) => info!(hotel = %self.hotel.id(), %reservation, rooms, "Rooms held"),
                    Err(err) => warn!(
                        hotel = %self.hotel.id(),
                        %reservation,
                        error = %err,
                        "Reservation refused"
                    ),
                }
                reply_to_saga(
                    &reply_to,
                    SagaMessage::Reserved {
                        hotel: ctx.addr().clone(),
                        result,
                    },
                );
            }
            HotelCommand::Cancel {
                reservation,
                reply_to,
            } => {
                let result = self.settle(&reservation, Hotel::cancel_reservation);
                if result.is_ok() {
                    info!(hotel = %self.hotel.id(), %reservation, "Rooms released");
                }
                reply_to_saga(
                    &reply_to,
                    SagaMessage::Settled {
                        hotel: self.hotel.id().clone(),
                        result,
                    },
                );
            }
            HotelCommand::Confirm {
                reservation,
                reply_to,
            } => {
                let result = self.settle(&reservation, Hotel::confirm_reservation);
                if result.is_ok() {
                    info!(hotel = %self.hotel.id(), %reservation, "Rooms confirmed");
                }
                reply_to_saga(
                    &reply_to,
                    SagaMessage::Settled {
                        hotel: self.hotel.id().clone(),
                        result,
                    },
                );
            }
            HotelCommand::Stop { reply_to } => {
                info!(hotel = %self.hotel.id(), name = %self.hotel.name(), "Hotel deleted");
                if let Some(reply_to) = reply_to {
                    respond(
                        reply_to,
                        Ok(Status::HotelDeleted {
                            name: self.hotel.name().to_owned(),
                            id: self.hotel.id().clone(),
                        }),
                    );
                }
                ctx.stop();
            }
        }
    }

    fn undelivered(&mut self, msg: HotelCommand, ctx: &Context<HotelCommand>) {
        match msg {
            HotelCommand::Describe { report_to } => {
                if report_to.tell(DataMessage::Gone).is_err() {
                    debug!(hotel = %self.hotel.id(), "Data aggregator already stopped");
                }
            }
            HotelCommand::Reserve { reply_to, .. } => reply_to_saga(
                &reply_to,
                SagaMessage::Reserved {
                    hotel: ctx.addr().clone(),
                    result: Err(self.gone()),
                },
            ),
            HotelCommand::Cancel { reply_to, .. } | HotelCommand::Confirm { reply_to, .. } => {
                reply_to_saga(
                    &reply_to,
                    SagaMessage::Settled {
                        hotel: self.hotel.id().clone(),
                        result: Err(self.gone()),
                    },
                )
            }
            HotelCommand::Stop { reply_to } => {
                if let Some(reply_to) = reply_to {
                    respond(reply_to, Err(RentError::UnknownHotel(self.hotel.id().clone())));
                }
            }
        }
    }
}
