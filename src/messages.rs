//! Message protocols spoken between the actors.
//!
//! Every customer-facing request carries a [`Reply`] channel and is answered exactly
//! once with a [`Status`] or a [`RentError`]. Internal traffic between actors is
//! fire-and-forget and names its reply target as an [`Addr`].

use crate::error::RentError;
use crate::framework::{Addr, ServiceEvent};
use crate::model::{HotelError, HotelId, ReservationId, ReservationRequest, RoomId};
use std::fmt;
use tokio::sync::oneshot;
use tracing::debug;

/// Where the answer to a customer request goes.
pub type Reply = oneshot::Sender<Result<Status, RentError>>;

/// Answers a request. A requester that already gave up is not an error.
pub fn respond(reply_to: Reply, outcome: Result<Status, RentError>) {
    if reply_to.send(outcome).is_err() {
        debug!("Requester went away before the reply arrived");
    }
}

/// Successful outcome of a customer request.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    HotelCreated { name: String, id: HotelId },
    HotelDeleted { name: String, id: HotelId },
    /// One description block per hotel, separated by a blank line.
    HotelReport(String),
    NoHotels,
    ReservationPlaced(ReservationId),
    ReservationCancelled(ReservationId),
    ReservationConfirmed(ReservationId),
    BrokerSpawned(String),
}

impl Status {
    pub fn hotel_id(&self) -> Option<&HotelId> {
        match self {
            Self::HotelCreated { id, .. } | Self::HotelDeleted { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn reservation_id(&self) -> Option<&ReservationId> {
        match self {
            Self::ReservationPlaced(id)
            | Self::ReservationCancelled(id)
            | Self::ReservationConfirmed(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HotelCreated { name, id } => {
                write!(f, "Hotel \"{name}\" successfully created with ID: {id}")
            }
            Self::HotelDeleted { name, id } => {
                write!(f, "Successfully deleted hotel {name} (ID: {id})")
            }
            Self::HotelReport(report) => f.write_str(report),
            Self::NoHotels => f.write_str("There are currently no hotels! Create a hotel first."),
            Self::ReservationPlaced(id) => write!(f, "Your reservation number is: {id}"),
            Self::ReservationCancelled(id) => {
                write!(f, "Your reservation with number {id} is successfully cancelled.")
            }
            Self::ReservationConfirmed(id) => {
                write!(f, "Your reservation with number {id} is successfully confirmed.")
            }
            Self::BrokerSpawned(name) => {
                write!(f, "Successfully created an agent with the name {name}")
            }
        }
    }
}

/// Customer requests a broker handles.
#[derive(Debug)]
pub enum Request {
    ListHotels {
        reply_to: Reply,
    },
    DeleteHotel {
        hotel: HotelId,
        reply_to: Reply,
    },
    Reserve {
        request: ReservationRequest,
        reply_to: Reply,
    },
    CancelReservation {
        reservation: ReservationId,
        reply_to: Reply,
    },
    ConfirmReservation {
        reservation: ReservationId,
        reply_to: Reply,
    },
}

impl Request {
    /// Answers the request with `error` without handling it.
    pub fn reject(self, error: RentError) {
        let reply_to = match self {
            Self::ListHotels { reply_to }
            | Self::DeleteHotel { reply_to, .. }
            | Self::Reserve { reply_to, .. }
            | Self::CancelReservation { reply_to, .. }
            | Self::ConfirmReservation { reply_to, .. } => reply_to,
        };
        respond(reply_to, Err(error));
    }
}

/// Protocol of a hotel manager.
#[derive(Debug)]
pub enum HotelCommand {
    Describe {
        report_to: Addr<DataMessage>,
    },
    Reserve {
        reservation: ReservationId,
        rooms: u32,
        reply_to: Addr<SagaMessage>,
    },
    Cancel {
        reservation: ReservationId,
        reply_to: Addr<SagaMessage>,
    },
    Confirm {
        reservation: ReservationId,
        reply_to: Addr<SagaMessage>,
    },
    /// Deletes the hotel. `reply_to` is `None` during system shutdown.
    Stop {
        reply_to: Option<Reply>,
    },
}

/// Protocol of a data aggregator.
#[derive(Debug)]
pub enum DataMessage {
    Expect { hotels: usize, report_to: Reply },
    Description(String),
    /// A hotel that stopped before it could describe itself.
    Gone,
}

/// Protocol of a reservation aggregator.
#[derive(Debug)]
pub enum SagaMessage {
    Expect {
        hotels: usize,
        report_to: Reply,
    },
    Reserved {
        hotel: Addr<HotelCommand>,
        result: Result<Vec<RoomId>, HotelError>,
    },
    Cancel {
        reply_to: Reply,
    },
    Confirm {
        reply_to: Reply,
    },
    Settled {
        hotel: HotelId,
        result: Result<(), HotelError>,
    },
    Shutdown,
}

/// Protocol of a broker.
#[derive(Debug)]
pub enum BrokerCommand {
    Request(Request),
    HotelsChanged(ServiceEvent<HotelCommand>),
    AggregatorStopped { reservation: ReservationId },
    /// A cancel or confirm passed on by a broker that does not own `reservation`.
    /// `unvisited` holds the brokers that have not been asked yet.
    Relay {
        reservation: ReservationId,
        settle: SagaMessage,
        unvisited: Vec<Addr<BrokerCommand>>,
    },
    SpawnBroker { reply_to: Reply },
    Shutdown,
}

/// Protocol of the root coordinator.
#[derive(Debug)]
pub enum RootCommand {
    Route(Request),
    CreateHotel {
        name: String,
        rooms: u32,
        reply_to: Reply,
    },
    SpawnBroker {
        reply_to: Reply,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}
