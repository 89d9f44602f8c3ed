use crate::error::RentError;
use crate::framework::{ask, Addr, FrameworkError};
use crate::messages::{Reply, Request, RootCommand, Status};
use crate::model::{HotelId, ReservationId, ReservationRequest};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Why a client call did not produce a [`Status`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// The request never got an answer. On [`FrameworkError::Timeout`] the outcome is
    /// unknown: the system may still complete the request.
    #[error(transparent)]
    Framework(#[from] FrameworkError),

    /// The system answered with a failure.
    #[error(transparent)]
    Rejected(#[from] RentError),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Framework(FrameworkError::Timeout(_)))
    }
}

/// Request/response access to the root coordinator, bounded by a timeout per call.
#[derive(Clone)]
pub struct RentARoomClient {
    root: Addr<RootCommand>,
    timeout: Duration,
}

impl RentARoomClient {
    pub fn new(root: Addr<RootCommand>, timeout: Duration) -> Self {
        Self { root, timeout }
    }

    async fn call(&self, make: impl FnOnce(Reply) -> RootCommand) -> Result<Status, ClientError> {
        let outcome = ask(&self.root, make, self.timeout).await?;
        Ok(outcome?)
    }

    async fn route(&self, make: impl FnOnce(Reply) -> Request) -> Result<Status, ClientError> {
        self.call(|reply_to| RootCommand::Route(make(reply_to)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn create_hotel(&self, name: &str, rooms: u32) -> Result<Status, ClientError> {
        debug!("Sending request");
        self.call(|reply_to| RootCommand::CreateHotel {
            name: name.to_owned(),
            rooms,
            reply_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_hotel(&self, hotel: HotelId) -> Result<Status, ClientError> {
        debug!("Sending request");
        self.route(|reply_to| Request::DeleteHotel { hotel, reply_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_hotels(&self) -> Result<Status, ClientError> {
        debug!("Sending request");
        self.route(|reply_to| Request::ListHotels { reply_to }).await
    }

    #[instrument(skip(self, request), fields(hotels = request.len()))]
    pub async fn reserve(&self, request: ReservationRequest) -> Result<Status, ClientError> {
        debug!(?request, "reserve called");
        self.route(|reply_to| Request::Reserve { request, reply_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_reservation(
        &self,
        reservation: ReservationId,
    ) -> Result<Status, ClientError> {
        debug!("Sending request");
        self.route(|reply_to| Request::CancelReservation {
            reservation,
            reply_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn confirm_reservation(
        &self,
        reservation: ReservationId,
    ) -> Result<Status, ClientError> {
        debug!("Sending request");
        self.route(|reply_to| Request::ConfirmReservation {
            reservation,
            reply_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn spawn_broker(&self) -> Result<Status, ClientError> {
        debug!("Sending request");
        self.call(|reply_to| RootCommand::SpawnBroker { reply_to })
            .await
    }
}
