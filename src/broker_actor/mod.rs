//! Broker: the agent that turns customer requests into hotel traffic.
//!
//! A broker keeps its own view of which hotels exist, fed by registry events, and owns
//! the reservation sagas it started. Brokers form a pool behind the root's router.

use crate::aggregator::{DataAggregator, ReservationAggregator};
use crate::error::{RentError, ValidationError};
use crate::framework::{
    spawn, Actor, ActorId, Addr, Context, Registry, ServiceEvent, ServiceKey, Subscription,
};
use crate::hotel_actor::HOTEL_SERVICE;
use crate::messages::{
    respond, BrokerCommand, DataMessage, HotelCommand, Reply, Request, SagaMessage, Status,
};
use crate::model::{HotelError, HotelId, ReservationId, ReservationRequest};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::SendError;
use tracing::{debug, info, warn};

/// Registry group every broker joins; the root routes over it.
pub const BROKER_SERVICE: ServiceKey<BrokerCommand> = ServiceKey::new("broker");

/// Starts brokers and hands out their names.
///
/// Clones share one counter, so names stay unique no matter who adds the broker.
#[derive(Clone)]
pub struct BrokerPool {
    registry: Registry,
    spawned: Arc<AtomicUsize>,
}

impl BrokerPool {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            spawned: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Spawns and registers a broker named `Agent_<n>`, returning the name.
    pub fn spawn_broker(&self) -> String {
        let n = self.spawned.fetch_add(1, Ordering::SeqCst) + 1;
        let name = format!("Agent_{n}");
        let addr = spawn(name.clone(), Broker::new(self.clone()));
        self.registry.register(BROKER_SERVICE, addr);
        info!(broker = %name, "Broker added to pool");
        name
    }
}

pub struct Broker {
    pool: BrokerPool,
    hotels: HashMap<HotelId, Addr<HotelCommand>>,
    reservations: HashMap<ReservationId, Addr<SagaMessage>>,
    subscription: Option<Subscription>,
}

impl Broker {
    pub fn new(pool: BrokerPool) -> Self {
        Self {
            pool,
            hotels: HashMap::new(),
            reservations: HashMap::new(),
            subscription: None,
        }
    }

    // =========================================================================
    // Hotel cache
    // =========================================================================

    fn hotels_changed(&mut self, event: ServiceEvent<HotelCommand>, broker: &str) {
        match event {
            ServiceEvent::Added(addr) => self.discover(addr, broker),
            ServiceEvent::Removed(addr) => self.forget(&addr, broker),
            ServiceEvent::Snapshot(live) => {
                let live_ids: HashSet<ActorId> = live.iter().map(Addr::id).collect();
                let stale: Vec<Addr<HotelCommand>> = self
                    .hotels
                    .values()
                    .filter(|addr| !live_ids.contains(&addr.id()))
                    .cloned()
                    .collect();
                for addr in stale {
                    self.forget(&addr, broker);
                }
                for addr in live {
                    self.discover(addr, broker);
                }
            }
        }
    }

    fn discover(&mut self, addr: Addr<HotelCommand>, broker: &str) {
        let hotel = HotelId::from(addr.name());
        if !self.hotels.contains_key(&hotel) {
            info!(broker, %hotel, "Discovered hotel");
            self.hotels.insert(hotel, addr);
        }
    }

    fn forget(&mut self, addr: &Addr<HotelCommand>, broker: &str) {
        let hotel = HotelId::from(addr.name());
        if self.hotels.get(&hotel) == Some(addr) {
            self.hotels.remove(&hotel);
            info!(broker, %hotel, "Hotel no longer exists");
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    fn list_hotels(&self, reply_to: Reply) {
        let aggregator = spawn("hotel-data", DataAggregator::new());
        let expect = DataMessage::Expect {
            hotels: self.hotels.len(),
            report_to: reply_to,
        };
        if aggregator.tell(expect).is_err() {
            debug!(aggregator = %aggregator.name(), "Data aggregator already stopped");
            return;
        }
        for hotel in self.hotels.values() {
            let describe = HotelCommand::Describe {
                report_to: aggregator.clone(),
            };
            if hotel.tell(describe).is_err() {
                debug!(hotel = %hotel.name(), "Stale hotel handle");
                if aggregator.tell(DataMessage::Gone).is_err() {
                    debug!(aggregator = %aggregator.name(), "Data aggregator already stopped");
                }
            }
        }
    }

    fn delete_hotel(&self, hotel: HotelId, reply_to: Reply) {
        let Some(addr) = self.hotels.get(&hotel) else {
            warn!(%hotel, "Delete of unknown hotel");
            respond(reply_to, Err(RentError::UnknownHotel(hotel)));
            return;
        };
        let stop = HotelCommand::Stop {
            reply_to: Some(reply_to),
        };
        if let Err(SendError(HotelCommand::Stop {
            reply_to: Some(reply_to),
        })) = addr.tell(stop)
        {
            respond(reply_to, Err(RentError::UnknownHotel(hotel)));
        }
    }

    fn reserve(
        &mut self,
        request: ReservationRequest,
        reply_to: Reply,
        ctx: &Context<BrokerCommand>,
    ) {
        if request.is_empty() {
            respond(reply_to, Err(ValidationError::EmptyReservation.into()));
            return;
        }

        let mut targets = Vec::with_capacity(request.len());
        for (hotel, rooms) in request.iter() {
            match self.hotels.get(hotel) {
                Some(addr) => targets.push((addr.clone(), rooms)),
                None => {
                    warn!(broker = %ctx.name(), %hotel, "Reservation names unknown hotel");
                    respond(reply_to, Err(RentError::UnknownHotel(hotel.clone())));
                    return;
                }
            }
        }

        let reservation = self.fresh_reservation_id();
        let aggregator = spawn(
            reservation.to_string(),
            ReservationAggregator::new(reservation.clone(), ctx.addr().clone()),
        );
        self.reservations
            .insert(reservation.clone(), aggregator.clone());
        info!(broker = %ctx.name(), %reservation, hotels = targets.len(), "Reservation started");

        let expect = SagaMessage::Expect {
            hotels: targets.len(),
            report_to: reply_to,
        };
        if aggregator.tell(expect).is_err() {
            debug!(%reservation, "Reservation aggregator already stopped");
            return;
        }
        for (hotel, rooms) in targets {
            let command = HotelCommand::Reserve {
                reservation: reservation.clone(),
                rooms,
                reply_to: aggregator.clone(),
            };
            if hotel.tell(command).is_err() {
                debug!(hotel = %hotel.name(), "Stale hotel handle");
                let gone = HotelError::HotelGone {
                    hotel: HotelId::from(hotel.name()),
                };
                let reserved = SagaMessage::Reserved {
                    hotel,
                    result: Err(gone),
                };
                if aggregator.tell(reserved).is_err() {
                    debug!(%reservation, "Reservation aggregator already stopped");
                }
            }
        }
    }

    /// A random id not used by any live saga of this broker.
    fn fresh_reservation_id(&self) -> ReservationId {
        loop {
            let id = ReservationId::generate();
            if !self.reservations.contains_key(&id) {
                return id;
            }
        }
    }

    /// Hands a customer's cancel or confirm to the saga owning `reservation`.
    ///
    /// A saga started by another broker is found by asking the other brokers of the
    /// pool one after another.
    fn settle(
        &self,
        reservation: ReservationId,
        settle: SagaMessage,
        ctx: &Context<BrokerCommand>,
    ) {
        let peers = self
            .pool
            .registry()
            .lookup(BROKER_SERVICE)
            .into_iter()
            .filter(|peer| peer != ctx.addr())
            .collect();
        self.relay(reservation, settle, peers);
    }

    /// Delivers `settle` to the own saga for `reservation`, or passes it on to the next
    /// broker in `unvisited`. The last broker asked answers with an unknown reservation.
    fn relay(
        &self,
        reservation: ReservationId,
        settle: SagaMessage,
        mut unvisited: Vec<Addr<BrokerCommand>>,
    ) {
        let mut settle = match self.reservations.get(&reservation) {
            Some(aggregator) => match aggregator.tell(settle) {
                Ok(()) => return,
                Err(SendError(returned)) => returned,
            },
            None => settle,
        };

        while let Some(peer) = unvisited.pop() {
            let relay = BrokerCommand::Relay {
                reservation: reservation.clone(),
                settle,
                unvisited,
            };
            match peer.tell(relay) {
                Err(SendError(BrokerCommand::Relay {
                    settle: returned,
                    unvisited: rest,
                    ..
                })) => {
                    debug!(peer = %peer.name(), "Peer broker already stopped");
                    settle = returned;
                    unvisited = rest;
                }
                _ => {
                    debug!(%reservation, peer = %peer.name(), "Reservation relayed");
                    return;
                }
            }
        }

        warn!(%reservation, "No reservation by that id");
        if let SagaMessage::Cancel { reply_to } | SagaMessage::Confirm { reply_to } = settle {
            respond(reply_to, Err(RentError::UnknownReservation(reservation)));
        }
    }

    fn handle_request(&mut self, request: Request, ctx: &Context<BrokerCommand>) {
        match request {
            Request::ListHotels { reply_to } => self.list_hotels(reply_to),
            Request::DeleteHotel { hotel, reply_to } => self.delete_hotel(hotel, reply_to),
            Request::Reserve { request, reply_to } => self.reserve(request, reply_to, ctx),
            Request::CancelReservation {
                reservation,
                reply_to,
            } => self.settle(reservation, SagaMessage::Cancel { reply_to }, ctx),
            Request::ConfirmReservation {
                reservation,
                reply_to,
            } => self.settle(reservation, SagaMessage::Confirm { reply_to }, ctx),
        }
    }
}

#[async_trait]
impl Actor for Broker {
    type Message = BrokerCommand;

    async fn started(&mut self, ctx: &mut Context<BrokerCommand>) {
        self.subscription = Some(self.pool.registry().subscribe(
            HOTEL_SERVICE,
            ctx.addr().clone(),
            BrokerCommand::HotelsChanged,
        ));
    }

    async fn handle(&mut self, msg: BrokerCommand, ctx: &mut Context<BrokerCommand>) {
        match msg {
            BrokerCommand::Request(request) => self.handle_request(request, ctx),
            BrokerCommand::HotelsChanged(event) => self.hotels_changed(event, ctx.name()),
            BrokerCommand::AggregatorStopped { reservation } => {
                if self.reservations.remove(&reservation).is_some() {
                    debug!(broker = %ctx.name(), %reservation, "Reservation closed");
                }
            }
            BrokerCommand::Relay {
                reservation,
                settle,
                unvisited,
            } => self.relay(reservation, settle, unvisited),
            BrokerCommand::SpawnBroker { reply_to } => {
                let name = self.pool.spawn_broker();
                respond(reply_to, Ok(Status::BrokerSpawned(name)));
            }
            BrokerCommand::Shutdown => {
                info!(
                    broker = %ctx.name(),
                    open_reservations = self.reservations.len(),
                    "Broker shutting down"
                );
                for (reservation, aggregator) in &self.reservations {
                    if aggregator.tell(SagaMessage::Shutdown).is_err() {
                        debug!(%reservation, "Reservation aggregator already stopped");
                    }
                }
                self.subscription = None;
                ctx.stop();
            }
        }
    }

    fn undelivered(&mut self, msg: BrokerCommand, _ctx: &Context<BrokerCommand>) {
        match msg {
            BrokerCommand::Request(request) => request.reject(RentError::ShuttingDown),
            BrokerCommand::Relay {
                reservation,
                settle,
                unvisited,
            } => self.relay(reservation, settle, unvisited),
            BrokerCommand::SpawnBroker { reply_to } => {
                respond(reply_to, Err(RentError::ShuttingDown))
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::ask;
    use crate::framework::mock::mock_actor;
    use crate::hotel_actor::HotelManager;
    use crate::model::Hotel;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(1);

    async fn request(
        broker: &Addr<BrokerCommand>,
        make: impl FnOnce(Reply) -> Request,
    ) -> Result<Status, RentError> {
        ask(broker, |reply_to| BrokerCommand::Request(make(reply_to)), TIMEOUT)
            .await
            .unwrap()
    }

    /// Waits until the broker's listing shows `hotels` hotels.
    async fn wait_for_hotels(broker: &Addr<BrokerCommand>, hotels: usize) {
        for _ in 0..100 {
            let listed = match request(broker, |reply_to| Request::ListHotels { reply_to }).await {
                Ok(Status::HotelReport(report)) => report.matches("Hotel: ").count(),
                _ => 0,
            };
            if listed == hotels {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Broker never saw {hotels} hotels");
    }

    fn setup() -> (BrokerPool, Addr<BrokerCommand>) {
        let pool = BrokerPool::new(Registry::default());
        pool.spawn_broker();
        let broker = pool.registry().lookup(BROKER_SERVICE).remove(0);
        (pool, broker)
    }

    #[tokio::test]
    async fn test_brokers_are_named_from_a_shared_counter() {
        let (pool, broker) = setup();
        assert_eq!(broker.name(), "Agent_1");

        let spawned = ask(&broker, |reply_to| BrokerCommand::SpawnBroker { reply_to }, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(spawned, Ok(Status::BrokerSpawned("Agent_2".into())));
        assert_eq!(pool.spawn_broker(), "Agent_3");
        assert_eq!(pool.registry().lookup(BROKER_SERVICE).len(), 3);
    }

    #[tokio::test]
    async fn test_broker_learns_about_new_and_deleted_hotels() {
        let (pool, broker) = setup();
        assert_eq!(
            request(&broker, |reply_to| Request::ListHotels { reply_to }).await,
            Ok(Status::NoHotels)
        );

        let hotel = Hotel::new("Ritz", 2);
        let id = hotel.id().clone();
        HotelManager::start(hotel, pool.registry());
        wait_for_hotels(&broker, 1).await;

        let deleted = request(&broker, |reply_to| Request::DeleteHotel {
            hotel: id.clone(),
            reply_to,
        })
        .await;
        assert!(matches!(deleted, Ok(Status::HotelDeleted { .. })));
        wait_for_hotels(&broker, 0).await;

        assert_eq!(
            request(&broker, |reply_to| Request::DeleteHotel {
                hotel: id.clone(),
                reply_to,
            })
            .await,
            Err(RentError::UnknownHotel(id))
        );
    }

    #[tokio::test]
    async fn test_reserve_with_unknown_hotel_has_no_side_effect() {
        let (pool, broker) = setup();
        let hotel = Hotel::new("Ritz", 2);
        let known = hotel.id().clone();
        HotelManager::start(hotel, pool.registry());
        wait_for_hotels(&broker, 1).await;

        let stranger = HotelId::from("no-such-hotel");
        let reservation =
            ReservationRequest::new([(known, 1), (stranger.clone(), 1)]).unwrap();
        assert_eq!(
            request(&broker, |reply_to| Request::Reserve {
                request: reservation,
                reply_to,
            })
            .await,
            Err(RentError::UnknownHotel(stranger))
        );

        let report = request(&broker, |reply_to| Request::ListHotels { reply_to }).await;
        assert!(matches!(
            report,
            Ok(Status::HotelReport(text)) if text.contains("Rooms available: 2/2")
        ));
    }

    #[tokio::test]
    async fn test_reserve_and_confirm_through_broker() {
        let (pool, broker) = setup();
        let hotel = Hotel::new("Ritz", 2);
        let id = hotel.id().clone();
        HotelManager::start(hotel, pool.registry());
        wait_for_hotels(&broker, 1).await;

        let placed = request(&broker, |reply_to| Request::Reserve {
            request: ReservationRequest::new([(id, 1)]).unwrap(),
            reply_to,
        })
        .await
        .unwrap();
        let reservation = placed.reservation_id().cloned().unwrap();

        let confirmed = request(&broker, |reply_to| Request::ConfirmReservation {
            reservation: reservation.clone(),
            reply_to,
        })
        .await;
        assert_eq!(confirmed, Ok(Status::ReservationConfirmed(reservation.clone())));

        let again = request(&broker, |reply_to| Request::ConfirmReservation {
            reservation: reservation.clone(),
            reply_to,
        })
        .await;
        assert_eq!(again, Err(RentError::UnknownReservation(reservation)));
    }

    #[test]
    fn test_snapshot_drops_hotels_that_are_gone() {
        let mut broker = Broker::new(BrokerPool::new(Registry::default()));
        let h1 = mock_actor::<HotelCommand>("h1");
        let h2 = mock_actor::<HotelCommand>("h2");

        broker.hotels_changed(ServiceEvent::Snapshot(vec![h1.addr(), h2.addr()]), "Agent_1");
        assert_eq!(broker.hotels.len(), 2);

        broker.hotels_changed(ServiceEvent::Snapshot(vec![h2.addr()]), "Agent_1");
        let cached: Vec<&HotelId> = broker.hotels.keys().collect();
        assert_eq!(cached, vec![&HotelId::from("h2")]);
        assert_eq!(broker.hotels.get(&HotelId::from("h2")), Some(&h2.addr()));
    }

    #[tokio::test]
    async fn test_any_broker_in_the_pool_settles_a_reservation() {
        let (pool, first) = setup();
        pool.spawn_broker();
        let second = pool.registry().lookup(BROKER_SERVICE).remove(1);
        assert_eq!(second.name(), "Agent_2");

        let hotel = Hotel::new("Ritz", 2);
        let id = hotel.id().clone();
        HotelManager::start(hotel, pool.registry());
        wait_for_hotels(&first, 1).await;

        let placed = request(&first, |reply_to| Request::Reserve {
            request: ReservationRequest::new([(id, 1)]).unwrap(),
            reply_to,
        })
        .await
        .unwrap();
        let reservation = placed.reservation_id().cloned().unwrap();

        let confirmed = request(&second, |reply_to| Request::ConfirmReservation {
            reservation: reservation.clone(),
            reply_to,
        })
        .await;
        assert_eq!(confirmed, Ok(Status::ReservationConfirmed(reservation.clone())));

        for broker in [&first, &second] {
            let again = request(broker, |reply_to| Request::CancelReservation {
                reservation: reservation.clone(),
                reply_to,
            })
            .await;
            assert_eq!(again, Err(RentError::UnknownReservation(reservation.clone())));
        }
    }

    #[tokio::test]
    async fn test_unknown_reservation_is_rejected_after_asking_every_broker() {
        let (pool, broker) = setup();
        pool.spawn_broker();
        pool.spawn_broker();
        let unknown = ReservationId::from("nope");
        assert_eq!(
            request(&broker, |reply_to| Request::ConfirmReservation {
                reservation: unknown.clone(),
                reply_to,
            })
            .await,
            Err(RentError::UnknownReservation(unknown))
        );
    }

    #[tokio::test]
    async fn test_cancel_of_unknown_reservation() {
        let (_pool, broker) = setup();
        let unknown = ReservationId::from("nope");
        assert_eq!(
            request(&broker, |reply_to| Request::CancelReservation {
                reservation: unknown.clone(),
                reply_to,
            })
            .await,
            Err(RentError::UnknownReservation(unknown))
        );
    }

    #[tokio::test]
    async fn test_shutdown_stops_broker_and_leaves_pool() {
        let (pool, broker) = setup();
        broker.tell(BrokerCommand::Shutdown).unwrap();
        broker.closed().await;
        for _ in 0..100 {
            if pool.registry().lookup(BROKER_SERVICE).is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Stopped broker was never deregistered");
    }
}
