//! Root coordinator: the single entry point of the rental system.
//!
//! Creates hotels and brokers and routes every other request to a broker. It holds no
//! hotel state of its own.

use crate::broker_actor::{BrokerPool, BROKER_SERVICE};
use crate::error::{RentError, ValidationError};
use crate::framework::{spawn, Actor, Addr, Context, GroupRouter, Registry};
use crate::hotel_actor::{HotelManager, HOTEL_SERVICE};
use crate::messages::{respond, BrokerCommand, HotelCommand, Reply, RootCommand, Status};
use crate::model::Hotel;
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub struct RentARoom {
    router: GroupRouter<BrokerCommand>,
    pool: BrokerPool,
}

impl RentARoom {
    pub fn new(registry: Registry) -> Self {
        Self {
            router: GroupRouter::new(registry.clone(), BROKER_SERVICE),
            pool: BrokerPool::new(registry),
        }
    }

    /// Spawns the root with an initial pool of `brokers` brokers (at least one).
    pub fn start(registry: Registry, brokers: usize) -> Addr<RootCommand> {
        let root = Self::new(registry);
        for _ in 0..brokers.max(1) {
            root.pool.spawn_broker();
        }
        spawn("rent-a-room", root)
    }

    fn create_hotel(&self, name: String, rooms: u32, reply_to: Reply) {
        if name.trim().is_empty() {
            respond(reply_to, Err(ValidationError::EmptyHotelName.into()));
            return;
        }
        if rooms == 0 {
            respond(reply_to, Err(ValidationError::NoRooms.into()));
            return;
        }
        let hotel = Hotel::new(name.clone(), rooms);
        let id = hotel.id().clone();
        HotelManager::start(hotel, self.pool.registry());
        info!(%id, %name, rooms, "Hotel created");
        respond(reply_to, Ok(Status::HotelCreated { name, id }));
    }
}

#[async_trait]
impl Actor for RentARoom {
    type Message = RootCommand;

    async fn handle(&mut self, msg: RootCommand, ctx: &mut Context<RootCommand>) {
        match msg {
            RootCommand::Route(request) => {
                if let Err(BrokerCommand::Request(request)) =
                    self.router.route(BrokerCommand::Request(request))
                {
                    warn!("No broker available");
                    request.reject(RentError::NoBroker);
                }
            }
            RootCommand::CreateHotel {
                name,
                rooms,
                reply_to,
            } => self.create_hotel(name, rooms, reply_to),
            RootCommand::SpawnBroker { reply_to } => {
                let name = self.pool.spawn_broker();
                respond(reply_to, Ok(Status::BrokerSpawned(name)));
            }
            RootCommand::Shutdown { done } => {
                let registry = self.pool.registry();
                let brokers = registry.lookup(BROKER_SERVICE);
                let hotels = registry.lookup(HOTEL_SERVICE);
                info!(brokers = brokers.len(), hotels = hotels.len(), "Stopping all actors");
                for broker in brokers {
                    if broker.tell(BrokerCommand::Shutdown).is_err() {
                        debug!(broker = %broker.name(), "Broker already stopped");
                    }
                }
                for hotel in hotels {
                    if hotel.tell(HotelCommand::Stop { reply_to: None }).is_err() {
                        debug!(hotel = %hotel.name(), "Hotel already stopped");
                    }
                }
                let _ = done.send(());
                ctx.stop();
            }
        }
    }

    fn undelivered(&mut self, msg: RootCommand, _ctx: &Context<RootCommand>) {
        match msg {
            RootCommand::Route(request) => request.reject(RentError::ShuttingDown),
            RootCommand::CreateHotel { reply_to, .. } | RootCommand::SpawnBroker { reply_to } => {
                respond(reply_to, Err(RentError::ShuttingDown))
            }
            RootCommand::Shutdown { done } => {
                let _ = done.send(());
            }
        }
    }
}
