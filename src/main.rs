//! # Rent-a-Room demo
//!
//! Walks one customer through the system:
//! 1. Start the [`RentARoomSystem`] with settings from the environment.
//! 2. Create two hotels and list them.
//! 3. Reserve rooms at both, confirm, and list again.
//! 4. Try a reservation that cannot fit and watch it get compensated.

use rent_a_room::lifecycle::{setup_tracing, Config, RentARoomSystem};
use rent_a_room::messages::Status;
use rent_a_room::model::{HotelId, ReservationRequest};
use std::time::Duration;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = Config::from_env().map_err(|e| e.to_string())?;
    let system = RentARoomSystem::start(config);
    let client = &system.client;

    let seaside = client
        .create_hotel("Seaside", 3)
        .await
        .map_err(|e| e.to_string())?;
    let seaside = created_id(seaside)?;
    let alpine = client
        .create_hotel("Alpine Lodge", 1)
        .await
        .map_err(|e| e.to_string())?;
    let alpine = created_id(alpine)?;

    // Brokers learn about new hotels asynchronously.
    let mut report = client.list_hotels().await.map_err(|e| e.to_string())?;
    for _ in 0..50 {
        if matches!(&report, Status::HotelReport(text) if text.matches("Hotel: ").count() == 2) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        report = client.list_hotels().await.map_err(|e| e.to_string())?;
    }
    println!("{report}\n");

    let span = tracing::info_span!("booking");
    async {
        let request = ReservationRequest::new([(seaside.clone(), 2), (alpine.clone(), 1)])
            .map_err(|e| e.to_string())?;
        let placed = client.reserve(request).await.map_err(|e| e.to_string())?;
        println!("{placed}");

        let reservation = placed
            .reservation_id()
            .cloned()
            .ok_or_else(|| format!("unexpected reply: {placed}"))?;
        let confirmed = client
            .confirm_reservation(reservation)
            .await
            .map_err(|e| e.to_string())?;
        println!("{confirmed}\n");
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    println!("{}\n", client.list_hotels().await.map_err(|e| e.to_string())?);

    let too_many = ReservationRequest::new([(seaside, 1), (alpine, 1)]).map_err(|e| e.to_string())?;
    match client.reserve(too_many).await {
        Ok(status) => info!(%status, "Unexpectedly reserved"),
        Err(err) => {
            warn!("Reservation was rolled back");
            println!("{err}\n");
        }
    }

    system.shutdown().await.map_err(|e| e.to_string())
}

fn created_id(status: Status) -> Result<HotelId, String> {
    println!("{status}");
    status
        .hotel_id()
        .cloned()
        .ok_or_else(|| format!("unexpected reply: {status}"))
}
