#![allow(dead_code)]

use rent_a_room::clients::RentARoomClient;
use rent_a_room::lifecycle::{Config, RentARoomSystem};
use rent_a_room::messages::Status;
use rent_a_room::model::{HotelId, ReservationId, ReservationRequest};
use std::time::Duration;

pub fn start(brokers: usize) -> RentARoomSystem {
    RentARoomSystem::start(Config {
        ask_timeout_ms: 2000,
        brokers,
        ..Config::default()
    })
}

pub async fn create_hotel(client: &RentARoomClient, name: &str, rooms: u32) -> HotelId {
    let created = client
        .create_hotel(name, rooms)
        .await
        .expect("Failed to create hotel");
    created.hotel_id().cloned().expect("No hotel id in reply")
}

/// The current listing, or an empty string when there are no hotels.
pub async fn listing(client: &RentARoomClient) -> String {
    match client.list_hotels().await.expect("Failed to list hotels") {
        Status::HotelReport(report) => report,
        Status::NoHotels => String::new(),
        other => panic!("Unexpected list reply: {other:?}"),
    }
}

pub fn hotel_count(report: &str) -> usize {
    report.matches("Hotel: ").count()
}

/// Polls the listing until it shows exactly `hotels` hotels twice in a row, since
/// brokers learn about hotels asynchronously.
pub async fn wait_for_hotels(client: &RentARoomClient, hotels: usize) -> String {
    let mut streak = 0;
    for _ in 0..200 {
        let report = listing(client).await;
        if hotel_count(&report) == hotels {
            streak += 1;
            if streak == 2 {
                return report;
            }
        } else {
            streak = 0;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Listing never showed {hotels} hotels");
}

/// The description block of one hotel inside a listing.
pub fn block<'a>(report: &'a str, hotel: &HotelId) -> &'a str {
    let marker = format!("(ID: {hotel})");
    report
        .split("\n\n")
        .find(|block| block.contains(&marker))
        .unwrap_or_else(|| panic!("Hotel {hotel} not in listing:\n{report}"))
}

pub async fn reserve(
    client: &RentARoomClient,
    rooms: &[(&HotelId, u32)],
) -> ReservationId {
    let request =
        ReservationRequest::new(rooms.iter().map(|(hotel, n)| ((*hotel).clone(), *n))).unwrap();
    let placed = client.reserve(request).await.expect("Reservation failed");
    placed
        .reservation_id()
        .cloned()
        .expect("No reservation id in reply")
}
