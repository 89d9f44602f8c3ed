mod common;

use common::*;
use rent_a_room::clients::ClientError;
use rent_a_room::error::RentError;
use rent_a_room::messages::Status;
use rent_a_room::model::{HotelError, ReservationRequest};

#[tokio::test]
async fn test_partial_failure_is_compensated() {
    let system = start(1);
    let client = &system.client;
    let roomy = create_hotel(client, "Roomy", 5).await;
    let full = create_hotel(client, "Full", 1).await;
    wait_for_hotels(client, 2).await;

    // Take the only room at `full`.
    reserve(client, &[(&full, 1)]).await;

    let request = ReservationRequest::new([(roomy.clone(), 2), (full.clone(), 2)]).unwrap();
    let err = client.reserve(request).await.unwrap_err();
    match &err {
        ClientError::Rejected(RentError::ReservationFailed(failures)) => {
            assert_eq!(failures.len(), 1);
            assert!(matches!(
                &failures[0],
                HotelError::InsufficientRooms {
                    hotel,
                    requested: 2,
                    available: 0,
                } if *hotel == full
            ));
        }
        other => panic!("Expected ReservationFailed, got {other:?}"),
    }
    assert!(err.to_string().contains(full.as_str()));
    assert!(!err.to_string().contains(roomy.as_str()));

    // The compensating cancel reached `roomy` before this listing's describe.
    let report = listing(client).await;
    assert!(block(&report, &roomy).contains("Rooms available: 5/5"));
    assert!(block(&report, &full).contains("Rooms available: 0/1"));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_saga_success_and_second_confirm() {
    let system = start(1);
    let client = &system.client;
    let a = create_hotel(client, "A", 2).await;
    let b = create_hotel(client, "B", 2).await;
    wait_for_hotels(client, 2).await;

    let reservation = reserve(client, &[(&a, 1), (&b, 1)]).await;
    assert_eq!(
        client.confirm_reservation(reservation.clone()).await,
        Ok(Status::ReservationConfirmed(reservation.clone()))
    );

    let report = listing(client).await;
    assert_eq!(block(&report, &a).matches("(Reserved)").count(), 1);
    assert_eq!(block(&report, &b).matches("(Reserved)").count(), 1);

    assert_eq!(
        client.confirm_reservation(reservation.clone()).await,
        Err(ClientError::Rejected(RentError::UnknownReservation(
            reservation
        )))
    );
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_confirm_after_hotel_deleted_fails_cleanly() {
    let system = start(1);
    let client = &system.client;
    let doomed = create_hotel(client, "Doomed", 2).await;
    wait_for_hotels(client, 1).await;

    let reservation = reserve(client, &[(&doomed, 1)]).await;
    client.delete_hotel(doomed.clone()).await.unwrap();

    let err = client.confirm_reservation(reservation).await.unwrap_err();
    match err {
        ClientError::Rejected(RentError::ConfirmationFailed(failures)) => {
            assert_eq!(failures, vec![HotelError::HotelGone { hotel: doomed }]);
        }
        other => panic!("Expected ConfirmationFailed, got {other:?}"),
    }
    system.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_room_goes_to_exactly_one_customer() {
    let system = start(2);
    let hotel = create_hotel(&system.client, "Popular", 1).await;
    wait_for_hotels(&system.client, 1).await;

    let attempts: Vec<_> = (0..10)
        .map(|_| {
            let client = system.client.clone();
            let request = ReservationRequest::new([(hotel.clone(), 1)]).unwrap();
            tokio::spawn(async move { client.reserve(request).await })
        })
        .collect();

    let mut placed = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(Status::ReservationPlaced(_)) => placed += 1,
            Ok(other) => panic!("Unexpected reply: {other:?}"),
            Err(ClientError::Rejected(RentError::ReservationFailed(_))) => {}
            Err(other) => panic!("Unexpected error: {other:?}"),
        }
    }
    assert_eq!(placed, 1);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cancel_then_rooms_can_be_reserved_again() {
    let system = start(1);
    let client = &system.client;
    let hotel = create_hotel(client, "Cycle", 1).await;
    wait_for_hotels(client, 1).await;

    let first = reserve(client, &[(&hotel, 1)]).await;
    client.cancel_reservation(first.clone()).await.unwrap();
    let second = reserve(client, &[(&hotel, 1)]).await;
    assert_ne!(first, second);

    assert_eq!(
        client.cancel_reservation(first.clone()).await,
        Err(ClientError::Rejected(RentError::UnknownReservation(first)))
    );
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_settlement_reaches_the_owning_broker_in_a_pool() {
    let system = start(2);
    let client = &system.client;
    let hotel = create_hotel(client, "Twin", 2).await;
    wait_for_hotels(client, 1).await;

    // With two brokers behind the router, reserve and confirm land on different brokers.
    let confirmed = reserve(client, &[(&hotel, 1)]).await;
    assert_eq!(
        client.confirm_reservation(confirmed.clone()).await,
        Ok(Status::ReservationConfirmed(confirmed.clone()))
    );
    assert_eq!(
        client.confirm_reservation(confirmed.clone()).await,
        Err(ClientError::Rejected(RentError::UnknownReservation(
            confirmed
        )))
    );

    let cancelled = reserve(client, &[(&hotel, 1)]).await;
    assert_eq!(
        client.cancel_reservation(cancelled.clone()).await,
        Ok(Status::ReservationCancelled(cancelled))
    );

    let report = listing(client).await;
    let twin = block(&report, &hotel);
    assert_eq!(twin.matches("(Reserved)").count(), 1);
    assert_eq!(twin.matches("(Available)").count(), 1);
    system.shutdown().await.unwrap();
}
