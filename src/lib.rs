#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Rent-a-Room
//!
//! > **Multi-hotel room reservations as a saga of actors.**
//!
//! Hotels, brokers and per-request coordinators each run as an isolated Tokio task with
//! a private mailbox. A reservation spanning several hotels is a saga: every hotel holds
//! rooms provisionally, and if any of them refuses, the others are told to let go again.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Ownership instead of locks
//! A hotel's rooms are touched only by that hotel's manager actor. Messages are handled
//! one at a time, so the inventory needs no `Mutex`, and no two reservations can ever
//! grab the same room.
//!
//! ### Sagas instead of distributed transactions
//! There is no lock across hotels. Between "hotel A holds 2 rooms" and "all hotels said
//! yes", A's rooms are simply unavailable to anyone else. A failure anywhere triggers
//! compensating cancels at the hotels that succeeded.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Each concern has its own `thiserror` enum: [`HotelError`](model::HotelError) inside a
//! hotel, [`RentError`](error::RentError) for what a customer is told,
//! [`FrameworkError`](framework::FrameworkError) for transport failures.
//!
//! ### 2. Discovery
//! Hotels and brokers register in the [`Registry`](framework::Registry). Brokers subscribe
//! to hotel membership changes and keep their own, possibly slightly stale, cache. A stale
//! handle is harmless: the `tell` fails and the broker answers on the hotel's behalf.
//!
//! ### 3. Nobody waits forever
//! When an actor stops, messages still in its mailbox are handed to its
//! [`undelivered`](framework::Actor::undelivered) hook, which answers them with a failure.
//!
//! ### 4. Observability
//! We use `tracing` everywhere with structured logging.
//! See the [`lifecycle::tracing`] module for details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! Actor trait and run loop, ask bridge, registry and round-robin router.
//!
//! ### 2. The Domain ([`model`], [`error`], [`messages`])
//! Hotels with their room state machine, reservation requests, and the message protocols.
//!
//! ### 3. The Actors ([`hotel_actor`], [`aggregator`], [`broker_actor`], [`coordinator`])
//! - **Hotel manager**: owns one hotel.
//! - **Data aggregator**: collects hotel descriptions for one list request.
//! - **Reservation aggregator**: runs the saga for one reservation.
//! - **Broker**: caches hotels, starts aggregators, owns the sagas it started.
//! - **Root coordinator**: creates hotels and brokers, routes everything else.
//!
//! ### 4. The Interface ([`clients`], [`lifecycle`])
//! [`RentARoomSystem`](lifecycle::RentARoomSystem) starts and stops everything and hands out
//! a [`RentARoomClient`](clients::RentARoomClient).
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Three brokers, shorter client timeout
//! RENT_A_ROOM_BROKERS=3 RENT_A_ROOM_ASK_TIMEOUT_MS=2000 cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod aggregator;
pub mod broker_actor;
pub mod clients;
pub mod coordinator;
pub mod error;
pub mod framework;
pub mod hotel_actor;
pub mod lifecycle;
pub mod messages;
pub mod model;
