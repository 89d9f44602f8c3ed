//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//!
//! ## Configuration
//!
//! A compact format without the module prefix (`with_target(false)`); the level comes
//! from the `RUST_LOG` environment variable.
//!
//! ```bash
//! RUST_LOG=info cargo run      # hotel, saga and broker transitions
//! RUST_LOG=debug cargo run     # plus actor lifecycle and request payloads
//! RUST_LOG=rent_a_room::framework=debug cargo run
//! ```
//!
//! ## What Gets Traced
//!
//! - **Actor lifecycle** (debug): `Actor started` / `Actor stopped` with the number of
//!   messages that were still queued when the actor stopped
//! - **Inventory** (info): hotels opened and deleted, rooms held, released, confirmed
//! - **Sagas** (info/warn): reservation started, pending, failed with compensation, settled
//! - **Discovery** (info): brokers discovering and forgetting hotels
//! - **Client calls**: one span per [`RentARoomClient`](crate::clients::RentARoomClient) method
//!
//! A failed reservation at `info` reads like this:
//!
//! ```text
//! INFO reserve: Reservation started broker="Agent_1" reservation=9f6c… hotels=2
//! INFO Rooms held hotel=4b1e… reservation=9f6c… rooms=2
//! WARN Reservation refused hotel=c07a… reservation=9f6c… error=Trying to reserve 2 rooms …
//! WARN Reservation failed reservation=9f6c… failed=1 compensated=1
//! INFO Rooms released hotel=4b1e… reservation=9f6c…
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
