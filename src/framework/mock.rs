//! # Mock Framework
//!
//! Utilities for testing actors in isolation.
//!
//! Use [`mock_actor`] to get a bare [`Addr`] whose mailbox the test reads directly.
//! Hand the address to the actor under test as a reply target, then use
//! [`MockActor::expect`] or [`MockActor::expect_none`] to assert what it sent.
//!
//! # Example
//! ```ignore
//! let mut broker = mock_actor::<BrokerCommand>("broker");
//! let saga = spawn("saga", ReservationAggregator::new(id, broker.addr()));
//! saga.tell(SagaMessage::Shutdown).unwrap();
//! assert!(matches!(broker.expect().await, BrokerCommand::AggregatorStopped { .. }));
//! ```

use crate::framework::Addr;
use std::time::Duration;
use tokio::sync::mpsc;

const EXPECT_WITHIN: Duration = Duration::from_secs(1);

/// A stand-in actor: an address plus its raw mailbox.
pub struct MockActor<M> {
    addr: Addr<M>,
    mailbox: mpsc::UnboundedReceiver<M>,
}

/// Creates a mock actor named `name`.
pub fn mock_actor<M>(name: &str) -> MockActor<M> {
    let (addr, mailbox) = Addr::with_mailbox(name);
    MockActor { addr, mailbox }
}

impl<M: Send + 'static> MockActor<M> {
    pub fn addr(&self) -> Addr<M> {
        self.addr.clone()
    }

    /// Waits for the next message, panicking if none arrives in time.
    pub async fn expect(&mut self) -> M {
        match tokio::time::timeout(EXPECT_WITHIN, self.mailbox.recv()).await {
            Ok(Some(msg)) => msg,
            Ok(None) => panic!("MockActor '{}' mailbox closed", self.addr.name()),
            Err(_) => panic!(
                "MockActor '{}' received nothing within {:?}",
                self.addr.name(),
                EXPECT_WITHIN
            ),
        }
    }

    /// Asserts that nothing arrives for `wait`.
    pub async fn expect_none(&mut self, wait: Duration) {
        if let Ok(Some(_)) = tokio::time::timeout(wait, self.mailbox.recv()).await {
            panic!("MockActor '{}' received an unexpected message", self.addr.name());
        }
    }

    /// Takes everything currently queued without waiting.
    pub fn drain(&mut self) -> Vec<M> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.mailbox.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Simulates the actor stopping: tells fail and `closed()` resolves from now on.
    pub fn close(&mut self) {
        self.mailbox.close();
    }
}
