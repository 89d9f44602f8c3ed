//! # Core Actor Framework
//!
//! This module defines the generic building blocks every process in the system is made of.
//!
//! ## Key Types
//!
//! - [`Actor`]: The trait a component implements to run as an isolated process.
//! - [`Addr`]: A cloneable handle to a running actor's mailbox.
//! - [`Context`]: Per-actor runtime state handed to every hook (own address, stop flag).
//! - [`spawn`]: Starts an actor in its own Tokio task.
//! - [`ask`]: Request/response bridge with a bounded timeout.
//! - [`FrameworkError`]: Transport-level failures (closed mailbox, dropped reply, timeout).

use async_trait::async_trait;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

// =============================================================================
// 1. HANDLES
// =============================================================================

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a spawned actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    fn next() -> Self {
        Self(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A handle to an actor's mailbox.
///
/// # Architecture Note
/// This is the "Client" half of an actor. It only holds the sending end of an
/// unbounded channel, so cloning it is cheap and a `tell` never waits. Handlers
/// can therefore message each other freely without ever blocking mid-handler.
///
/// Two handles are equal when they point at the same actor, regardless of the name.
pub struct Addr<M> {
    id: ActorId,
    name: Arc<str>,
    sender: mpsc::UnboundedSender<M>,
}

impl<M> Addr<M> {
    /// Creates a handle plus the mailbox it feeds. Used by [`spawn`] and by test mock actors.
    pub(crate) fn with_mailbox(name: impl Into<Arc<str>>) -> (Self, mpsc::UnboundedReceiver<M>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let addr = Self {
            id: ActorId::next(),
            name: name.into(),
            sender,
        };
        (addr, receiver)
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fire-and-forget delivery.
    ///
    /// Fails, handing the message back, once the actor has stopped.
    pub fn tell(&self, msg: M) -> Result<(), SendError<M>> {
        self.sender.send(msg)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Resolves once the actor has stopped accepting messages.
    pub async fn closed(&self) {
        self.sender.closed().await
    }
}

impl<M> Clone for Addr<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            sender: self.sender.clone(),
        }
    }
}

impl<M> PartialEq for Addr<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M> Eq for Addr<M> {}

impl<M> Hash for Addr<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<M> fmt::Debug for Addr<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Addr({}{})", self.name, self.id)
    }
}

// =============================================================================
// 2. ERRORS & THE ASK BRIDGE
// =============================================================================

/// Errors that can occur within the actor framework itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("No reply within {0:?}")]
    Timeout(Duration),
}

/// Sends a request carrying a oneshot reply channel and waits for the answer.
///
/// A timeout does not cancel the work the actor may already be doing; the outcome
/// is unknown to the caller, not failed.
pub async fn ask<M, T>(
    addr: &Addr<M>,
    make: impl FnOnce(oneshot::Sender<T>) -> M,
    timeout: Duration,
) -> Result<T, FrameworkError> {
    let (respond_to, response) = oneshot::channel();
    addr.tell(make(respond_to))
        .map_err(|_| FrameworkError::ActorClosed)?;
    match tokio::time::timeout(timeout, response).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(_)) => Err(FrameworkError::ActorDropped),
        Err(_) => Err(FrameworkError::Timeout(timeout)),
    }
}

// =============================================================================
// 3. THE ABSTRACTION
// =============================================================================

/// Runtime state the framework hands to every hook.
pub struct Context<M> {
    addr: Addr<M>,
    stopping: bool,
}

impl<M> Context<M> {
    /// The actor's own address, e.g. to pass along as a reply target.
    pub fn addr(&self) -> &Addr<M> {
        &self.addr
    }

    pub fn name(&self) -> &str {
        self.addr.name()
    }

    /// Stops the actor once the current handler returns.
    pub fn stop(&mut self) {
        self.stopping = true;
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }
}

/// Trait that every process in the system implements.
///
/// # Architecture Note
/// The message loop is written *once* in [`spawn`]; a component only supplies its
/// state and a handler. Each actor owns its state exclusively and handles one message
/// at a time, so no component needs a `Mutex` for its own data.
///
/// # Provided Methods (Hooks)
/// - [`Actor::started`] runs before the first message.
/// - [`Actor::stopped`] runs after the last one.
/// - [`Actor::undelivered`] receives every message still queued when the actor stops,
///   so requesters can be told the target went away instead of waiting forever.
#[async_trait]
pub trait Actor: Send + 'static {
    type Message: Send + 'static;

    async fn started(&mut self, _ctx: &mut Context<Self::Message>) {}

    async fn handle(&mut self, msg: Self::Message, ctx: &mut Context<Self::Message>);

    async fn stopped(&mut self, _ctx: &mut Context<Self::Message>) {}

    fn undelivered(&mut self, _msg: Self::Message, _ctx: &Context<Self::Message>) {}
}

// =============================================================================
// 4. THE RUNTIME
// =============================================================================

/// Spawns `actor` in its own Tokio task and returns its address.
pub fn spawn<A: Actor>(name: impl Into<Arc<str>>, actor: A) -> Addr<A::Message> {
    let (addr, mailbox) = Addr::with_mailbox(name);
    let ctx = Context {
        addr: addr.clone(),
        stopping: false,
    };
    tokio::spawn(run(actor, mailbox, ctx));
    addr
}

async fn run<A: Actor>(
    mut actor: A,
    mut mailbox: mpsc::UnboundedReceiver<A::Message>,
    mut ctx: Context<A::Message>,
) {
    let actor_type = std::any::type_name::<A>()
        .split("::")
        .last()
        .unwrap_or("Unknown");
    let name = ctx.addr.name.clone();
    debug!(actor_type, actor = %name, "Actor started");

    actor.started(&mut ctx).await;
    while !ctx.stopping {
        let Some(msg) = mailbox.recv().await else {
            break;
        };
        actor.handle(msg, &mut ctx).await;
    }

    // Refuse new mail, then answer whatever was already queued.
    mailbox.close();
    let mut undelivered = 0usize;
    while let Ok(msg) = mailbox.try_recv() {
        actor.undelivered(msg, &ctx);
        undelivered += 1;
    }

    actor.stopped(&mut ctx).await;
    debug!(actor_type, actor = %name, undelivered, "Actor stopped");
}
