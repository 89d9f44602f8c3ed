//! # Service Registry
//!
//! A process-wide directory of live actors grouped under typed service keys.
//!
//! - [`Registry::register`] adds a member and watches it: once the actor stops, it is
//!   removed again without anyone having to deregister it.
//! - [`Registry::lookup`] returns the current members of a group.
//! - [`Registry::subscribe`] streams [`ServiceEvent`]s into another actor's mailbox,
//!   starting with a full [`ServiceEvent::Snapshot`].
//!
//! Membership is eventually consistent: a subscriber can briefly hold a handle to a
//! member that has already stopped. Callers must treat a failed `tell` as "gone".

use crate::framework::Addr;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Names a group of actors accepting messages of type `M`.
pub struct ServiceKey<M> {
    id: &'static str,
    _marker: PhantomData<fn() -> M>,
}

impl<M> ServiceKey<M> {
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }
}

impl<M> Clone for ServiceKey<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for ServiceKey<M> {}

impl<M> fmt::Debug for ServiceKey<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.id)
    }
}

/// A change in a group's membership.
#[derive(Debug)]
pub enum ServiceEvent<M> {
    /// The full current membership. Sent first on every subscription and again
    /// whenever a subscriber fell too far behind to replay the individual changes.
    Snapshot(Vec<Addr<M>>),
    Added(Addr<M>),
    Removed(Addr<M>),
}

impl<M> Clone for ServiceEvent<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Snapshot(members) => Self::Snapshot(members.clone()),
            Self::Added(addr) => Self::Added(addr.clone()),
            Self::Removed(addr) => Self::Removed(addr.clone()),
        }
    }
}

struct Group<M> {
    members: Vec<Addr<M>>,
    events: broadcast::Sender<ServiceEvent<M>>,
}

type GroupKey = (&'static str, TypeId);

/// Cheaply cloneable; all clones share the same directory.
#[derive(Clone)]
pub struct Registry {
    groups: Arc<RwLock<HashMap<GroupKey, Box<dyn Any + Send + Sync>>>>,
    buffer: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

impl Registry {
    /// `buffer` is how many membership events a slow subscriber may lag behind
    /// before it is resynchronised with a snapshot.
    pub fn new(buffer: usize) -> Self {
        Self {
            groups: Arc::new(RwLock::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<GroupKey, Box<dyn Any + Send + Sync>>> {
        self.groups.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<GroupKey, Box<dyn Any + Send + Sync>>> {
        self.groups.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_group<M: Send + 'static, R>(
        &self,
        key: ServiceKey<M>,
        f: impl FnOnce(&mut Group<M>) -> R,
    ) -> R {
        let mut groups = self.write();
        let entry = groups
            .entry((key.id, TypeId::of::<M>()))
            .or_insert_with(|| {
                let (events, _) = broadcast::channel(self.buffer);
                Box::new(Group::<M> {
                    members: Vec::new(),
                    events,
                })
            });
        match entry.downcast_mut::<Group<M>>() {
            Some(group) => f(group),
            None => unreachable!("group stored under the type id of its message"),
        }
    }

    /// Adds `addr` to the group and removes it automatically once the actor stops.
    ///
    /// Registering the same actor twice is a no-op.
    pub fn register<M: Send + 'static>(&self, key: ServiceKey<M>, addr: Addr<M>) {
        let added = self.with_group(key, |group| {
            if group.members.contains(&addr) {
                return false;
            }
            group.members.push(addr.clone());
            let _ = group.events.send(ServiceEvent::Added(addr.clone()));
            true
        });
        if !added {
            return;
        }
        debug!(service = key.id, actor = %addr.name(), "Registered");

        let registry = self.clone();
        tokio::spawn(async move {
            addr.closed().await;
            registry.deregister(key, &addr);
        });
    }

    /// Removes `addr` from the group. Returns whether it was a member.
    pub fn deregister<M: Send + 'static>(&self, key: ServiceKey<M>, addr: &Addr<M>) -> bool {
        let removed = self.with_group(key, |group| {
            let before = group.members.len();
            group.members.retain(|member| member != addr);
            if group.members.len() == before {
                return false;
            }
            let _ = group.events.send(ServiceEvent::Removed(addr.clone()));
            true
        });
        if removed {
            debug!(service = key.id, actor = %addr.name(), "Deregistered");
        }
        removed
    }

    /// Current members, in registration order.
    pub fn lookup<M: Send + 'static>(&self, key: ServiceKey<M>) -> Vec<Addr<M>> {
        self.read()
            .get(&(key.id, TypeId::of::<M>()))
            .and_then(|group| group.downcast_ref::<Group<M>>())
            .map(|group| group.members.clone())
            .unwrap_or_default()
    }

    /// Streams membership changes of `key` into `subscriber`, converting each event with
    /// `adapt`. The first delivered message is always a snapshot.
    ///
    /// Forwarding ends when the subscriber stops or the [`Subscription`] is dropped.
    pub fn subscribe<M, S>(
        &self,
        key: ServiceKey<M>,
        subscriber: Addr<S>,
        adapt: impl Fn(ServiceEvent<M>) -> S + Send + 'static,
    ) -> Subscription
    where
        M: Send + 'static,
        S: Send + 'static,
    {
        // Snapshot and receiver are taken under one lock so no change falls between them.
        let (members, mut events) =
            self.with_group(key, |group| (group.members.clone(), group.events.subscribe()));
        let _ = subscriber.tell(adapt(ServiceEvent::Snapshot(members)));

        let registry = self.clone();
        let task = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = subscriber.closed() => break,
                    received = events.recv() => match received {
                        Ok(event) => event,
                        Err(RecvError::Lagged(missed)) => {
                            warn!(
                                service = key.id,
                                subscriber = %subscriber.name(),
                                missed,
                                "Subscriber lagged; resending snapshot"
                            );
                            ServiceEvent::Snapshot(registry.lookup(key))
                        }
                        Err(RecvError::Closed) => break,
                    },
                };
                if subscriber.tell(adapt(event)).is_err() {
                    break;
                }
            }
        });
        Subscription { task }
    }
}

/// Keeps a registry subscription alive; dropping it stops the forwarding.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
