//! Fan-out notification channel.
//!
//! The application owns a single bus and passes it to publishers and
//! listeners. Listeners only see messages published while they are
//! registered; anything earlier is gone.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Opaque ticket returned by `subscribe`, handed back to `unsubscribe`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Receiving end of one registration on a bus.
///
/// ```ignore
/// let listener = bus.subscribe();
/// for note in listener.drain() {
///     refresh_view(&note);
/// }
/// bus.unsubscribe(listener.id());
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    id: SubscriptionId,
    inbox: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(id: SubscriptionId, inbox: Receiver<M>) -> Self {
        Self { id, inbox }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn recv(&self) -> Result<M, RecvError> {
        self.inbox.recv()
    }

    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.inbox.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.inbox.recv_timeout(timeout)
    }

    /// Everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<M> {
        self.inbox.try_iter().collect()
    }
}

/// Publish side of the notification channel.
///
/// A failed publish does not undo whatever change prompted it; callers log
/// the error and move on.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;

    /// `false` when `id` was not (or no longer) registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

impl<M, B: EventBus<M> + ?Sized> EventBus<M> for Arc<B> {
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), B::Error> {
        B::publish(self, message)
    }

    fn subscribe(&self) -> Subscription<M> {
        B::subscribe(self)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        B::unsubscribe(self, id)
    }
}
