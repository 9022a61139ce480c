//! Subscriber identity, registry slots and the receiving half handed to callers.

use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shape::{Message, Shape};

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub Uuid);

impl SubscriberId {
    /// Create a new random subscriber ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber:{}", self.0)
    }
}

/// A live registry entry.
///
/// The sender exists only here. Dropping the slot closes the queue, so a
/// slot removed from the registry can never be written to again.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) sender: mpsc::Sender<Message>,
    pub(crate) shape: Shape,
}

/// Receiving half of a subscription.
///
/// Yields messages in emission order. Once the subscription's lifetime ends
/// the queue is closed: buffered messages are still returned, then `recv`
/// returns `None`. Dropping the receiver unsubscribes.
#[derive(Debug)]
pub struct EventReceiver {
    id: SubscriberId,
    shape: Shape,
    receiver: mpsc::Receiver<Message>,
}

impl EventReceiver {
    pub(crate) fn new(id: SubscriberId, shape: Shape, receiver: mpsc::Receiver<Message>) -> Self {
        Self {
            id,
            shape,
            receiver,
        }
    }

    /// The subscription's ID.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// The shape this subscription accepts.
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Receive the next message.
    ///
    /// Returns `None` once the subscription has been removed and the buffer
    /// is drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Try to receive the next message without waiting.
    ///
    /// Returns `None` if nothing is buffered or the queue is closed.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }

    /// Number of buffered messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Whether the emitter has closed this queue.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }

    /// Stop accepting new messages. Buffered messages can still be received.
    ///
    /// The emitter notices and removes the subscription.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}
