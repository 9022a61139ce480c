//! The emitter: subscription registry, type-filtered dispatch and one-shot waits.
//!
//! # Locking
//!
//! One async mutex guards the registry. Registration, dispatch and removal
//! all take it. Under [`OverflowPolicy::Block`] `emit` awaits queue capacity
//! **while holding the lock**: a full, undrained queue stalls every other
//! emit, subscribe and removal until its consumer catches up. Use
//! [`OverflowPolicy::DropNewest`] when producers must never wait on slow
//! consumers.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::{EmitterConfig, OverflowPolicy};
use crate::error::EmitterResult;
use crate::shape::{Message, Shape};
use crate::subscriber::{EventReceiver, Slot, SubscriberId};

#[derive(Debug)]
struct Shared {
    subscriptions: Mutex<HashMap<SubscriberId, Slot>>,
    lifetime: CancellationToken,
    config: EmitterConfig,
}

impl Shared {
    /// Remove a slot, closing its queue. Returns `false` if it was already gone.
    async fn remove(&self, id: SubscriberId, reason: &'static str) -> bool {
        let mut subscriptions = self.subscriptions.lock().await;
        let removed = subscriptions.remove(&id).is_some();
        if removed {
            debug!(
                subscriber_id = %id,
                reason,
                remaining = subscriptions.len(),
                "Subscription removed"
            );
        }
        removed
    }
}

/// Type-discriminated publish/subscribe emitter.
///
/// Cloning is cheap and every clone shares the same registry.
#[derive(Debug, Clone)]
pub struct Emitter {
    shared: Arc<Shared>,
}

impl Emitter {
    /// Create an emitter bound to `lifetime` with the default buffer size.
    #[must_use]
    pub fn new(lifetime: CancellationToken) -> Self {
        Self::from_parts(lifetime, EmitterConfig::default())
    }

    /// Create an emitter with a specific queue capacity.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidBufferSize`](crate::EmitterError::InvalidBufferSize)
    /// if `buffer_size` is zero or above [`MAX_BUFFER_SIZE`](crate::MAX_BUFFER_SIZE).
    pub fn with_buffer_size(lifetime: CancellationToken, buffer_size: usize) -> EmitterResult<Self> {
        Self::with_config(lifetime, EmitterConfig::new().with_buffer_size(buffer_size))
    }

    /// Create an emitter from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_config(lifetime: CancellationToken, config: EmitterConfig) -> EmitterResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(lifetime, config))
    }

    fn from_parts(lifetime: CancellationToken, config: EmitterConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                subscriptions: Mutex::new(HashMap::new()),
                lifetime,
                config,
            }),
        }
    }

    /// Queue capacity used for new subscriptions.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.shared.config.buffer_size
    }

    /// The emitter's configuration.
    #[must_use]
    pub fn config(&self) -> &EmitterConfig {
        &self.shared.config
    }

    /// The emitter's own lifetime.
    #[must_use]
    pub fn lifetime(&self) -> &CancellationToken {
        &self.shared.lifetime
    }

    /// Number of live subscriptions.
    pub async fn subscriber_count(&self) -> usize {
        self.shared.subscriptions.lock().await.len()
    }

    /// Subscribe to messages assignable to `T` for the emitter's lifetime.
    pub async fn subscribe<T: ?Sized + 'static>(&self) -> EventReceiver {
        self.subscribe_shape(Shape::of::<T>(), None).await
    }

    /// Subscribe to messages assignable to `T` until `lifetime` is cancelled.
    ///
    /// The subscription still ends early if the emitter's lifetime ends.
    pub async fn subscribe_until<T: ?Sized + 'static>(
        &self,
        lifetime: CancellationToken,
    ) -> EventReceiver {
        self.subscribe_shape(Shape::of::<T>(), Some(lifetime)).await
    }

    /// Subscribe to messages assignable to `shape`.
    ///
    /// `lifetime` defaults to the emitter's own. A watcher task removes the
    /// subscription when either lifetime ends or the receiver is dropped.
    pub async fn subscribe_shape(
        &self,
        shape: Shape,
        lifetime: Option<CancellationToken>,
    ) -> EventReceiver {
        let lifetime = lifetime.unwrap_or_else(|| self.shared.lifetime.clone());
        let (sender, receiver) = mpsc::channel(self.shared.config.buffer_size);
        let id = SubscriberId::new();
        let watched = sender.clone();

        {
            let mut subscriptions = self.shared.subscriptions.lock().await;
            subscriptions.insert(id, Slot { sender, shape });
            debug!(
                subscriber_id = %id,
                %shape,
                active = subscriptions.len(),
                "Subscription registered"
            );
        }

        self.spawn_watcher(id, lifetime, watched);
        EventReceiver::new(id, shape, receiver)
    }

    fn spawn_watcher(
        &self,
        id: SubscriberId,
        lifetime: CancellationToken,
        sender: mpsc::Sender<Message>,
    ) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let reason = tokio::select! {
                () = lifetime.cancelled() => "subscription lifetime ended",
                () = shared.lifetime.cancelled() => "emitter lifetime ended",
                () = sender.closed() => "receiver dropped",
            };
            // Release the watcher's sender first so removal closes the queue.
            drop(sender);
            shared.remove(id, reason).await;
        });
    }

    /// Emit a value to every subscriber whose shape accepts its type.
    ///
    /// Returns the number of queues the value was pushed into.
    pub async fn emit<T: Any + Send + Sync>(&self, message: T) -> usize {
        self.emit_message(Message::new(message)).await
    }

    /// Emit a prepared [`Message`], including any declared capabilities.
    pub async fn emit_message(&self, message: Message) -> usize {
        let subscriptions = self.shared.subscriptions.lock().await;
        let mut delivered: usize = 0;

        for (id, slot) in subscriptions.iter() {
            if !slot.shape.accepts(&message) {
                continue;
            }
            if self.deliver(*id, slot, message.clone()).await {
                delivered = delivered.saturating_add(1);
            }
        }

        trace!(shape = %message.shape(), delivered, "Message emitted");
        delivered
    }

    async fn deliver(&self, id: SubscriberId, slot: &Slot, message: Message) -> bool {
        match self.shared.config.overflow {
            OverflowPolicy::Block => {
                if slot.sender.send(message).await.is_ok() {
                    true
                } else {
                    trace!(subscriber_id = %id, "Receiver gone, awaiting watcher");
                    false
                }
            },
            OverflowPolicy::DropNewest => match slot.sender.try_send(message) {
                Ok(()) => true,
                Err(TrySendError::Full(message)) => {
                    warn!(
                        subscriber_id = %id,
                        shape = %message.shape(),
                        "Subscriber queue full, message dropped"
                    );
                    false
                },
                Err(TrySendError::Closed(_)) => {
                    trace!(subscriber_id = %id, "Receiver gone, awaiting watcher");
                    false
                },
            },
        }
    }

    /// Wait for the next message of type `T` and store it in `destination`.
    ///
    /// Returns `false` without touching `destination` if the emitter's
    /// lifetime ends first.
    pub async fn once<T>(&self, destination: &mut T) -> bool
    where
        T: Any + Clone + Send + Sync,
    {
        self.wait_once(destination, CancellationToken::new()).await
    }

    /// Like [`once`](Self::once), but gives up when `exit` is cancelled.
    pub async fn once_until<T>(&self, destination: &mut T, exit: &CancellationToken) -> bool
    where
        T: Any + Clone + Send + Sync,
    {
        self.wait_once(destination, exit.clone()).await
    }

    async fn wait_once<T>(&self, destination: &mut T, exit: CancellationToken) -> bool
    where
        T: Any + Clone + Send + Sync,
    {
        let scope = CancellationToken::new();
        // Tears the one-shot subscription down on every return path,
        // including when this future is dropped mid-wait.
        let _scope_guard = scope.clone().drop_guard();
        let mut receiver = self.subscribe_shape(Shape::of::<T>(), Some(scope)).await;
        let id = receiver.id();
        let next_match = async {
            while let Some(message) = receiver.recv().await {
                if let Some(value) = message.downcast_ref::<T>() {
                    return Some(value.clone());
                }
                trace!(
                    subscriber_id = %id,
                    shape = %message.shape(),
                    "Skipping non-matching payload"
                );
            }
            None
        };

        tokio::select! {
            biased;
            () = exit.cancelled() => {
                debug!(subscriber_id = %id, "One-shot wait exited early");
                false
            },
            value = next_match => {
                match value {
                    Some(value) => {
                        *destination = value;
                        true
                    },
                    // Queue closed: the emitter's lifetime ended.
                    None => false,
                }
            },
        }
    }
}
