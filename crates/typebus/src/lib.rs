//! Typebus - an in-process, type-discriminated publish/subscribe emitter.
//!
//! This crate provides:
//! - An [`Emitter`] that delivers each emitted value to every subscriber whose
//!   [`Shape`] accepts the value's type
//! - Private bounded queues per subscriber ([`EventReceiver`])
//! - Lifetime-driven unsubscription through [`CancellationToken`]s
//! - A one-shot wait for the next matching message ([`Emitter::once`])
//!
//! # Architecture
//!
//! Subscribers register by shape: a concrete type, a capability such as
//! `dyn Trait` that messages opt into, or [`Shape::any`]. Each subscription
//! is bound to a lifetime token and a watcher task removes it, closing its
//! queue, once that token or the emitter's own token is cancelled.
//!
//! # Example
//!
//! ```rust
//! use typebus::Emitter;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Greeting {
//!     text: String,
//! }
//!
//! # async fn example() {
//! let emitter = Emitter::new(CancellationToken::new());
//! let mut receiver = emitter.subscribe::<Greeting>().await;
//!
//! emitter.emit(Greeting { text: "hello".to_string() }).await;
//! emitter.emit(42_u32).await; // not a Greeting, not delivered
//!
//! let msg = receiver.recv().await.unwrap();
//! assert_eq!(msg.downcast_ref::<Greeting>().unwrap().text, "hello");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod lifetime;
pub mod prelude;

mod config;
mod emitter;
mod error;
mod shape;
mod subscriber;

pub use config::{DEFAULT_BUFFER_SIZE, EmitterConfig, MAX_BUFFER_SIZE, OverflowPolicy};
pub use emitter::Emitter;
pub use error::{EmitterError, EmitterResult};
pub use shape::{Message, Shape};
pub use subscriber::{EventReceiver, SubscriberId};
pub use tokio_util::sync::CancellationToken;
