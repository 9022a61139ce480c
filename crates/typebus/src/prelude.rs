//! Prelude module - commonly used types for convenient import.
//!
//! Use `use typebus::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use typebus::prelude::*;
//!
//! # async fn example() {
//! let emitter = Emitter::new(CancellationToken::new());
//!
//! let mut value = 0_u64;
//! let exit = CancellationToken::new();
//! exit.cancel();
//! assert!(!emitter.once_until(&mut value, &exit).await);
//! # }
//! ```

// Emitter
pub use crate::{CancellationToken, Emitter, EventReceiver, SubscriberId};

// Shapes
pub use crate::{Message, Shape};

// Configuration and errors
pub use crate::{DEFAULT_BUFFER_SIZE, EmitterConfig, EmitterError, EmitterResult, OverflowPolicy};
