//! Emitter configuration.
//!
//! Every field has a default, so a bare `[emitter]` section in TOML (or an
//! empty JSON object) deserializes into a working configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EmitterError, EmitterResult};

/// Default capacity of every subscriber queue.
pub const DEFAULT_BUFFER_SIZE: usize = 10;

/// Largest queue capacity tokio's bounded channel accepts.
pub const MAX_BUFFER_SIZE: usize = usize::MAX >> 3;

/// What `emit` does when a matching subscriber's queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Wait for the consumer to make room.
    ///
    /// The registry lock stays held while waiting, so one stalled consumer
    /// stalls every emit, subscribe and removal on the emitter.
    #[default]
    Block,
    /// Skip the full queue and log a warning. Other subscribers still receive
    /// the message.
    DropNewest,
}

/// Configuration for an [`Emitter`](crate::Emitter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Capacity of each subscriber queue, including the one used by `once`.
    pub buffer_size: usize,
    /// Behaviour when a queue is full.
    pub overflow: OverflowPolicy,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl EmitterConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the queue capacity.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the overflow policy.
    #[must_use]
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Check the configuration can back an emitter.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidBufferSize`] for a zero capacity or one
    /// above [`MAX_BUFFER_SIZE`].
    pub fn validate(&self) -> EmitterResult<()> {
        if !(1..=MAX_BUFFER_SIZE).contains(&self.buffer_size) {
            return Err(EmitterError::InvalidBufferSize(self.buffer_size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmitterConfig::default();
        assert_eq!(config.buffer_size, 10);
        assert_eq!(config.overflow, OverflowPolicy::Block);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = EmitterConfig::new()
            .with_buffer_size(3)
            .with_overflow(OverflowPolicy::DropNewest);
        assert_eq!(config.buffer_size, 3);
        assert_eq!(config.overflow, OverflowPolicy::DropNewest);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let config = EmitterConfig::new().with_buffer_size(0);
        assert_eq!(config.validate(), Err(EmitterError::InvalidBufferSize(0)));
    }

    #[test]
    fn test_oversized_buffer_rejected() {
        let config = EmitterConfig::new().with_buffer_size(usize::MAX);
        assert_eq!(
            config.validate(),
            Err(EmitterError::InvalidBufferSize(usize::MAX))
        );

        let config = EmitterConfig::new().with_buffer_size(MAX_BUFFER_SIZE.saturating_add(1));
        assert!(config.validate().is_err());
        assert!(
            EmitterConfig::new()
                .with_buffer_size(MAX_BUFFER_SIZE)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_oversized_buffer_from_json_rejected() {
        let json = format!("{{\"buffer_size\": {}}}", usize::MAX);
        let config: EmitterConfig = serde_json::from_str(&json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: EmitterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EmitterConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config: EmitterConfig = toml::from_str("overflow = \"drop_newest\"").unwrap();
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.overflow, OverflowPolicy::DropNewest);
    }
}
