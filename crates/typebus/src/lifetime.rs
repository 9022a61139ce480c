//! Helpers for building lifetime tokens.
//!
//! Subscriptions end when their [`CancellationToken`] is cancelled. These
//! helpers cover the two common cases: a lifetime nested inside another one,
//! and a lifetime with a deadline.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{EmitterError, EmitterResult};

/// A token cancelled together with `parent`, or earlier on its own.
#[must_use]
pub fn child(parent: &CancellationToken) -> CancellationToken {
    parent.child_token()
}

/// A child of `parent` that also cancels itself once `after` has elapsed.
///
/// The timer runs on the current tokio runtime and exits early if the token
/// is cancelled first.
///
/// # Errors
///
/// Returns [`EmitterError::NoRuntime`] when called outside a tokio runtime.
pub fn with_deadline(
    parent: &CancellationToken,
    after: Duration,
) -> EmitterResult<CancellationToken> {
    let handle = Handle::try_current().map_err(|e| EmitterError::NoRuntime(e.to_string()))?;
    Ok(with_deadline_on(&handle, parent, after))
}

/// Like [`with_deadline`], spawning the timer on an explicit runtime handle.
#[must_use]
pub fn with_deadline_on(
    handle: &Handle,
    parent: &CancellationToken,
    after: Duration,
) -> CancellationToken {
    let token = parent.child_token();
    let timer = token.clone();
    handle.spawn(async move {
        tokio::select! {
            () = timer.cancelled() => {},
            () = tokio::time::sleep(after) => {
                trace!(?after, "Lifetime deadline reached");
                timer.cancel();
            },
        }
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_follows_parent() {
        let parent = CancellationToken::new();
        let token = child(&parent);
        assert!(!token.is_cancelled());
        parent.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_child_cancel_does_not_affect_parent() {
        let parent = CancellationToken::new();
        let token = child(&parent);
        token.cancel();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cancels() {
        let parent = CancellationToken::new();
        let token = with_deadline(&parent, Duration::from_secs(2)).unwrap();
        assert!(!token.is_cancelled());

        tokio::time::timeout(Duration::from_secs(3), token.cancelled())
            .await
            .expect("deadline should fire");
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_follows_parent() {
        let parent = CancellationToken::new();
        let token = with_deadline(&parent, Duration::from_secs(3600)).unwrap();
        parent.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_deadline_outside_runtime_is_an_error() {
        let parent = CancellationToken::new();
        let err = with_deadline(&parent, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, EmitterError::NoRuntime(_)));
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_deadline_on_explicit_handle() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let parent = CancellationToken::new();
        let token = with_deadline_on(runtime.handle(), &parent, Duration::from_millis(10));

        runtime.block_on(async {
            tokio::time::timeout(Duration::from_secs(1), token.cancelled())
                .await
                .expect("deadline should fire");
        });
    }
}
