//! Deadline-derived cancellation tokens.
//!
//! Stages never time out on their own. A caller that wants a deadline derives
//! a child token here and hands that to the stages instead.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Derive a token that is cancelled when `parent` is, or after `timeout`.
///
/// A timeout too long to represent as an instant never fires; the token then
/// only follows `parent`.
pub fn with_timeout(parent: &CancellationToken, timeout: Duration) -> CancellationToken {
    match Instant::now().checked_add(timeout) {
        Some(deadline) => with_deadline(parent, deadline),
        None => parent.child_token(),
    }
}

/// Derive a token that is cancelled when `parent` is, or at `deadline`.
///
/// The timer task exits as soon as the token is cancelled by any path.
pub fn with_deadline(parent: &CancellationToken, deadline: Instant) -> CancellationToken {
    let token = parent.child_token();
    let timer = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = timer.cancelled() => {}
            _ = tokio::time::sleep_until(deadline) => {
                tracing::debug!("deadline elapsed, cancelling");
                timer.cancel();
            }
        }
    });

    token
}
