//! Source constructors.
//!
//! Sources start a stream from ordinary Rust values. Like stages, each one
//! spawns a single worker that owns the stream it returns.

use tokio_util::sync::CancellationToken;

use crate::core::{channel, Stream};
use crate::worker::{self, WorkerExit};

/// Emit every item of `iter`, then close.
pub fn from_iter<I>(cancel: &CancellationToken, iter: I) -> Stream<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    let (tx, rx) = channel();
    let cancel = cancel.clone();
    let items = iter.into_iter();

    worker::spawn("from_iter", 0, async move {
        let mut exit = WorkerExit::Drained;
        for item in items {
            if let Some(e) = worker::send_or_cancel(&cancel, &tx, item).await {
                exit = e;
                break;
            }
        }
        tx.close();
        exit
    });

    rx
}

/// Emit `f()` over and over until cancelled or nobody is listening.
///
/// The stream never ends on its own; bound it with
/// [`take`](crate::stages::take) or a cancellation token.
pub fn repeat_with<T, F>(cancel: &CancellationToken, mut f: F) -> Stream<T>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    let (tx, rx) = channel();
    let cancel = cancel.clone();

    worker::spawn("repeat_with", 0, async move {
        let exit = loop {
            if cancel.is_cancelled() {
                break WorkerExit::Cancelled;
            }
            let item = match worker::contain(&mut f) {
                Ok(item) => item,
                Err(e) => break e,
            };
            if let Some(e) = worker::send_or_cancel(&cancel, &tx, item).await {
                break e;
            }
        };
        tx.close();
        exit
    });

    rx
}
