//! The worker loop shared by every stage.
//!
//! A worker owns exactly one output stream and never owns its input. It
//! suspends at two points per iteration, waiting for an input value and
//! waiting for a consumer to take its output, and races both against the
//! cancellation token. Cancellation is polled first, so a signalled token
//! always wins a tie.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::core::{Stream, StreamSender};

/// Why a worker stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// The input stream was closed and fully read
    Drained,
    /// The cancellation token fired
    Cancelled,
    /// Every consumer of the output stream went away
    Disconnected,
    /// A user-supplied closure panicked
    Panicked(String),
}

/// Outcome of one read from the input stream.
pub(crate) enum Recv<T> {
    Value(T),
    Exit(WorkerExit),
}

/// Wait for the next input value unless cancellation comes first.
pub(crate) async fn recv_or_cancel<T>(cancel: &CancellationToken, input: &Stream<T>) -> Recv<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Recv::Exit(WorkerExit::Cancelled),
        value = input.recv() => match value {
            Some(value) => Recv::Value(value),
            None => Recv::Exit(WorkerExit::Drained),
        },
    }
}

/// Hand `value` to a consumer unless cancellation comes first.
///
/// Returns `None` once the value was taken.
pub(crate) async fn send_or_cancel<T>(
    cancel: &CancellationToken,
    output: &StreamSender<T>,
    value: T,
) -> Option<WorkerExit> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Some(WorkerExit::Cancelled),
        sent = output.send(value) => sent.err().map(|_| WorkerExit::Disconnected),
    }
}

/// Run a user closure, turning a panic into an exit reason.
pub(crate) fn contain<R>(f: impl FnOnce() -> R) -> Result<R, WorkerExit> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| WorkerExit::Panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Read from `input`, pass every value through `step`, and forward whatever it
/// keeps to `output` until the input drains or the worker is told to stop.
///
/// `step` returning `None` drops the value and moves on to the next read.
pub(crate) async fn forward<T, U, F>(
    cancel: &CancellationToken,
    input: &Stream<T>,
    output: &StreamSender<U>,
    mut step: F,
) -> WorkerExit
where
    F: FnMut(T) -> Option<U>,
{
    loop {
        let value = match recv_or_cancel(cancel, input).await {
            Recv::Value(value) => value,
            Recv::Exit(exit) => return exit,
        };

        let kept = match contain(|| step(value)) {
            Ok(Some(kept)) => kept,
            Ok(None) => continue,
            Err(exit) => return exit,
        };

        if let Some(exit) = send_or_cancel(cancel, output, kept).await {
            return exit;
        }
    }
}

/// Spawn a worker task labelled with its stage name and index.
///
/// The future must close its output before resolving.
pub(crate) fn spawn<F>(stage: &'static str, index: usize, worker: F) -> JoinHandle<()>
where
    F: Future<Output = WorkerExit> + Send + 'static,
{
    let span = tracing::debug_span!("worker", stage, index);
    tokio::spawn(run(worker).instrument(span))
}

/// Drive a worker to completion and log how it ended.
pub(crate) async fn run<F>(worker: F)
where
    F: Future<Output = WorkerExit>,
{
    tracing::trace!("worker started");
    match worker.await {
        WorkerExit::Panicked(message) => {
            tracing::error!(%message, "user function panicked, worker stopped");
        }
        exit => tracing::debug!(?exit, "worker exited"),
    }
}
