//! Fan-out and fan-in stages.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::core::{channel, Stream};
use crate::worker::{self, WorkerExit};

/// Split `input` across `n` output streams.
///
/// Spawns one worker per output. All of them read the same input, so each
/// value reaches exactly one output, whichever worker was free first. No
/// ordering or affinity holds across outputs. Every output closes once the
/// input is exhausted or `cancel` fires; `n == 0` spawns nothing.
pub fn fan_out<T>(cancel: &CancellationToken, input: Stream<T>, n: usize) -> Vec<Stream<T>>
where
    T: Send + 'static,
{
    (0..n)
        .map(|index| {
            let (tx, rx) = channel();
            let cancel = cancel.clone();
            let input = input.clone();

            worker::spawn("fan_out", index, async move {
                let exit = worker::forward(&cancel, &input, &tx, Some).await;
                tx.close();
                exit
            });

            rx
        })
        .collect()
}

/// Merge `inputs` into a single stream.
///
/// Spawns one forwarding worker per input plus a coordinator. Values from
/// different inputs interleave in no particular order; values from any one
/// input keep their relative order. The coordinator closes the merged stream
/// once every forwarder has exited.
///
/// # Examples
///
/// ```rust
/// use fanweld::prelude::*;
///
/// # tokio_test::block_on(async {
/// let cancel = CancellationToken::new();
/// let parts = fan_out(&cancel, from_iter(&cancel, 0..10), 3);
/// let merged = fan_in(&cancel, parts);
///
/// let mut values = merged.collect().await;
/// values.sort();
/// assert_eq!(values, (0..10).collect::<Vec<_>>());
/// # });
/// ```
pub fn fan_in<T, I>(cancel: &CancellationToken, inputs: I) -> Stream<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = Stream<T>>,
{
    let (tx, rx) = channel();
    let output = Arc::new(tx);
    let tracker = TaskTracker::new();

    for (index, input) in inputs.into_iter().enumerate() {
        let cancel = cancel.clone();
        let output = Arc::clone(&output);
        let span = tracing::debug_span!("worker", stage = "fan_in", index);

        tracker.spawn(
            worker::run(async move { worker::forward(&cancel, &input, &*output, Some).await })
                .instrument(span),
        );
    }
    tracker.close();

    let forwarders = tracker.len();
    worker::spawn("fan_in.coordinator", 0, async move {
        tracker.wait().await;
        tracing::trace!(forwarders, "all forwarders exited");
        // Forwarders only held clones; this drop closes the merged stream.
        drop(output);
        WorkerExit::Drained
    });

    rx
}
