//! Stage constructors.
//!
//! Each constructor spawns its workers immediately and hands back the read
//! end(s) of the stream(s) those workers own. A stage's outputs are always
//! closed once its input is exhausted or the cancellation token fires, so
//! stages can be chained freely. Constructors must be called from within a
//! Tokio runtime.

mod fan;

pub use fan::{fan_in, fan_out};

use tokio_util::sync::CancellationToken;

use crate::core::{channel, Stream};
use crate::worker::{self, Recv, WorkerExit};

/// Apply `f` to every value of `input`.
///
/// One worker; output order matches input order. A panic inside `f` stops the
/// worker and closes the output early.
///
/// # Examples
///
/// ```rust
/// use fanweld::prelude::*;
///
/// # tokio_test::block_on(async {
/// let cancel = CancellationToken::new();
/// let numbers = from_iter(&cancel, 1..=3);
/// let doubled = map(&cancel, numbers, |x| x * 2);
///
/// assert_eq!(doubled.collect().await, vec![2, 4, 6]);
/// # });
/// ```
pub fn map<A, B, F>(cancel: &CancellationToken, input: Stream<A>, mut f: F) -> Stream<B>
where
    A: Send + 'static,
    B: Send + 'static,
    F: FnMut(A) -> B + Send + 'static,
{
    let (tx, rx) = channel();
    let cancel = cancel.clone();

    worker::spawn("map", 0, async move {
        let exit = worker::forward(&cancel, &input, &tx, |value| Some(f(value))).await;
        tx.close();
        exit
    });

    rx
}

/// Forward only the values of `input` for which `predicate` holds.
///
/// One worker; relative order is preserved. Rejected values are dropped
/// without touching the output.
pub fn filter<T, F>(cancel: &CancellationToken, input: Stream<T>, mut predicate: F) -> Stream<T>
where
    T: Send + 'static,
    F: FnMut(&T) -> bool + Send + 'static,
{
    let (tx, rx) = channel();
    let cancel = cancel.clone();

    worker::spawn("filter", 0, async move {
        let exit =
            worker::forward(&cancel, &input, &tx, |value| predicate(&value).then_some(value))
                .await;
        tx.close();
        exit
    });

    rx
}

/// Forward at most `count` values of `input`, then close.
///
/// The worker stops reading as soon as `count` values were handed on, so the
/// rest of `input` stays available to any other consumer.
pub fn take<T>(cancel: &CancellationToken, input: Stream<T>, count: usize) -> Stream<T>
where
    T: Send + 'static,
{
    let (tx, rx) = channel();
    let cancel = cancel.clone();

    worker::spawn("take", 0, async move {
        let mut exit = WorkerExit::Drained;
        for _ in 0..count {
            let value = match worker::recv_or_cancel(&cancel, &input).await {
                Recv::Value(value) => value,
                Recv::Exit(e) => {
                    exit = e;
                    break;
                }
            };
            if let Some(e) = worker::send_or_cancel(&cancel, &tx, value).await {
                exit = e;
                break;
            }
        }
        tx.close();
        exit
    });

    rx
}
