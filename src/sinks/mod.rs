//! Sink helpers for draining streams.

use std::time::Duration;

use futures::future;

use crate::core::{Error, Result, Stream};

/// Drain a stream, counting its values.
pub async fn count<T>(stream: Stream<T>) -> usize {
    let mut count = 0;
    while stream.recv().await.is_some() {
        count += 1;
    }
    count
}

/// Call `f` on every value until the stream closes.
pub async fn for_each<T, F>(stream: Stream<T>, mut f: F)
where
    F: FnMut(T),
{
    while let Some(item) = stream.recv().await {
        f(item);
    }
}

/// Drain a stream into a vector, giving up after `timeout`.
///
/// Fails with [`Error::Timeout`] if the stream has not closed in time.
pub async fn collect_timeout<T>(stream: Stream<T>, timeout: Duration) -> Result<Vec<T>> {
    tokio::time::timeout(timeout, stream.collect())
        .await
        .map_err(|_| Error::timed_out_after(timeout))
}

/// Drain several streams concurrently, one vector per stream.
///
/// Draining fan-out outputs one after another would leave the other workers
/// parked on their writes; this keeps every output moving.
pub async fn collect_all<T, I>(streams: I) -> Vec<Vec<T>>
where
    I: IntoIterator<Item = Stream<T>>,
{
    future::join_all(streams.into_iter().map(Stream::collect)).await
}
