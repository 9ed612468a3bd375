//! Rendezvous streams.
//!
//! A [`Stream`] is the read end of an unbuffered conduit: a send only
//! completes once some consumer has taken the value. The write end,
//! [`StreamSender`], has a single owner and closes the stream when it is
//! dropped. Read ends can be cloned; clones compete for values rather than
//! each seeing every value.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};

use crate::core::error::{Error, Result};

/// A value in flight together with the acknowledgement its sender waits on.
struct Handoff<T> {
    value: T,
    ack: oneshot::Sender<()>,
}

/// Create a new rendezvous stream, returning its write and read ends.
///
/// # Examples
///
/// ```rust
/// # tokio_test::block_on(async {
/// let (tx, rx) = fanweld::channel();
///
/// let producer = tokio::spawn(async move {
///     tx.send(7).await.unwrap();
///     // `tx` dropped here: the stream is closed.
/// });
///
/// assert_eq!(rx.recv().await, Some(7));
/// assert_eq!(rx.recv().await, None);
/// producer.await.unwrap();
/// # });
/// ```
pub fn channel<T>() -> (StreamSender<T>, Stream<T>) {
    let (tx, rx) = mpsc::channel(1);
    (
        StreamSender { tx },
        Stream {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// The write end of a [`Stream`].
pub struct StreamSender<T> {
    tx: mpsc::Sender<Handoff<T>>,
}

impl<T> StreamSender<T> {
    /// Hand a value to a consumer, waiting until one has taken it.
    ///
    /// Fails with [`Error::ChannelClosed`] once every read end is gone. If
    /// this future is dropped after the value was queued, a consumer may
    /// still receive it.
    pub async fn send(&self, value: T) -> Result<()> {
        let (ack, acked) = oneshot::channel();
        self.tx
            .send(Handoff { value, ack })
            .await
            .map_err(|_| Error::ChannelClosed)?;
        acked.await.map_err(|_| Error::ChannelClosed)
    }

    /// Whether every read end has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Close the stream. Consumers see end-of-data after draining.
    pub fn close(self) {
        tracing::trace!("output stream closed");
    }
}

impl<T> fmt::Debug for StreamSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSender")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// The read end of a rendezvous stream.
///
/// Cloning yields another consumer of the same stream.
pub struct Stream<T> {
    rx: Arc<Mutex<mpsc::Receiver<Handoff<T>>>>,
}

impl<T> Stream<T> {
    /// Receive the next value, or `None` once the producer has closed the
    /// stream and nothing is left in flight.
    ///
    /// Cancel safe: dropping the future before it completes loses no value.
    pub async fn recv(&self) -> Option<T> {
        let mut rx = self.rx.lock().await;
        let Handoff { value, ack } = rx.recv().await?;
        // The sender may have stopped waiting; the value is ours either way.
        let _ = ack.send(());
        Some(value)
    }

    /// Drain the stream into a vector.
    pub async fn collect(self) -> Vec<T> {
        let mut items = Vec::new();
        while let Some(item) = self.recv().await {
            items.push(item);
        }
        items
    }

    /// Adapt into a [`futures::Stream`].
    pub fn into_stream(self) -> impl futures::Stream<Item = T>
    where
        T: Send + 'static,
    {
        futures::stream::unfold(self, |stream| async move {
            let item = stream.recv().await?;
            Some((item, stream))
        })
    }
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("consumers", &Arc::strong_count(&self.rx))
            .finish()
    }
}
