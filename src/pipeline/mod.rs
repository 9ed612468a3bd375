//! Fluent pipeline construction.
//!
//! [`Pipeline`] carries a cancellation token and a stream through a chain of
//! stages so the token does not have to be threaded by hand. Every method
//! spawns its workers under a tracing span named after the pipeline.

use std::borrow::Cow;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::{Result, Stream};
use crate::{sinks, sources, stages};

/// Configuration for a pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Name recorded on the tracing span of every worker
    pub name: Cow<'static, str>,
    /// Upper bound on [`Pipeline::collect`]; `None` waits indefinitely
    pub collect_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("pipeline"),
            collect_timeout: None,
        }
    }
}

/// A stream plus the token that cancels every stage built on it.
///
/// # Examples
///
/// ```rust
/// use fanweld::prelude::*;
///
/// # tokio_test::block_on(async {
/// let cancel = CancellationToken::new();
///
/// let mut squares = Pipeline::from_iter(cancel, 0..20)
///     .name("squares")
///     .filter(|x| x % 2 == 1)
///     .balance(4, |part| part.map(|x| x * x))
///     .collect()
///     .await?;
///
/// squares.sort();
/// assert_eq!(squares, vec![1, 9, 25, 49, 81, 121, 169, 225, 289, 361]);
/// # Ok::<(), fanweld::Error>(())
/// # });
/// ```
pub struct Pipeline<T> {
    cancel: CancellationToken,
    stream: Stream<T>,
    config: PipelineConfig,
}

impl<T> Pipeline<T>
where
    T: Send + 'static,
{
    /// Wrap an existing stream
    pub fn new(cancel: CancellationToken, stream: Stream<T>) -> Self {
        Self {
            cancel,
            stream,
            config: PipelineConfig::default(),
        }
    }

    /// Start a pipeline from an iterator
    pub fn from_iter<I>(cancel: CancellationToken, iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let stream = sources::from_iter(&cancel, iter);
        Self::new(cancel, stream)
    }

    /// Set the pipeline name
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Bound how long [`collect`](Self::collect) may wait
    pub fn collect_timeout(mut self, timeout: Duration) -> Self {
        self.config.collect_timeout = Some(timeout);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// The token cancelling this pipeline's stages
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Apply a function to every value
    pub fn map<U, F>(self, f: F) -> Pipeline<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        self.then(|cancel, stream| stages::map(cancel, stream, f))
    }

    /// Keep only the values matching `predicate`
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + Send + 'static,
    {
        self.then(|cancel, stream| stages::filter(cancel, stream, predicate))
    }

    /// Keep at most `count` values
    pub fn take(self, count: usize) -> Self {
        self.then(|cancel, stream| stages::take(cancel, stream, count))
    }

    /// Split into `n` pipelines sharing this one's token and configuration
    pub fn fan_out(self, n: usize) -> Vec<Pipeline<T>> {
        let span = self.span();
        let _entered = span.enter();
        stages::fan_out(&self.cancel, self.stream, n)
            .into_iter()
            .map(|stream| Pipeline {
                cancel: self.cancel.clone(),
                stream,
                config: self.config.clone(),
            })
            .collect()
    }

    /// Merge pipelines into one.
    ///
    /// The merged pipeline is cancelled by `cancel` and takes its
    /// configuration from the first part, if any.
    pub fn fan_in<I>(cancel: CancellationToken, parts: I) -> Pipeline<T>
    where
        I: IntoIterator<Item = Pipeline<T>>,
    {
        let mut config = None;
        let streams: Vec<_> = parts
            .into_iter()
            .map(|part| {
                config.get_or_insert(part.config);
                part.stream
            })
            .collect();

        let config = config.unwrap_or_default();

        let span = tracing::debug_span!("pipeline", name = %config.name);
        let stream = span.in_scope(|| stages::fan_in(&cancel, streams));
        Pipeline {
            cancel,
            stream,
            config,
        }
    }

    /// Fan out to `n` parts, run `branch` on each, and fan the results in.
    pub fn balance<U, F>(self, n: usize, branch: F) -> Pipeline<U>
    where
        U: Send + 'static,
        F: Fn(Pipeline<T>) -> Pipeline<U>,
    {
        let cancel = self.cancel.clone();
        let config = self.config.clone();
        let parts: Vec<_> = self.fan_out(n).into_iter().map(branch).collect();
        Pipeline::fan_in(cancel, parts).config(config)
    }

    /// Unwrap into the underlying stream
    pub fn into_stream(self) -> Stream<T> {
        self.stream
    }

    /// Drain the pipeline into a vector.
    ///
    /// Fails with [`Error::Timeout`](crate::Error::Timeout) if a collect timeout is configured and
    /// the stream has not closed in time.
    pub async fn collect(self) -> Result<Vec<T>> {
        match self.config.collect_timeout {
            Some(timeout) => sinks::collect_timeout(self.stream, timeout).await,
            None => Ok(self.stream.collect().await),
        }
    }

    fn span(&self) -> tracing::Span {
        tracing::debug_span!("pipeline", name = %self.config.name)
    }

    fn then<U, F>(self, stage: F) -> Pipeline<U>
    where
        F: FnOnce(&CancellationToken, Stream<T>) -> Stream<U>,
    {
        let stream = self.span().in_scope(|| stage(&self.cancel, self.stream));
        Pipeline {
            cancel: self.cancel,
            stream,
            config: self.config,
        }
    }
}
