//! # Cancellable stream stages for Rust
//!
//! This crate provides a small set of concurrent building blocks over
//! unbuffered, single-writer streams: fan-out, fan-in, map and filter. Every
//! stage spawns a fixed number of Tokio tasks and shares one contract with
//! the others: its outputs close once its input is exhausted or its
//! [`CancellationToken`](tokio_util::sync::CancellationToken) fires, so
//! stages chain without deadlocks or leaked tasks.
//!
//! ## Core Concepts
//!
//! - **Stream**: the read end of a rendezvous channel; a send completes only
//!   once a consumer takes the value
//! - **Stage**: a function that spawns workers reading one stream and
//!   writing to streams it owns
//! - **Cancellation**: a shared token raced against every read and write
//! - **Pipeline**: a fluent wrapper threading one token through many stages
//!
//! ## Example
//!
//! ```rust
//! use fanweld::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cancel = CancellationToken::new();
//!
//!     let numbers = from_iter(&cancel, [5, 2, 8, 1, 9, 3, 7, 4, 6, 0]);
//!     let odd = filter(&cancel, numbers, |x| x % 2 != 0);
//!     let parts = fan_out(&cancel, odd, 3);
//!     let tripled: Vec<_> = parts
//!         .into_iter()
//!         .map(|part| map(&cancel, part, |x| x * 3))
//!         .collect();
//!
//!     let mut values = fan_in(&cancel, tripled).collect().await;
//!     values.sort();
//!     assert_eq!(values, vec![3, 9, 15, 21, 27]);
//! }
//! ```

pub mod core;
pub mod pipeline;
pub mod sinks;
pub mod sources;
pub mod stages;

mod worker;

// Re-export commonly used items
pub mod prelude {
    pub use crate::core::cancel::{with_deadline, with_timeout};
    pub use crate::core::{channel, Error, Result, Stream, StreamSender};
    pub use crate::pipeline::{Pipeline, PipelineConfig};
    pub use crate::sinks::{collect_all, collect_timeout};
    pub use crate::sources::{from_iter, repeat_with};
    pub use crate::stages::{fan_in, fan_out, filter, map, take};
    pub use tokio_util::sync::CancellationToken;
}

// Re-export main items
pub use crate::core::{channel, Error, Result, Stream, StreamSender};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
