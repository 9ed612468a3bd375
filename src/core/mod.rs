//! Core types for the fanweld library.
//!
//! This module contains the rendezvous stream, the error type and the
//! cancellation helpers every stage is built on.

pub mod cancel;
pub mod channel;
pub mod error;

// Re-export core items
pub use channel::{channel, Stream, StreamSender};
pub use error::{Error, Result};
