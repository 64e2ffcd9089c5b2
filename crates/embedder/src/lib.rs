//! Governed remote embedding client.
//!
//! Every call goes through a [`context_governor::Governor`] reservation before
//! it reaches the provider, and every chunk in a batch is retried and released
//! independently so one bad chunk cannot poison the rest.

mod client;
mod embedder;
mod error;

pub use embedder::{Embedder, EmbedderConfig, Vector};
pub use error::{EmbedderError, Result};
