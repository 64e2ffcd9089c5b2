//! Request-per-minute, token-per-minute, and request-per-day quota gate sitting
//! in front of the embedder, with shared exponential backoff on throttling.

mod backoff;
mod error;
mod governor;
mod window;

pub use error::{GovernorError, Result};
pub use governor::{Governor, GovernorConfig, Outcome, Permit};
