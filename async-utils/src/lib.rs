//! # Async utilities
//!
//! Small helpers shared by the docrag crates that talk to hosted services.
//! The main export is [`RetryPolicy`], an exponential-backoff wrapper applied
//! explicitly at each network call site (embedding batches, vector upserts,
//! page crawls).

pub mod retry;

pub use retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, RetryPolicy};
