//! Submission retry services.

mod driver;

pub use driver::{with_retry, Backoff, RetryPolicy, SubmissionClient};
