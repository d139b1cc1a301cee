//! External row store interface
//!
//! The survey's only persistence is an append-only row store operated
//! elsewhere (a hosted sheet behind an HTTP endpoint). This module defines
//! the narrow capability the rest of the crate sees, the HTTP client that
//! implements it in production, and the retry pipeline around it.
//!
//! Failure taxonomy: transient errors (timeouts, connect failures, 429, 5xx)
//! are worth retrying; everything else is permanent and reaches the caller
//! immediately.

pub mod http;
pub mod retry;

use async_trait::async_trait;
use ssp_common::Result;

pub use http::HttpRowStore;
pub use retry::{append_with_retry, RetryPolicy};

/// Append-only access to the external row store
///
/// `append_row` must be atomic from the caller's perspective: either the row
/// is durably appended or an error comes back. Cells arrive in canonical
/// column order (`ResponseRecord::to_row`); implementations never reorder or
/// interpret them.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn append_row(&self, row: &[String]) -> Result<()>;
}
