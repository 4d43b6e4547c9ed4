//! HTTP transport: request execution, error classification and recovery.

pub mod classify;
mod client;
mod exchange;

pub use classify::{ErrorMode, RATE_LIMIT_NOTE, with_error_handling};
pub use client::{ApiResponse, Transport, join_url};
pub use exchange::{Exchange, HttpExchange, RawResponse, RequestSpec};

#[cfg(test)]
pub use exchange::MockExchange;
