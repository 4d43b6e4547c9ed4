pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod http;
pub mod params;
pub mod session;
pub mod verticals;

pub use config::{Config, Credentials};
pub use document::{Document, ResponseFormat};
pub use error::{Error, Result};
pub use http::{ErrorMode, Transport};
pub use params::{Params, construct_params};
pub use session::{Backoff, PollSession, RetryPolicy, SessionSpec};
