//! Session creation and the poll loop.
//!
//! A live-pricing search is a server-side session: one request creates it and
//! answers with a poll location, which is then fetched until the vertical's
//! completeness predicate accepts the response or the try budget runs out.
//!
//! Verticals don't subclass anything. Each one is a [`SessionSpec`] value that
//! says how to build the creation request and how to recognise a complete
//! result; [`Transport::get_result`] does the rest.

use std::time::Duration;
use tracing::{Instrument, debug, info, warn};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::http::{ErrorMode, Exchange, RequestSpec, Transport, join_url};
use crate::params::Params;

/// How the wait between tries evolves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Backoff {
    /// The same delay before every try.
    #[default]
    Fixed,
    /// The delay is multiplied by `factor` after every try.
    Geometric { factor: f64 },
}

/// Timing and budget of one poll loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Wait before the first poll.
    pub initial_delay: Duration,
    /// Wait between two polls.
    pub delay: Duration,
    /// Maximum number of polls.
    pub tries: usize,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            delay: Duration::from_secs(1),
            tries: 20,
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    /// No waiting at all; `tries` polls back to back.
    pub fn immediate(tries: usize) -> Self {
        Self {
            initial_delay: Duration::ZERO,
            delay: Duration::ZERO,
            tries,
            backoff: Backoff::Fixed,
        }
    }

    /// Wait after the poll numbered `attempt` (1-based).
    ///
    /// Geometric growth saturates at [`Duration::MAX`].
    pub fn delay_after(&self, attempt: usize) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Geometric { .. } if self.delay.is_zero() => Duration::ZERO,
            Backoff::Geometric { factor } => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as usize) as i32;
                let secs = self.delay.as_secs_f64() * factor.max(0.0).powi(exponent);
                Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
            }
        }
    }
}

/// A created session waiting to be polled.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSession {
    location: String,
    params: Params,
    tries: usize,
}

impl PollSession {
    pub fn new(location: impl Into<String>, params: Params) -> Self {
        Self {
            location: location.into(),
            params,
            tries: 0,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Parameters sent with every poll (filters, sorting...).
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Polls performed so far.
    pub fn tries(&self) -> usize {
        self.tries
    }
}

/// Builds a session creation request from the API host and caller parameters.
pub type CreateFn = fn(&str, &mut Params) -> Result<RequestSpec>;

/// Decides whether a poll response is final.
pub type CompleteFn = fn(Option<&Document>) -> bool;

/// Per-vertical configuration of the protocol.
#[derive(Debug, Clone, Copy)]
pub struct SessionSpec {
    pub name: &'static str,
    /// Keys consumed by session creation. When set, every other key is
    /// forwarded to the polls instead.
    pub session_keys: Option<&'static [&'static str]>,
    pub create: CreateFn,
    pub is_complete: CompleteFn,
}

impl SessionSpec {
    /// Removes and returns the parameters meant for polling.
    pub fn poll_filters(&self, params: &mut Params) -> Params {
        match self.session_keys {
            Some(keys) => params.split_off_except(keys),
            None => Params::new(),
        }
    }
}

impl<E: Exchange> Transport<E> {
    /// Creates a session and returns where to poll it.
    ///
    /// A relative `Location` is resolved against the API host. `Ok(None)` is
    /// only returned in ignore mode, when no location could be obtained.
    pub async fn create_session(
        &self,
        spec: &SessionSpec,
        mut params: Params,
        errors: Option<ErrorMode>,
    ) -> Result<Option<String>> {
        let request = (spec.create)(self.api_host(), &mut params)?;
        self.open_session(spec.name, request, errors).await
    }

    /// Executes an already built creation request and resolves its `Location`.
    pub async fn open_session(
        &self,
        name: &str,
        request: RequestSpec,
        errors: Option<ErrorMode>,
    ) -> Result<Option<String>> {
        let mode = errors.unwrap_or(self.error_mode());
        let response = self.make_request(request, Some(mode)).await?;
        match response.location {
            Some(location) => {
                let location = join_url(self.api_host(), &location);
                debug!(parent: self.span(), "{} session created at {}", name, location);
                Ok(Some(location))
            }
            None if mode == ErrorMode::Ignore => {
                warn!(parent: self.span(), "{} session returned no poll location", name);
                Ok(None)
            }
            None => Err(Error::MissingLocation),
        }
    }

    /// Polls `session` until `is_complete` accepts a response or the policy's
    /// tries are used up.
    ///
    /// On exhaustion strict mode fails with [`Error::ExceededRetries`]; the
    /// other modes return the last document, which may be incomplete or absent.
    pub async fn poll_session(
        &self,
        session: PollSession,
        is_complete: CompleteFn,
        policy: &RetryPolicy,
        errors: Option<ErrorMode>,
    ) -> Result<Option<Document>> {
        let mode = errors.unwrap_or(self.error_mode());
        self.poll_loop(session, is_complete, policy, mode)
            .instrument(self.span().clone())
            .await
    }

    #[tracing::instrument(skip_all, fields(location = %session.location, tries = policy.tries))]
    async fn poll_loop(
        &self,
        mut session: PollSession,
        is_complete: CompleteFn,
        policy: &RetryPolicy,
        mode: ErrorMode,
    ) -> Result<Option<Document>> {
        tokio::time::sleep(policy.initial_delay).await;

        let mut last = None;
        while session.tries < policy.tries {
            session.tries += 1;

            let request =
                RequestSpec::get(session.location.as_str()).with_query(session.params.clone());
            last = match self.make_request(request, Some(mode)).await {
                Ok(response) => response.parsed,
                // Nothing new yet; poll again
                Err(Error::NotModified) => None,
                Err(e) => return Err(e),
            };

            if is_complete(last.as_ref()) {
                info!("Result complete after {} tries", session.tries);
                return Ok(last);
            }

            debug!("Try {}/{} incomplete", session.tries, policy.tries);
            if session.tries < policy.tries {
                tokio::time::sleep(policy.delay_after(session.tries)).await;
            }
        }

        if mode == ErrorMode::Strict {
            return Err(Error::ExceededRetries {
                tries: session.tries,
            });
        }

        warn!("No complete result after {} tries", session.tries);
        Ok(last)
    }

    /// Creates a session for `spec` and polls it with the transport's policy.
    pub async fn get_result(
        &self,
        spec: &SessionSpec,
        params: Params,
        errors: Option<ErrorMode>,
    ) -> Result<Option<Document>> {
        let policy = self.retry_policy().clone();
        self.get_result_with(spec, params, &policy, errors).await
    }

    /// [`Transport::get_result`] with an explicit retry policy.
    pub async fn get_result_with(
        &self,
        spec: &SessionSpec,
        mut params: Params,
        policy: &RetryPolicy,
        errors: Option<ErrorMode>,
    ) -> Result<Option<Document>> {
        let filters = spec.poll_filters(&mut params);

        let Some(location) = self.create_session(spec, params, errors).await? else {
            return Ok(None);
        };

        let session = PollSession::new(location, filters);
        self.poll_session(session, spec.is_complete, policy, errors)
            .await
    }
}
