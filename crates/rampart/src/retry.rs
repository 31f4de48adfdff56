//! Exponential-backoff retry decorator for transient network failures.
//!
//! Independent of authentication: the decorator wraps any [`Transport`]
//! and retries only errors classified transient by
//! [`Error::is_transient`]. Everything else propagates unchanged on the
//! first attempt.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::transport::{Request, Response, Transport};

/// Bounds and shape of the retry wait sequence.
///
/// Waits grow as `initial_interval * multiplier^n`, capped at
/// `max_interval`. A zero `max_elapsed_time` disables the elapsed bound
/// and a zero `max_tries` disables the count bound.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub initial_interval: Duration,
    pub multiplier:       f64,
    pub max_interval:     Duration,
    pub max_elapsed_time: Duration,
    pub max_tries:        u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            initial_interval: Duration::from_millis(500),
            multiplier:       1.5,
            max_interval:     Duration::from_secs(60),
            max_elapsed_time: Duration::from_secs(15 * 60),
            max_tries:        0,
        }
    }
}

impl BackoffPolicy {
    /// The wait before retry number `retry` (0-indexed).
    pub fn interval(&self, retry: u32) -> Duration {
        let scaled = self.initial_interval.as_secs_f64() * self.multiplier.powi(retry as i32);
        if !scaled.is_finite() || scaled >= self.max_interval.as_secs_f64() {
            self.max_interval
        } else {
            Duration::from_secs_f64(scaled)
        }
    }
}

/// Notification hook invoked before each retry wait with the target
/// identifier, the computed wait, and the error that triggered the retry.
/// Purely observational; it cannot alter control flow.
pub type NotifyFn = dyn Fn(&str, Duration, &Error) + Send + Sync;

/// Transport decorator that retries transient failures.
pub struct Backoff<T> {
    inner:  T,
    policy: BackoffPolicy,
    target: String,
    notify: Box<NotifyFn>,
    cancel: CancellationToken,
}

impl<T: Transport> Backoff<T> {
    /// Wrap a transport. `target` identifies the endpoint in retry
    /// notifications and logs.
    pub fn new(inner: T, policy: BackoffPolicy, target: impl Into<String>) -> Self {
        Backoff {
            inner,
            policy,
            target: target.into(),
            notify: Box::new(|target, next, err| {
                tracing::warn!(
                    endpoint = %target,
                    next_retry = ?next,
                    error = %err,
                    "request failed, backing off",
                );
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the default (logging) notification hook.
    pub fn with_notify(
        mut self,
        notify: impl Fn(&str, Duration, &Error) + Send + Sync + 'static,
    ) -> Self {
        self.notify = Box::new(notify);
        self
    }

    /// Cancelling the token aborts the in-flight attempt and any pending
    /// backoff wait.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn run(&self, req: &Request) -> Result<Response> {
        let started = Instant::now();
        let mut retry = 0u32;

        loop {
            let attempt = tokio::select! {
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                res = self.inner.send(req) => res,
            };

            let err = match attempt {
                Ok(response) => return Ok(response),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => err,
            };

            // Bounds exhausted: the last error is returned unchanged, so it
            // still classifies as transient for any outer policy.
            let tries = retry + 1;
            if self.policy.max_tries != 0 && tries >= self.policy.max_tries {
                return Err(err);
            }
            let wait = self.policy.interval(retry);
            if !self.policy.max_elapsed_time.is_zero()
                && started.elapsed() + wait > self.policy.max_elapsed_time
            {
                return Err(err);
            }

            (self.notify)(&self.target, wait, &err);

            tokio::select! {
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
            retry += 1;
        }
    }
}

impl<T: Transport> Transport for Backoff<T> {
    async fn send(&self, req: &Request) -> Result<Response> {
        self.run(req).await
    }
}
