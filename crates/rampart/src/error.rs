//! Error types and transient/permanent classification.

use std::io;

use http::{Method, StatusCode};

use crate::transport::Response;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Auth(#[from] rampart_auth::AuthError),

    #[error("authorization denied: {status} for {method} {url}")]
    AuthorizationDenied {
        status:   StatusCode,
        method:   Method,
        url:      String,
        response: Response,
    },

    #[error("too many authentication retries ({attempts} attempts)")]
    TooManyAuthRetries {
        attempts: u32,
        response: Response,
    },

    /// Connect/dial-refused class failure; the only kind retried by the
    /// backoff decorator.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other transport failure, DNS resolution included.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Whether a retry is likely to succeed.
    ///
    /// Only connection-refused class errors qualify. DNS failures,
    /// application errors and authorization outcomes are permanent, so
    /// callers can layer a secondary policy (failover, surfacing) on top
    /// of this predicate.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Connect(_))
    }

    /// The response captured alongside an authorization failure, if any.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::AuthorizationDenied { response, .. }
            | Error::TooManyAuthRetries { response, .. } => Some(response),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Walk an error's source chain looking for a refused connection.
///
/// This is the dial/connect classification: `ConnectionRefused` at any
/// depth marks the error transient; everything else, DNS resolution
/// failures included, stays permanent.
pub fn is_connection_refused(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        current = e.source();
    }
    false
}
