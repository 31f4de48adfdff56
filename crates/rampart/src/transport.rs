//! Transport abstraction over a single request/response round trip.

use std::future::Future;

use http::{HeaderMap, Method, StatusCode};

use crate::body::Body;
use crate::error::Result;

/// An outgoing request with a fully buffered body.
#[derive(Debug, Clone)]
pub struct Request {
    pub method:  Method,
    pub url:     String,
    pub headers: HeaderMap,
    pub body:    Body,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Request {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }
}

/// A response with the entity buffered in full.
#[derive(Debug, Clone)]
pub struct Response {
    pub status:  StatusCode,
    pub headers: HeaderMap,
    pub body:    Body,
}

impl Response {
    /// All `WWW-Authenticate` values, one challenge line per entry.
    pub fn challenge_lines(&self) -> Vec<String> {
        self.headers
            .get_all(http::header::WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

/// Synchronous-per-call HTTP transport.
///
/// This is the minimal contract both retry layers wrap: one request in,
/// one response or error out. Implementations handle their own connection
/// management; decorators stack by implementing the trait around another
/// transport.
///
/// # Implementations
///
/// - [`ReqwestTransport`]: production implementation using `reqwest`
/// - [`crate::Backoff`]: retry decorator around any other transport
/// - Mock implementations for testing
pub trait Transport: Send + Sync {
    /// Send the request and buffer the response.
    ///
    /// Taking `&Request` keeps replay trivial: the caller still owns the
    /// request and can resend it byte-for-byte.
    fn send(&self, req: &Request) -> impl Future<Output = Result<Response>> + Send;
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    async fn send(&self, req: &Request) -> Result<Response> {
        (**self).send(req).await
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::error::{Error, is_connection_refused};

    /// Production transport backed by a `reqwest::Client`.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Wrap an existing client, keeping its timeout/proxy/TLS settings.
        pub fn with_client(client: reqwest::Client) -> Self {
            ReqwestTransport { client }
        }
    }

    fn classify(err: reqwest::Error) -> Error {
        if is_connection_refused(&err) {
            Error::Connect(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }

    impl Transport for ReqwestTransport {
        async fn send(&self, req: &Request) -> Result<Response> {
            let response = self
                .client
                .request(req.method.clone(), req.url.as_str())
                .headers(req.headers.clone())
                .body(req.body.bytes().to_vec())
                .send()
                .await
                .map_err(classify)?;

            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await.map_err(classify)?;

            Ok(Response {
                status,
                headers,
                body: Body::new(bytes),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestTransport;
