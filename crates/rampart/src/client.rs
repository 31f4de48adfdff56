//! HTTP client with challenge-driven authentication retry.

use std::sync::{Arc, Mutex};

use http::header::{AUTHORIZATION, HeaderValue};
use http::{Method, StatusCode};
use rampart_auth::{Authenticator, Scheme};
use tokio_util::sync::CancellationToken;

use crate::body::Body;
use crate::cookies::CookieStore;
use crate::error::{Error, Result};
use crate::transport::{Request, Response, Transport};

/// Maximum renegotiation attempts after the initial request.
const MAX_AUTH_RETRIES: u32 = 3;

/// A client for one HTTP origin.
///
/// Issues requests through a [`Transport`], reacting to 401 challenges by
/// negotiating a concrete authenticator and replaying the buffered body.
/// The active authenticator and the cookie store are shared across
/// concurrent calls; each request works from a snapshot taken up front, so
/// a substitution made by a concurrent negotiation never races a request
/// already in flight (last writer wins).
pub struct Client<T> {
    root:      String,
    headers:   http::HeaderMap,
    transport: T,
    auth:      Mutex<Arc<Authenticator>>,
    cookies:   CookieStore,
    cancel:    CancellationToken,
}

impl<T: Transport> Client<T> {
    /// Create a client for the given root URL (scheme + authority, no
    /// trailing slash needed).
    pub fn new(root: impl Into<String>, transport: T) -> Self {
        let mut root = root.into();
        while root.ends_with('/') {
            root.pop();
        }
        Client {
            root,
            headers: http::HeaderMap::new(),
            transport,
            auth: Mutex::new(Arc::new(Authenticator::anonymous())),
            cookies: CookieStore::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the credentials and method. Use [`Authenticator::deferred`] to
    /// let the server's challenge select the scheme.
    pub fn with_authentication(self, auth: Authenticator) -> Self {
        *self.auth.lock().expect("authenticator lock poisoned") = Arc::new(auth);
        self
    }

    /// Add a header applied to every request.
    pub fn with_header(mut self, key: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.append(key, value);
        self
    }

    /// Cancelling the token aborts in-flight network calls.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Snapshot of the active authenticator.
    pub fn authenticator(&self) -> Arc<Authenticator> {
        self.auth.lock().expect("authenticator lock poisoned").clone()
    }

    /// Drop any stored cookies.
    pub fn clear_cookies(&self) {
        self.cookies.clear();
    }

    fn swap_authenticator(&self, auth: Authenticator) {
        *self.auth.lock().expect("authenticator lock poisoned") = Arc::new(auth);
    }

    /// Perform one logical request, negotiating authentication as needed.
    ///
    /// On a 401 while still anonymous, the challenge is consumed, the
    /// shared authenticator is replaced, the body is rewound and the
    /// request replayed, bounded at [`MAX_AUTH_RETRIES`] renegotiations. A
    /// 401 after credentials were presented is an immediate
    /// [`Error::AuthorizationDenied`]; a second rejection means invalid
    /// credentials, not a negotiation in progress.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: impl Into<Body>,
    ) -> Result<Response> {
        let mut body = body.into();
        let path = with_leading_slash(path);
        let url = format!("{}{}", self.root, path);
        // The digest uri field covers the path only, not the query.
        let uri_path = path.split('?').next().unwrap_or(&path).to_string();

        let mut depth = 1u32;
        loop {
            let auth = self.authenticator();

            let mut req = Request::new(method.clone(), url.clone());
            req.headers = self.headers.clone();
            self.cookies.apply(&mut req.headers);
            if let Some(value) = auth.authorization_value(method.as_str(), &uri_path)? {
                let value = HeaderValue::from_str(&value)
                    .map_err(|e| Error::InvalidRequest(e.to_string()))?;
                req.headers.insert(AUTHORIZATION, value);
            }
            req.body = body.clone();

            let mut res = tokio::select! {
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                res = self.transport.send(&req) => res?,
            };

            if res.status == StatusCode::UNAUTHORIZED {
                if auth.scheme() != Scheme::None {
                    return Err(Error::AuthorizationDenied {
                        status: res.status,
                        method,
                        url,
                        response: res,
                    });
                }
                if depth > MAX_AUTH_RETRIES {
                    return Err(Error::TooManyAuthRetries {
                        attempts: depth,
                        response: res,
                    });
                }

                let lines = res.challenge_lines();
                let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
                let renewed = auth.challenge(&lines)?;
                self.swap_authenticator(renewed);

                res.body.close();
                body.rewind();
                depth += 1;
                continue;
            }

            self.cookies.store(&res.headers);
            return Ok(res);
        }
    }

    pub async fn head(&self, path: &str) -> Result<Response> {
        self.request(Method::HEAD, path, Body::empty()).await
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request(Method::GET, path, Body::empty()).await
    }

    pub async fn put(&self, path: &str, body: impl Into<Body>) -> Result<Response> {
        self.request(Method::PUT, path, body).await
    }

    pub async fn post(&self, path: &str, body: impl Into<Body>) -> Result<Response> {
        self.request(Method::POST, path, body).await
    }

    /// The request body should normally be empty for DELETE (RFC 9110).
    pub async fn delete(&self, path: &str, body: impl Into<Body>) -> Result<Response> {
        self.request(Method::DELETE, path, body).await
    }
}

fn with_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_slash_added_when_missing() {
        assert_eq!(with_leading_slash("x/y"), "/x/y");
        assert_eq!(with_leading_slash("/x/y"), "/x/y");
    }
}
