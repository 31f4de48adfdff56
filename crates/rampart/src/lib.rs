//! Resilient HTTP client plumbing.
//!
//! Augments a plain HTTP transport with two independent retry disciplines:
//!
//! - **Authentication negotiation** ([`Client`]): a 401 challenge promotes
//!   the client's credentials to a concrete scheme (Basic or Digest, via
//!   [`rampart-auth`](rampart_auth)), and the request is replayed with a
//!   byte-identical body, bounded at three renegotiations
//! - **Backoff retry** ([`Backoff`]): a transport decorator that retries
//!   transient (connection-refused class) failures with exponential
//!   backoff, leaving permanent errors untouched
//!
//! Both layers wrap the same [`Transport`] contract and can be stacked in
//! either order. All work happens on the calling task; backoff waits block
//! that caller and select on a cancellation token rather than sleeping
//! unconditionally.
//!
//! # Example
//!
//! ```no_run
//! use rampart::{Backoff, BackoffPolicy, Client, ReqwestTransport};
//! use rampart::auth::Authenticator;
//!
//! # async fn demo() -> rampart::Result<()> {
//! let transport = Backoff::new(
//!     ReqwestTransport::new(),
//!     BackoffPolicy::default(),
//!     "api.example.org",
//! );
//! let client = Client::new("https://api.example.org", transport)
//!     .with_authentication(Authenticator::deferred("user", "secret"));
//!
//! let res = client.get("/status").await?;
//! assert!(res.status.is_success());
//! # Ok(())
//! # }
//! ```

pub use rampart_auth as auth;

pub use self::body::Body;
pub use self::client::Client;
pub use self::cookies::CookieStore;
pub use self::error::{Error, Result, is_connection_refused};
pub use self::retry::{Backoff, BackoffPolicy, NotifyFn};
pub use self::transport::{Request, Response, Transport};

#[cfg(feature = "reqwest")]
pub use self::transport::ReqwestTransport;

mod body;
mod client;
mod cookies;
mod error;
mod retry;
mod transport;
