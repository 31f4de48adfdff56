//! HTTP client authentication negotiation.
//!
//! Implements the client side of the HTTP challenge/response protocol for
//! the Basic (RFC 7617) and Digest (RFC 7616) schemes. No I/O happens here;
//! the crate turns `WWW-Authenticate` challenge values into `Authorization`
//! header values and nothing else.
//!
//! # Key Features
//!
//! - **Scheme negotiation**: a deferred authenticator holds credentials and
//!   promotes itself to Basic or Digest when a server challenge arrives
//! - **Exact output**: digest authorization values are bit-reproducible
//!   given a fixed cnonce source, which servers (and tests) rely on
//! - **Injectable randomness**: the cnonce generator is a trait, so tests
//!   can substitute a deterministic source
//!
//! # Example
//!
//! ```
//! use rampart_auth::Authenticator;
//!
//! let auth = Authenticator::deferred("Aladdin", "open sesame");
//! let auth = auth.challenge(&[r#"Basic realm="WallyWorld""#]).unwrap();
//! let value = auth.authorization_value("GET", "/lamp").unwrap().unwrap();
//! assert_eq!(value, "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
//! ```

pub use self::authenticator::{Authenticator, DigestAuth, Scheme};
pub use self::challenge::DigestParams;
pub use self::digest::{CnonceSource, FixedCnonce, RandomCnonce};
pub use self::error::{AuthError, Result};

mod authenticator;
mod challenge;
mod digest;
mod error;
