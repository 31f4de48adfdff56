//! Authenticator variants and challenge negotiation.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::challenge::DigestParams;
use crate::digest;
use crate::digest::{CnonceSource, RandomCnonce};
use crate::error::{AuthError, Result};

/// Authentication scheme discriminant.
///
/// The string forms are stable identifiers that callers may compare
/// against; new schemes must extend this enum rather than a string match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    None,
    Basic,
    Digest,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::None => "none",
            Scheme::Basic => "basic",
            Scheme::Digest => "digest",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client-side authenticator.
///
/// `challenge` consumes `WWW-Authenticate` lines and may return a
/// *different* variant (Anonymous promotes to Basic or Digest). Callers
/// must treat the return value as the new authenticator; the original is
/// never mutated in place.
#[derive(Clone)]
pub enum Authenticator {
    /// Holds credentials (possibly empty) but sends nothing until a
    /// challenge selects a concrete scheme.
    Anonymous { user: String, password: String },
    Basic { user: String, password: String },
    Digest(DigestAuth),
}

impl Authenticator {
    /// An authenticator with no credentials at all. Requests go out
    /// unmodified and challenges leave it unchanged.
    pub fn anonymous() -> Self {
        Authenticator::Anonymous {
            user:     String::new(),
            password: String::new(),
        }
    }

    /// Credentials without a scheme; the first server challenge decides
    /// whether they are presented as Basic or Digest.
    pub fn deferred(user: impl Into<String>, password: impl Into<String>) -> Self {
        Authenticator::Anonymous {
            user:     user.into(),
            password: password.into(),
        }
    }

    pub fn basic(user: impl Into<String>, password: impl Into<String>) -> Self {
        Authenticator::Basic {
            user:     user.into(),
            password: password.into(),
        }
    }

    pub fn digest(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self::digest_with_cnonce(user, password, Arc::new(RandomCnonce))
    }

    /// Digest authenticator with an explicit cnonce source, for
    /// deterministic output in tests.
    pub fn digest_with_cnonce(
        user: impl Into<String>,
        password: impl Into<String>,
        cnonce: Arc<dyn CnonceSource>,
    ) -> Self {
        Authenticator::Digest(DigestAuth {
            user: user.into(),
            password: password.into(),
            params: DigestParams::default(),
            cnonce,
            nonce_count: Arc::new(AtomicU32::new(1)),
        })
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Authenticator::Anonymous { .. } => Scheme::None,
            Authenticator::Basic { .. } => Scheme::Basic,
            Authenticator::Digest(_) => Scheme::Digest,
        }
    }

    pub fn user(&self) -> &str {
        match self {
            Authenticator::Anonymous { user, .. } | Authenticator::Basic { user, .. } => user,
            Authenticator::Digest(d) => &d.user,
        }
    }

    pub fn password(&self) -> &str {
        match self {
            Authenticator::Anonymous { password, .. }
            | Authenticator::Basic { password, .. } => password,
            Authenticator::Digest(d) => &d.password,
        }
    }

    /// React to the `WWW-Authenticate` values of a 401 response.
    ///
    /// Anonymous with credentials promotes to Digest when any line starts
    /// with `Digest`, otherwise to Basic when any line starts with `Basic`.
    /// Without credentials, or without a recognized scheme, it stays
    /// Anonymous so unauthenticated access proceeds unmodified.
    ///
    /// Basic and Digest reject lines carrying any other scheme.
    pub fn challenge(&self, lines: &[&str]) -> Result<Authenticator> {
        match self {
            Authenticator::Anonymous { user, password } => {
                if user.is_empty() {
                    return Ok(self.clone());
                }
                if lines.iter().any(|l| l.starts_with("Digest")) {
                    return Authenticator::digest(user.as_str(), password.as_str())
                        .challenge(lines);
                }
                if lines.iter().any(|l| l.starts_with("Basic")) {
                    return Authenticator::basic(user.as_str(), password.as_str())
                        .challenge(lines);
                }
                Ok(self.clone())
            }
            Authenticator::Basic { .. } => {
                for line in lines {
                    if !line.starts_with("Basic") {
                        return Err(AuthError::SchemeMismatch {
                            expected: "Basic",
                            line:     line.to_string(),
                        });
                    }
                }
                Ok(self.clone())
            }
            Authenticator::Digest(d) => d.challenge(lines).map(Authenticator::Digest),
        }
    }

    /// Produce the `Authorization` header value for a request, or `None`
    /// for the anonymous scheme.
    ///
    /// Callers overwrite (never append) the header with this value, so
    /// repeated calls with the same state are idempotent at the request
    /// level.
    pub fn authorization_value(&self, method: &str, uri_path: &str) -> Result<Option<String>> {
        match self {
            Authenticator::Anonymous { .. } => Ok(None),
            Authenticator::Basic { user, password } => {
                let encoded = BASE64.encode(format!("{user}:{password}"));
                Ok(Some(format!("Basic {encoded}")))
            }
            Authenticator::Digest(d) => d.authorization_value(method, uri_path).map(Some),
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Credentials stay out of debug output.
        f.debug_struct("Authenticator")
            .field("scheme", &self.scheme())
            .field("user", &self.user())
            .finish_non_exhaustive()
    }
}

/// Digest authenticator state: credentials plus the directives of the
/// challenge it was negotiated from.
#[derive(Clone)]
pub struct DigestAuth {
    user:        String,
    password:    String,
    params:      DigestParams,
    cnonce:      Arc<dyn CnonceSource>,
    nonce_count: Arc<AtomicU32>,
}

impl DigestAuth {
    /// Select a usable challenge line and parse its directives.
    ///
    /// Only the MD5 family is implemented: a line explicitly offering
    /// `algorithm=MD5` (or `MD5-sess`) wins, else a line with no
    /// `algorithm` directive is accepted and defaults to MD5. Anything
    /// else fails negotiation instead of proceeding insecurely.
    fn challenge(&self, lines: &[&str]) -> Result<DigestAuth> {
        for line in lines {
            if !line.starts_with("Digest") {
                return Err(AuthError::SchemeMismatch {
                    expected: "Digest",
                    line:     line.to_string(),
                });
            }
        }

        let chosen: &str = lines
            .iter()
            .copied()
            .find(|l| l.contains("algorithm=MD5"))
            .or_else(|| lines.iter().copied().find(|l| !l.contains("algorithm")))
            .ok_or_else(|| AuthError::UnsupportedAlgorithm(lines.join(", ")))?;

        Ok(DigestAuth {
            user: self.user.clone(),
            password: self.password.clone(),
            params: DigestParams::parse(chosen["Digest".len()..].trim()),
            cnonce: self.cnonce.clone(),
            // A fresh challenge carries a fresh nonce, so the count restarts.
            nonce_count: Arc::new(AtomicU32::new(1)),
        })
    }

    fn authorization_value(&self, method: &str, uri_path: &str) -> Result<String> {
        let nc = self.nonce_count.fetch_add(1, Ordering::Relaxed);
        digest::authorization_value(
            &self.user,
            &self.password,
            &self.params,
            method,
            uri_path,
            &self.cnonce.cnonce(),
            nc,
        )
    }
}

impl fmt::Debug for DigestAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestAuth")
            .field("user", &self.user)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::FixedCnonce;

    const DIGEST_CHALLENGE: &str = r#"Digest realm="http-auth@example.org", qop="auth", algorithm=MD5, nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v", opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS""#;

    #[test]
    fn deferred_promotes_to_digest() {
        let auth = Authenticator::deferred("Mufasa", "Circle of Life");
        let auth = auth.challenge(&[DIGEST_CHALLENGE]).unwrap();
        assert_eq!(auth.scheme(), Scheme::Digest);
        assert_eq!(auth.scheme().as_str(), "digest");
        assert_eq!(auth.user(), "Mufasa");
    }

    #[test]
    fn deferred_promotes_to_basic() {
        let auth = Authenticator::deferred("Aladdin", "open sesame");
        let auth = auth.challenge(&[r#"Basic realm="WallyWorld""#]).unwrap();
        assert_eq!(auth.scheme(), Scheme::Basic);
        assert_eq!(auth.scheme().as_str(), "basic");
    }

    #[test]
    fn mixed_scheme_lines_rejected_by_digest() {
        let auth = Authenticator::deferred("u", "p");
        let err = auth
            .challenge(&[r#"Basic realm="r""#, DIGEST_CHALLENGE])
            .unwrap_err();
        // A Digest line takes priority, and the digest variant then rejects
        // the foreign Basic line rather than silently picking one.
        assert!(matches!(err, AuthError::SchemeMismatch { expected: "Digest", .. }));
    }

    #[test]
    fn no_credentials_stays_anonymous() {
        let auth = Authenticator::anonymous();
        let auth = auth.challenge(&[r#"Basic realm="WallyWorld""#]).unwrap();
        assert_eq!(auth.scheme(), Scheme::None);
        assert_eq!(auth.authorization_value("GET", "/").unwrap(), None);
    }

    #[test]
    fn unrecognized_scheme_stays_anonymous() {
        let auth = Authenticator::deferred("u", "p");
        let auth = auth.challenge(&[r#"Negotiate abc"#]).unwrap();
        assert_eq!(auth.scheme(), Scheme::None);
    }

    #[test]
    fn basic_authorization_value() {
        let auth = Authenticator::basic("Aladdin", "open sesame");
        let value = auth.authorization_value("GET", "/").unwrap().unwrap();
        assert_eq!(value, "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn basic_rejects_foreign_scheme() {
        let auth = Authenticator::basic("u", "p");
        let err = auth.challenge(&[DIGEST_CHALLENGE]).unwrap_err();
        assert!(matches!(err, AuthError::SchemeMismatch { expected: "Basic", .. }));
    }

    #[test]
    fn digest_rejects_unsupported_algorithm() {
        let auth = Authenticator::digest("u", "p");
        let err = auth
            .challenge(&[r#"Digest realm="r", algorithm=SHA-256, nonce="n""#])
            .unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn digest_accepts_line_without_algorithm_directive() {
        let auth = Authenticator::digest("u", "p");
        let auth = auth
            .challenge(&[r#"Digest realm="r", nonce="n", qop="auth""#])
            .unwrap();
        assert_eq!(auth.scheme(), Scheme::Digest);
        let value = auth.authorization_value("GET", "/x").unwrap().unwrap();
        assert!(value.contains("algorithm=MD5"), "{value}");
    }

    #[test]
    fn full_negotiated_digest_value_is_deterministic() {
        let auth = Authenticator::digest_with_cnonce(
            "Mufasa",
            "Circle of Life",
            Arc::new(FixedCnonce("f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ".into())),
        );
        let auth = auth.challenge(&[DIGEST_CHALLENGE]).unwrap();
        let value = auth
            .authorization_value("GET", "/dir/index.html")
            .unwrap()
            .unwrap();
        assert!(value.contains(r#"response="8ca523f5e9506fed4657c9700eebdbec""#), "{value}");
        assert!(value.contains("nc=00000001"), "{value}");
    }

    #[test]
    fn nonce_count_increments_per_request() {
        let auth = Authenticator::digest_with_cnonce(
            "u",
            "p",
            Arc::new(FixedCnonce("0123456789abcdef".into())),
        );
        let auth = auth
            .challenge(&[r#"Digest realm="r", nonce="n", qop="auth""#])
            .unwrap();
        let first = auth.authorization_value("GET", "/x").unwrap().unwrap();
        let second = auth.authorization_value("GET", "/x").unwrap().unwrap();
        assert!(first.contains("nc=00000001"), "{first}");
        assert!(second.contains("nc=00000002"), "{second}");
    }
}
