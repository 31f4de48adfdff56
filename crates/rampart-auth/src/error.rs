#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no supported digest algorithm offered in challenge: {0}")]
    UnsupportedAlgorithm(String),

    #[error("unsupported qop directive: {0:?}")]
    UnsupportedQop(String),

    #[error("challenge scheme mismatch: expected {expected:?}, got {line:?}")]
    SchemeMismatch {
        expected: &'static str,
        line:     String,
    },
}

pub type Result<T> = std::result::Result<T, AuthError>;
