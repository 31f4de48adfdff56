//! Tokenizer for digest challenge directives.

/// Directives extracted from a `WWW-Authenticate: Digest ...` value.
///
/// Only the directives the digest calculation needs are retained; the rest
/// (`domain`, `stale`, `charset`, `userhash`, ...) are discarded during
/// parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestParams {
    pub realm:       Option<String>,
    pub nonce:       Option<String>,
    pub qop:         Option<String>,
    pub opaque:      Option<String>,
    pub algorithm:   Option<String>,
    pub entity_body: Option<String>,
}

impl DigestParams {
    /// Parse a challenge string of the form
    /// `key1=value1, key2="value2, still value2", ...`.
    ///
    /// Commas inside double-quoted values are part of the value; commas
    /// outside quotes separate directives. Trailing whitespace and newlines
    /// are tolerated, so multi-line challenge literals parse cleanly.
    pub fn parse(challenge: &str) -> Self {
        let mut params = Self::default();
        let mut rest = challenge.trim_end();

        while !rest.is_empty() {
            let Some((key, after)) = rest.split_once('=') else {
                // No further key=value pair; stop rather than guess.
                break;
            };
            let key = key.trim();
            let mut remainder = after.trim_start();

            let value;
            if let Some(quoted) = remainder.strip_prefix('"') {
                match quoted.find('"') {
                    Some(end) => {
                        value = &quoted[..end];
                        remainder = &quoted[end + 1..];
                    }
                    None => {
                        // Unterminated quote: take everything that is left.
                        value = quoted;
                        remainder = "";
                    }
                }
            } else {
                match remainder.find(',') {
                    Some(end) => {
                        value = &remainder[..end];
                        remainder = &remainder[end..];
                    }
                    None => {
                        value = remainder;
                        remainder = "";
                    }
                }
            }

            if let Some(after_comma) = remainder.strip_prefix(',') {
                remainder = after_comma.trim_start();
            }

            params.set(key, value);
            rest = remainder;
        }

        params
    }

    /// The effective algorithm, defaulting to `MD5` when the directive is
    /// absent or empty.
    pub fn algorithm(&self) -> &str {
        match self.algorithm.as_deref() {
            None | Some("") => "MD5",
            Some(a) => a,
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        let slot = match key {
            "realm" => &mut self.realm,
            "nonce" => &mut self.nonce,
            "qop" => &mut self.qop,
            "opaque" => &mut self.opaque,
            "algorithm" => &mut self.algorithm,
            "entityBody" => &mut self.entity_body,
            _ => return,
        };
        *slot = Some(value.to_string());
    }
}
