use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A verified identity extracted from a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
}

impl Principal {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// Case-insensitive comparison against a stored email address.
    pub fn is(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// Role requirement of an operation, checked by the authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authenticated,
    Admin,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("malformed credential")]
    MalformedCredential,
    #[error("invalid credential signature")]
    InvalidSignature,
    #[error("credential expired")]
    Expired,
}

/// Extracts the token from an `Authorization` header value.
///
/// Accepts `Bearer <token>` as well as a bare token.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let header = header.trim();
    let token = match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        Some(_) => return Err(AuthError::MalformedCredential),
        None => header,
    };
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}
