use crate::domain::ports::IdentityVerifier;
use crate::domain::principal::{AuthError, Principal, bearer_token};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies HMAC-SHA256 signed bearer tokens.
///
/// A token is `base64url(email|expires_at) . base64url(signature)` where
/// `expires_at` is a unix timestamp in seconds.
#[derive(Clone)]
pub struct HmacTokenVerifier {
    secret: Vec<u8>,
    ttl: Duration,
}

impl HmacTokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl,
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }

    /// Issues a token for `email` that expires after the configured ttl.
    pub fn issue(&self, email: &str) -> String {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .timestamp();
        self.sign(&format!("{}|{}", email, expires_at))
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or(AuthError::MalformedCredential)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedCredential)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::MalformedCredential)?;

        let mut mac = self.mac();
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let payload = String::from_utf8(payload).map_err(|_| AuthError::MalformedCredential)?;
        let (email, expires_at) = payload
            .rsplit_once('|')
            .ok_or(AuthError::MalformedCredential)?;
        let expires_at: i64 = expires_at
            .parse()
            .map_err(|_| AuthError::MalformedCredential)?;
        if email.is_empty() {
            return Err(AuthError::MalformedCredential);
        }
        if expires_at <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }

        Ok(Principal::new(email))
    }
}

#[async_trait]
impl IdentityVerifier for HmacTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<Principal, AuthError> {
        self.verify_token(bearer_token(credential)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> HmacTokenVerifier {
        HmacTokenVerifier::new("test-secret", Duration::hours(1))
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let verifier = verifier();
        let token = verifier.issue("a@x.com");

        let principal = verifier.verify(&format!("Bearer {token}")).await.unwrap();
        assert_eq!(principal.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_rejects_token_signed_with_other_secret() {
        let other = HmacTokenVerifier::new("other-secret", Duration::hours(1));
        let token = other.issue("a@x.com");

        let result = verifier().verify(&token).await;
        assert_eq!(result, Err(AuthError::InvalidSignature));
    }

    #[tokio::test]
    async fn test_rejects_tampered_payload() {
        let verifier = verifier();
        let token = verifier.issue("a@x.com");
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", URL_SAFE_NO_PAD.encode("admin@x.com|9999999999"), signature);

        assert_eq!(
            verifier.verify(&forged).await,
            Err(AuthError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn test_rejects_expired_token() {
        let verifier = HmacTokenVerifier::new("test-secret", Duration::hours(-1));
        let token = verifier.issue("a@x.com");

        assert_eq!(verifier.verify(&token).await, Err(AuthError::Expired));
    }

    #[tokio::test]
    async fn test_issue_saturates_oversized_ttl() {
        let verifier = HmacTokenVerifier::new("test-secret", Duration::MAX);
        let token = verifier.issue("a@x.com");

        let principal = verifier.verify(&token).await.unwrap();
        assert_eq!(principal.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_rejects_garbage() {
        let verifier = verifier();
        assert_eq!(
            verifier.verify("Bearer not-a-token").await,
            Err(AuthError::MalformedCredential)
        );
        assert_eq!(verifier.verify("").await, Err(AuthError::MissingCredential));
    }
}
