//! Configuration loaded from environment variables.

use chrono::{Duration, Utc};

pub const DEFAULT_SITE_DOMAIN: &str = "http://localhost:5173";
pub const DEFAULT_CURRENCY: &str = "usd";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct Config {
    /// Secret used to sign and verify bearer tokens.
    pub token_secret: String,
    /// Lifetime of issued tokens.
    pub token_ttl: Duration,
    /// Public origin of the web client, used for checkout redirect URLs.
    pub site_domain: String,
    /// ISO currency code for checkout sessions.
    pub currency: String,
    /// Accounts bootstrapped with the admin role at startup.
    pub admin_emails: Vec<String>,
    /// Stripe secret key. Only needed by the Stripe gateway.
    pub stripe_secret_key: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_secret = lookup("ZAPSHIFT_TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingEnvVar("ZAPSHIFT_TOKEN_SECRET"))?;

        let token_ttl = match lookup("ZAPSHIFT_TOKEN_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .and_then(Duration::try_hours)
                .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
                .ok_or(ConfigError::InvalidValue("ZAPSHIFT_TOKEN_TTL_HOURS", raw))?,
            None => Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        };

        let site_domain = lookup("ZAPSHIFT_SITE_DOMAIN")
            .unwrap_or_else(|| DEFAULT_SITE_DOMAIN.to_string())
            .trim_end_matches('/')
            .to_string();

        let currency = lookup("ZAPSHIFT_CURRENCY")
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
            .to_lowercase();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(ConfigError::InvalidValue("ZAPSHIFT_CURRENCY", currency));
        }

        let admin_emails = lookup("ZAPSHIFT_ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let stripe_secret_key = lookup("STRIPE_SECRET_KEY").filter(|s| !s.is_empty());

        Ok(Self {
            token_secret,
            token_ttl,
            site_domain,
            currency,
            admin_emails,
            stripe_secret_key,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
