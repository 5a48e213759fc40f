//! Credentials handed to the client at construction time.
//!
//! The client never looks configuration up on its own. Callers build a
//! [`StreamConfig`] (by hand, via `serde`, or with [`StreamConfig::from_env`])
//! and pass it to [`StreamClient::new`](crate::StreamClient::new).

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;

/// Environment variable holding the Cloudflare account id.
pub const ENV_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";
/// Environment variable holding the global API key.
pub const ENV_AUTH_KEY: &str = "CLOUDFLARE_AUTH_KEY";
/// Environment variable holding the account e-mail the API key belongs to.
pub const ENV_AUTH_EMAIL: &str = "CLOUDFLARE_AUTH_EMAIL";
/// Environment variable holding the Stream signing key id.
pub const ENV_SIGNING_KEY_ID: &str = "CLOUDFLARE_STREAM_KEY_ID";
/// Environment variable holding the base64-encoded Stream signing key (PEM).
pub const ENV_SIGNING_KEY_SECRET: &str = "CLOUDFLARE_STREAM_KEY_PEM";

/// The five credential fields the client needs.
///
/// `signing_key_id` and `signing_key_secret` are only used when both are set;
/// if either is missing (or empty), signed tokens are unavailable.
#[derive(Clone, Default, Deserialize)]
pub struct StreamConfig {
    pub account_id: String,
    pub auth_key: String,
    pub auth_email: String,
    #[serde(default)]
    pub signing_key_id: Option<String>,
    /// Base64 encoding of the PEM private key, exactly as Cloudflare returns it
    /// from the signing key endpoint.
    #[serde(default)]
    pub signing_key_secret: Option<String>,
}

// Keep secrets out of logs.
impl fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConfig")
            .field("account_id", &self.account_id)
            .field("auth_key", &"<redacted>")
            .field("auth_email", &self.auth_email)
            .field("signing_key_id", &self.signing_key_id)
            .field(
                "signing_key_secret",
                &self.signing_key_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl StreamConfig {
    pub fn new(
        account_id: impl Into<String>,
        auth_key: impl Into<String>,
        auth_email: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            auth_key: auth_key.into(),
            auth_email: auth_email.into(),
            signing_key_id: None,
            signing_key_secret: None,
        }
    }

    /// Adds the signing key pair used for signed playback tokens.
    pub fn with_signing_key(mut self, key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.signing_key_id = Some(key_id.into());
        self.signing_key_secret = Some(secret.into());
        self
    }

    /// Reads the configuration from `CLOUDFLARE_*` environment variables.
    ///
    /// Missing account variables are left empty so that client construction
    /// reports them as [`Error::MissingCredentials`].
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            account_id: var(ENV_ACCOUNT_ID).unwrap_or_default(),
            auth_key: var(ENV_AUTH_KEY).unwrap_or_default(),
            auth_email: var(ENV_AUTH_EMAIL).unwrap_or_default(),
            signing_key_id: var(ENV_SIGNING_KEY_ID),
            signing_key_secret: var(ENV_SIGNING_KEY_SECRET),
        }
    }

    /// Checks that the account-level fields are present.
    pub(crate) fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("account_id", &self.account_id),
            ("auth_key", &self.auth_key),
            ("auth_email", &self.auth_email),
        ] {
            if value.is_empty() {
                return Err(Error::MissingCredentials { field });
            }
        }
        Ok(())
    }

    /// Returns the signing key pair if, and only if, both halves are non-empty.
    pub(crate) fn signing_pair(&self) -> Option<(&str, &str)> {
        match (
            self.signing_key_id.as_deref().filter(|s| !s.is_empty()),
            self.signing_key_secret.as_deref().filter(|s| !s.is_empty()),
        ) {
            (Some(id), Some(secret)) => Some((id, secret)),
            (None, None) => None,
            _ => {
                tracing::warn!("only one of signing key id and secret is set; signing disabled");
                None
            }
        }
    }
}
