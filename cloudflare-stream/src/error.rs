//! Error type shared by every client operation.

use http::StatusCode;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A single typed failure per call. Nothing is retried or swallowed internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One of the account-level credentials was empty when building a client.
    #[error("missing Cloudflare credentials: {field} must not be empty")]
    MissingCredentials { field: &'static str },

    /// A signed token was needed but no signing key id/secret pair is configured.
    #[error("signing key id and signing key secret are required to produce signed tokens")]
    MissingSigningCredentials,

    /// The configured signing secret could not be turned into an RSA key.
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// The JWS encoder rejected the token.
    #[error("sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Transport failure or non-success response from the API.
    ///
    /// `status` is `None` when the request never produced a response.
    #[error("Cloudflare Stream request failed{}: {message}", status_suffix(.status))]
    RequestFailed {
        status: Option<StatusCode>,
        message: String,
    },

    /// The response body did not have the expected JSON shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

fn status_suffix(status: &Option<StatusCode>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl Error {
    pub(crate) fn malformed(what: &str, e: impl std::fmt::Display) -> Self {
        Self::MalformedResponse(format!("{what}: {e}"))
    }
}
