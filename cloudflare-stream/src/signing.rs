//! Signed playback tokens.
//!
//! Cloudflare Stream accepts an RS256-signed JWT in place of a video uid for
//! videos that have `requireSignedURLs` set. The token names the signing key
//! (`kid`), the video (`sub`), and an expiry (`exp`). The remote playback
//! service verifies it; this crate only produces it.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Validity used when the caller doesn't pick one.
pub const DEFAULT_TOKEN_VALIDITY: Duration = Duration::from_secs(4 * 60 * 60);

/// Claims carried by a signed playback token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Id of the signing key registered with Cloudflare.
    pub kid: String,
    /// The video uid the token grants access to.
    pub sub: String,
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

/// Produces signed playback tokens from a Stream signing key.
///
/// Stateless: every call to [`TokenSigner::sign`] builds a fresh token with a
/// fresh expiry, even for the same uid.
#[derive(Clone)]
pub struct TokenSigner {
    key_id: String,
    key: EncodingKey,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Builds a signer from a key id and the base64-encoded PEM private key.
    pub fn new(key_id: impl Into<String>, secret_b64: &str) -> Result<Self> {
        let pem = STANDARD
            .decode(secret_b64.trim())
            .map_err(|e| Error::InvalidSigningKey(format!("secret is not valid base64: {e}")))?;
        let key = EncodingKey::from_rsa_pem(&pem)
            .map_err(|e| Error::InvalidSigningKey(format!("secret is not an RSA PEM key: {e}")))?;
        Ok(Self {
            key_id: key_id.into(),
            key,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Signs a token for `uid` that expires `valid_for` from now.
    #[tracing::instrument(skip(self), level = tracing::Level::DEBUG)]
    pub fn sign(&self, uid: &str, valid_for: Duration) -> Result<String> {
        let valid_for = i64::try_from(valid_for.as_secs()).unwrap_or(i64::MAX);
        let claims = TokenClaims {
            kid: self.key_id.clone(),
            sub: uid.to_string(),
            exp: jiff::Timestamp::now().as_second().saturating_add(valid_for),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key_id.clone());

        let token = jsonwebtoken::encode(&header, &claims, &self.key).map_err(Error::Signing)?;
        tracing::trace!(exp = claims.exp, "signed playback token");
        Ok(token)
    }
}

/// Signs with `signer`, or fails because no signing key is configured.
pub(crate) fn sign_with(signer: Option<&TokenSigner>, uid: &str, valid_for: Duration) -> Result<String> {
    signer
        .ok_or(Error::MissingSigningCredentials)?
        .sign(uid, valid_for)
}
