//! Cloudflare Stream API client.
//!
//! Lists, inspects, renames, tags, and deletes Stream videos, and produces
//! signed playback tokens for videos that require them.
//!
//! # Signed URLs
//!
//! A video with `requireSignedURLs` set can only be played through a token
//! signed with one of the account's Stream signing keys. [`StreamClient::embed`]
//! and [`StreamClient::playback`] make that decision per call: they look the
//! video up, and if a token is needed they sign one and put it where the uid
//! would otherwise go. If no signing key is configured the call fails with
//! [`Error::MissingSigningCredentials`] instead of handing out a URL that won't
//! play.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cloudflare_stream::{ListParams, StreamClient, StreamConfig};
//!
//! # async fn example() -> cloudflare_stream::Result<()> {
//! let config = StreamConfig::new("account-id", "api-key", "me@example.com")
//!     .with_signing_key("signing-key-id", "LS0tLS1CRUdJTi...");
//! let client = StreamClient::new(config)?;
//!
//! let listing = client.list(&ListParams::new().limit(20)).await?;
//! println!("{listing}");
//!
//! let html = client.embed("ea95132c15732412d22c1476fa83f27a", true, true).await?;
//! println!("{html}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod rewrite;
pub mod signing;
pub mod transport;
pub mod video;

pub use client::{ListParams, StreamClient};
pub use config::StreamConfig;
pub use error::{Error, Result};
pub use signing::{DEFAULT_TOKEN_VALIDITY, TokenClaims, TokenSigner};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
pub use video::{Dimensions, Meta, PlaybackUrls, Video};
