//! Stream API resource types.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Custom key/value annotations attached to a video.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Delivery format name (`hls`, `dash`, ...) to playback URL.
pub type PlaybackUrls = BTreeMap<String, String>;

/// Meta key Cloudflare uses as the video's display name.
pub const NAME_KEY: &str = "name";

/// The `{result, success, errors, messages}` wrapper around every JSON response.
///
/// See: <https://developers.cloudflare.com/api/>
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub result: Option<T>,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decodes `body` and unwraps its `result`.
    pub fn decode_result(body: &str, what: &str) -> Result<T> {
        let envelope: Self =
            serde_json::from_str(body).map_err(|e| Error::malformed(what, e))?;
        if !envelope.success {
            let message = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::RequestFailed {
                status: None,
                message,
            });
        }
        envelope
            .result
            .ok_or_else(|| Error::MalformedResponse(format!("{what}: missing result")))
    }
}

/// A Stream video.
///
/// Only the fields this crate acts on are modelled; the raw JSON is available
/// through [`StreamClient::get`](crate::StreamClient::get).
///
/// See: <https://developers.cloudflare.com/api/operations/stream-videos-retrieve-video-details>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub uid: String,
    #[serde(default)]
    pub meta: Meta,
    /// Whether playback requires a signed token instead of the bare uid.
    #[serde(rename = "requireSignedURLs", default)]
    pub require_signed_urls: bool,
    #[serde(default)]
    pub playback: PlaybackUrls,
    pub input: Option<Dimensions>,
    #[serde(rename = "readyToStream", default)]
    pub ready_to_stream: bool,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
}

impl Video {
    /// The display name, if one is set.
    pub fn name(&self) -> Option<&str> {
        self.meta.get(NAME_KEY).and_then(|v| v.as_str())
    }
}

/// Width and height of the uploaded input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: i64,
    pub height: i64,
}
