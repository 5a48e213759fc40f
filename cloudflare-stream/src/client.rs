//! The Stream API client.

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::rewrite;
use crate::signing::{self, DEFAULT_TOKEN_VALIDITY, TokenSigner};
use crate::transport::{ApiRequest, ReqwestTransport, Transport};
use crate::video::{Envelope, Meta, NAME_KEY, PlaybackUrls, Video};
use http::header::CONTENT_TYPE;
use http::{HeaderName, Method};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::instrument;

const X_AUTH_KEY: HeaderName = HeaderName::from_static("x-auth-key");
const X_AUTH_EMAIL: HeaderName = HeaderName::from_static("x-auth-email");

/// Query parameters for [`StreamClient::list`].
///
/// Starts from `include_counts=true&limit=1000&asc=false`; each setter
/// overrides one key and leaves the others alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    params: Vec<(String, String)>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            params: vec![
                ("include_counts".into(), "true".into()),
                ("limit".into(), "1000".into()),
                ("asc".into(), "false".into()),
            ],
        }
    }
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing a default or earlier value in place.
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn limit(self, limit: u32) -> Self {
        self.set("limit", limit)
    }

    pub fn asc(self, asc: bool) -> Self {
        self.set("asc", asc)
    }

    pub fn include_counts(self, include_counts: bool) -> Self {
        self.set("include_counts", include_counts)
    }

    /// Filters by name (a substring match on the `name` meta key).
    pub fn search(self, query: impl Into<String>) -> Self {
        self.set("search", query.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.params)
            .finish()
    }
}

/// Client for one Cloudflare account's Stream videos.
///
/// Holds credentials and a [`Transport`], and nothing else: every read goes to
/// the API and nothing is cached. Meta updates are read-merge-write of the
/// whole mapping, so concurrent updates to the same video can lose writes.
#[derive(Clone)]
pub struct StreamClient<T = ReqwestTransport> {
    account_id: String,
    auth_key: String,
    auth_email: String,
    signer: Option<TokenSigner>,
    transport: T,
}

impl<T> fmt::Debug for StreamClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamClient")
            .field("account_id", &self.account_id)
            .field("auth_email", &self.auth_email)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl StreamClient<ReqwestTransport> {
    /// Builds a client that talks to the public Cloudflare API.
    pub fn new(config: StreamConfig) -> Result<Self> {
        Self::with_transport(config, ReqwestTransport::default())
    }
}

impl<T: Transport> StreamClient<T> {
    /// Builds a client on top of an arbitrary transport.
    ///
    /// Fails with [`Error::MissingCredentials`] if the account id, auth key, or
    /// auth email is empty, and with [`Error::InvalidSigningKey`] if a signing
    /// key is configured but can't be parsed.
    pub fn with_transport(config: StreamConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let signer = config
            .signing_pair()
            .map(|(id, secret)| TokenSigner::new(id, secret))
            .transpose()?;
        Ok(Self {
            account_id: config.account_id,
            auth_key: config.auth_key,
            auth_email: config.auth_email,
            signer,
            transport,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Whether signed tokens can be produced.
    pub fn can_sign(&self) -> bool {
        self.signer.is_some()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn stream_path(&self) -> String {
        format!("accounts/{}/stream", self.account_id)
    }

    fn video_path(&self, uid: &str) -> String {
        format!("{}/{uid}", self.stream_path())
    }

    /// Sends one authenticated request and returns the body of a 2xx response.
    #[instrument(skip(self, body), level = tracing::Level::TRACE)]
    async fn request(
        &self,
        method: Method,
        path: String,
        body: Option<serde_json::Value>,
    ) -> Result<String> {
        let request = ApiRequest {
            method: method.clone(),
            path,
            headers: vec![
                (X_AUTH_KEY, self.auth_key.clone()),
                (X_AUTH_EMAIL, self.auth_email.clone()),
                (CONTENT_TYPE, "application/json".to_string()),
            ],
            body,
        };
        let path = request.path.clone();
        let response = self.transport.send(request).await?;

        if !response.status.is_success() {
            tracing::debug!(%method, %path, status = %response.status, "Stream API request failed");
            return Err(Error::RequestFailed {
                status: Some(response.status),
                message: response.body,
            });
        }
        Ok(response.body)
    }

    /// Lists videos; returns the raw JSON body.
    #[instrument(skip(self))]
    pub async fn list(&self, params: &ListParams) -> Result<String> {
        let path = format!("{}?{}", self.stream_path(), params.query_string());
        self.request(Method::GET, path, None).await
    }

    /// Fetches one video; returns the raw JSON body.
    #[instrument(skip(self))]
    pub async fn get(&self, uid: &str) -> Result<String> {
        self.request(Method::GET, self.video_path(uid), None).await
    }

    /// Fetches and decodes one video.
    pub async fn video(&self, uid: &str) -> Result<Video> {
        let body = self.get(uid).await?;
        Envelope::decode_result(&body, "video details")
    }

    /// Deletes a video; returns the raw response body.
    #[instrument(skip(self))]
    pub async fn delete(&self, uid: &str) -> Result<String> {
        self.request(Method::DELETE, self.video_path(uid), None)
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_meta(&self, uid: &str) -> Result<Meta> {
        Ok(self.video(uid).await?.meta)
    }

    /// Merges `patch` over the current meta mapping and writes the result back.
    ///
    /// Keys in `patch` win; keys not in `patch` are kept.
    #[instrument(skip(self))]
    pub async fn set_meta(&self, uid: &str, patch: Meta) -> Result<String> {
        let mut meta = self.get_meta(uid).await?;
        meta.extend(patch);
        self.write_meta(uid, meta).await
    }

    /// Removes `key` from the meta mapping and writes the rest back.
    #[instrument(skip(self))]
    pub async fn remove_meta_key(&self, uid: &str, key: &str) -> Result<String> {
        let mut meta = self.get_meta(uid).await?;
        if meta.remove(key).is_none() {
            tracing::debug!(key, "meta key not present; rewriting unchanged mapping");
        }
        self.write_meta(uid, meta).await
    }

    async fn write_meta(&self, uid: &str, meta: Meta) -> Result<String> {
        self.request(
            Method::POST,
            self.video_path(uid),
            Some(json!({ "meta": meta })),
        )
        .await
    }

    /// The video's display name, if one is set.
    #[instrument(skip(self))]
    pub async fn get_name(&self, uid: &str) -> Result<Option<String>> {
        let meta = self.get_meta(uid).await?;
        Ok(meta
            .get(NAME_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    #[instrument(skip(self))]
    pub async fn set_name(&self, uid: &str, name: &str) -> Result<String> {
        let mut patch = Meta::new();
        patch.insert(NAME_KEY.to_string(), name.into());
        self.set_meta(uid, patch).await
    }

    /// Turns the signed URL requirement on or off for a video.
    #[instrument(skip(self))]
    pub async fn set_signed_url_requirement(&self, uid: &str, required: bool) -> Result<String> {
        self.request(
            Method::POST,
            self.video_path(uid),
            Some(json!({ "uid": uid, "requireSignedURLs": required })),
        )
        .await
    }

    /// Input width and height as JSON, e.g. `{"width":1920,"height":1080}`.
    #[instrument(skip(self))]
    pub async fn get_dimensions(&self, uid: &str) -> Result<String> {
        let input = self
            .video(uid)
            .await?
            .input
            .ok_or_else(|| Error::MalformedResponse("video details: missing input".into()))?;
        serde_json::to_string(&input).map_err(|e| Error::malformed("encode dimensions", e))
    }

    /// Signs a playback token for `uid`, valid for `valid_for`.
    pub fn signed_token(&self, uid: &str, valid_for: Duration) -> Result<String> {
        signing::sign_with(self.signer.as_ref(), uid, valid_for)
    }

    /// Signs a playback token for `uid` with the default validity of four hours.
    pub fn signed_token_default(&self, uid: &str) -> Result<String> {
        self.signed_token(uid, DEFAULT_TOKEN_VALIDITY)
    }

    /// Embed markup for a video.
    ///
    /// With `use_signed_token`, the video is looked up and, if it requires
    /// signed URLs, the player's `src` is replaced by a fresh token. With
    /// `add_controls`, the player also gets a `controls` attribute (keeping the
    /// bare uid as `src` if no token is needed). Fails with
    /// [`Error::MissingSigningCredentials`] rather than falling back to an
    /// unsigned player, and with [`Error::MalformedResponse`] if a token is
    /// needed but the markup has no `src` slot to put it in.
    #[instrument(skip(self))]
    pub async fn embed(
        &self,
        uid: &str,
        add_controls: bool,
        use_signed_token: bool,
    ) -> Result<String> {
        let markup = self
            .request(Method::GET, format!("{}/embed", self.video_path(uid)), None)
            .await?;

        let sign = use_signed_token && self.video(uid).await?.require_signed_urls;
        tracing::debug!(sign, add_controls, "embed access decision");
        if !sign && !add_controls {
            return Ok(markup);
        }

        let src = match sign {
            true => self.signed_token_default(uid)?,
            false => uid.to_string(),
        };
        match rewrite::rewrite_embed(&markup, uid, &src, add_controls) {
            Some(rewritten) => Ok(rewritten),
            None if sign => Err(Error::MalformedResponse(format!(
                "embed markup for {uid} has no src slot to sign"
            ))),
            None => {
                tracing::debug!("embed markup has no src slot; controls not added");
                Ok(markup)
            }
        }
    }

    /// Playback URLs keyed by delivery format.
    ///
    /// If `use_signed_token` is set and the video requires signed URLs, one
    /// token is generated and used in place of the uid in every URL.
    #[instrument(skip(self))]
    pub async fn playback(&self, uid: &str, use_signed_token: bool) -> Result<PlaybackUrls> {
        let video = self.video(uid).await?;
        let sign = use_signed_token && video.require_signed_urls;
        tracing::debug!(sign, "playback access decision");
        if !sign {
            return Ok(video.playback);
        }

        let token = self.signed_token_default(uid)?;
        rewrite::rewrite_playback(&video.playback, uid, &token)
    }

    /// [`Self::playback`], serialized as a JSON object.
    pub async fn playback_urls(&self, uid: &str, use_signed_token: bool) -> Result<String> {
        let playback = self.playback(uid, use_signed_token).await?;
        serde_json::to_string(&playback).map_err(|e| Error::malformed("encode playback URLs", e))
    }
}
