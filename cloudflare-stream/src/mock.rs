//! In-memory fake of the Stream API for testing.
//!
//! [`MockTransport`] answers the requests [`StreamClient`](crate::StreamClient)
//! makes against a small per-account video store, and records every request so
//! tests can assert on paths, headers, and bodies. Writes are applied the way
//! the real API applies them: a `meta` body replaces the whole mapping.

use crate::error::Result;
use crate::transport::{ApiRequest, ApiResponse, Transport};
use http::{Method, StatusCode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MockState {
    videos: HashMap<String, Value>,
    requests: Vec<ApiRequest>,
    fail_next: Option<ApiResponse>,
    embed_overrides: HashMap<String, String>,
}

/// Fake Stream API for one account.
#[derive(Debug, Clone)]
pub struct MockTransport {
    account_id: String,
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Adds a ready-to-stream video with the usual playback URLs.
    pub async fn add_video(&self, uid: &str, require_signed_urls: bool, meta: Value) {
        let video = json!({
            "uid": uid,
            "readyToStream": true,
            "thumbnail": format!("https://videodelivery.net/{uid}/thumbnails/thumbnail.jpg"),
            "meta": meta,
            "requireSignedURLs": require_signed_urls,
            "input": {"width": 1280, "height": 720},
            "playback": {
                "hls": format!("https://videodelivery.net/{uid}/manifest/video.m3u8"),
                "dash": format!("https://videodelivery.net/{uid}/manifest/video.mpd"),
            },
            "duration": 42.0,
        });
        self.state.lock().await.videos.insert(uid.to_string(), video);
    }

    /// Makes the next request fail with `status` and `body`.
    pub async fn fail_next(&self, status: StatusCode, body: impl Into<String>) {
        self.state.lock().await.fail_next = Some(ApiResponse {
            status,
            body: body.into(),
        });
    }

    /// Serves `markup` instead of [`Self::embed_markup`] for `uid`.
    pub async fn set_embed_markup(&self, uid: &str, markup: impl Into<String>) {
        self.state
            .lock()
            .await
            .embed_overrides
            .insert(uid.to_string(), markup.into());
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().await.requests.clone()
    }

    /// The stored JSON for `uid`, if it exists.
    pub async fn video(&self, uid: &str) -> Option<Value> {
        self.state.lock().await.videos.get(uid).cloned()
    }

    /// The embed markup the real API returns for `uid`.
    pub fn embed_markup(uid: &str) -> String {
        format!(
            r#"<stream src="{uid}"></stream><script data-cfasync="false" defer type="text/javascript" src="https://embed.videodelivery.net/embed/r4xu.fla9.latest.js?video={uid}"></script>"#
        )
    }

    fn envelope(result: Value) -> ApiResponse {
        ApiResponse {
            status: StatusCode::OK,
            body: json!({"result": result, "success": true, "errors": [], "messages": []})
                .to_string(),
        }
    }

    fn not_found(uid: &str) -> ApiResponse {
        ApiResponse {
            status: StatusCode::NOT_FOUND,
            body: json!({
                "result": null,
                "success": false,
                "errors": [{"code": 10005, "message": format!("video {uid} not found")}],
                "messages": [],
            })
            .to_string(),
        }
    }

    fn handle(&self, state: &mut MockState, request: &ApiRequest) -> ApiResponse {
        let prefix = format!("accounts/{}/stream", self.account_id);
        let Some(rest) = request.path.strip_prefix(&prefix) else {
            return ApiResponse {
                status: StatusCode::FORBIDDEN,
                body: "wrong account".into(),
            };
        };

        if rest.is_empty() || rest.starts_with('?') {
            let mut videos: Vec<_> = state.videos.values().cloned().collect();
            videos.sort_by(|a, b| a["uid"].as_str().cmp(&b["uid"].as_str()));
            let total = videos.len().to_string();
            return ApiResponse {
                status: StatusCode::OK,
                body: json!({
                    "result": videos,
                    "success": true,
                    "errors": [],
                    "messages": [],
                    "total": total,
                })
                .to_string(),
            };
        }

        let rest = rest.trim_start_matches('/');
        let (uid, embed) = match rest.strip_suffix("/embed") {
            Some(uid) => (uid, true),
            None => (rest, false),
        };

        match (&request.method, embed) {
            (&Method::GET, true) => match state.videos.contains_key(uid) {
                true => ApiResponse {
                    status: StatusCode::OK,
                    body: state
                        .embed_overrides
                        .get(uid)
                        .cloned()
                        .unwrap_or_else(|| Self::embed_markup(uid)),
                },
                false => Self::not_found(uid),
            },
            (&Method::GET, false) => match state.videos.get(uid) {
                Some(video) => Self::envelope(video.clone()),
                None => Self::not_found(uid),
            },
            (&Method::DELETE, false) => match state.videos.remove(uid) {
                Some(_) => ApiResponse {
                    status: StatusCode::OK,
                    body: String::new(),
                },
                None => Self::not_found(uid),
            },
            (&Method::POST, false) => {
                let Some(video) = state.videos.get_mut(uid) else {
                    return Self::not_found(uid);
                };
                let body = request.body.clone().unwrap_or(Value::Null);
                if let Some(meta) = body.get("meta") {
                    video["meta"] = meta.clone();
                }
                if let Some(required) = body.get("requireSignedURLs") {
                    video["requireSignedURLs"] = required.clone();
                }
                Self::envelope(video.clone())
            }
            _ => ApiResponse {
                status: StatusCode::METHOD_NOT_ALLOWED,
                body: String::new(),
            },
        }
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut state = self.state.lock().await;
        state.requests.push(request.clone());
        if let Some(failure) = state.fail_next.take() {
            return Ok(failure);
        }
        if request.header("X-Auth-Key").is_none() || request.header("X-Auth-Email").is_none() {
            return Ok(ApiResponse {
                status: StatusCode::UNAUTHORIZED,
                body: "missing auth headers".into(),
            });
        }
        Ok(self.handle(&mut state, &request))
    }
}
