//! Substituting a signed token for a video uid in embed markup and playback URLs.
//!
//! Only the designated slots are touched: the `src` attribute whose value is
//! exactly the uid in embed markup, and URL path segments equal to the uid in
//! playback URLs. A uid that shows up anywhere else (the embed script URL, a
//! query parameter, part of a longer segment) is left alone.

use crate::error::{Error, Result};
use crate::video::PlaybackUrls;
use reqwest::Url;

/// Attribute appended to the player element to show playback controls.
pub const CONTROLS_ATTRIBUTE: &str = "controls";

/// Rewrites every `src="<uid>"` attribute in `markup` to `src="<src>"`,
/// appending the controls attribute when `add_controls` is set.
///
/// `src` may be the uid itself, which is how controls are added to an
/// unsigned embed. Returns `None` if the markup has no such attribute.
pub fn rewrite_embed(markup: &str, uid: &str, src: &str, add_controls: bool) -> Option<String> {
    let needle = format!("src=\"{uid}\"");
    let mut replacement = format!("src=\"{src}\"");
    if add_controls {
        replacement.push(' ');
        replacement.push_str(CONTROLS_ATTRIBUTE);
    }

    let mut out = String::with_capacity(markup.len() + replacement.len());
    let mut rest = markup;
    let mut slots = 0;
    while let Some(at) = rest.find(&needle) {
        // An attribute, not the tail of e.g. `data-src="..."`.
        let preceded_by_boundary = rest[..at]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_ascii_whitespace());
        out.push_str(&rest[..at]);
        if preceded_by_boundary {
            out.push_str(&replacement);
            slots += 1;
        } else {
            out.push_str(&needle);
        }
        rest = &rest[at + needle.len()..];
    }
    out.push_str(rest);

    tracing::trace!(uid, slots, "rewrote embed src slots");
    (slots > 0).then_some(out)
}

/// Replaces the uid path segments of `url` with `token`.
///
/// Everything else is kept byte for byte as the API sent it: scheme and host
/// case, explicit ports, dot segments, and percent-encoding are not normalized.
pub fn rewrite_playback_url(url: &str, uid: &str, token: &str) -> Result<String> {
    let parsed =
        Url::parse(url).map_err(|e| Error::malformed(&format!("playback URL {url:?}"), e))?;
    if parsed.cannot_be_a_base() {
        return Err(Error::MalformedResponse(format!(
            "playback URL {url:?} has no path"
        )));
    }

    let (start, end) = path_span(url);
    let path = url[start..end]
        .split('/')
        .map(|segment| if segment == uid { token } else { segment })
        .collect::<Vec<_>>()
        .join("/");
    Ok(format!("{}{path}{}", &url[..start], &url[end..]))
}

/// Byte range of the path of a hierarchical URL, as written.
fn path_span(url: &str) -> (usize, usize) {
    let after_scheme = url.find(':').map_or(0, |i| i + 1);
    let start = match url[after_scheme..].strip_prefix("//") {
        Some(authority) => {
            after_scheme + 2 + authority.find(['/', '?', '#']).unwrap_or(authority.len())
        }
        None => after_scheme,
    };
    let end = url[start..].find(['?', '#']).map_or(url.len(), |i| start + i);
    (start, end)
}

/// Applies [`rewrite_playback_url`] to every entry, reusing the same token.
pub fn rewrite_playback(playback: &PlaybackUrls, uid: &str, token: &str) -> Result<PlaybackUrls> {
    playback
        .iter()
        .map(|(format, url)| Ok((format.clone(), rewrite_playback_url(url, uid, token)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const UID: &str = "ea95132c15732412d22c1476fa83f27a";

    fn embed_markup() -> String {
        format!(
            r#"<stream src="{UID}"></stream><script data-cfasync="false" defer type="text/javascript" src="https://embed.videodelivery.net/embed/r4xu.fla9.latest.js?video={UID}"></script>"#
        )
    }

    #[test]
    fn embed_src_slot_is_replaced() {
        let out = rewrite_embed(&embed_markup(), UID, "TOKEN", false).unwrap();
        assert!(out.starts_with(r#"<stream src="TOKEN"></stream>"#), "{out}");
        // The script URL keeps the bare uid.
        assert!(out.contains(&format!("latest.js?video={UID}")), "{out}");
    }

    #[test]
    fn controls_can_be_added_without_changing_src() {
        let out = rewrite_embed(&embed_markup(), UID, UID, true).unwrap();
        assert!(
            out.starts_with(&format!(r#"<stream src="{UID}" controls></stream>"#)),
            "{out}"
        );
    }

    #[test]
    fn embed_ignores_other_attributes_ending_in_src() {
        let markup = format!(r#"<stream data-src="{UID}" src="{UID}"></stream>"#);
        let out = rewrite_embed(&markup, UID, "TOKEN", false).unwrap();
        assert_eq!(
            out,
            format!(r#"<stream data-src="{UID}" src="TOKEN"></stream>"#)
        );
    }

    #[test]
    fn embed_without_slot_reports_none() {
        let markup = "<stream src=\"other\"></stream>";
        assert_eq!(rewrite_embed(markup, UID, "TOKEN", true), None);
        let markup = format!(r#"<stream data-src="{UID}"></stream>"#);
        assert_eq!(rewrite_embed(&markup, UID, "TOKEN", false), None);
    }

    #[test]
    fn playback_rewrites_only_uid_segments() {
        let url = format!("https://videodelivery.net/{UID}/manifest/video.m3u8?clientBandwidthHint={UID}");
        let out = rewrite_playback_url(&url, UID, "a.b.c").unwrap();
        assert_eq!(
            out,
            format!("https://videodelivery.net/a.b.c/manifest/video.m3u8?clientBandwidthHint={UID}")
        );

        // A uid embedded in a longer segment is not a slot.
        let url = format!("https://videodelivery.net/x{UID}/manifest/video.mpd");
        assert_eq!(rewrite_playback_url(&url, UID, "a.b.c").unwrap(), url);
    }

    #[test]
    fn playback_url_is_not_normalized() {
        for (url, expected) in [
            (
                "HTTPS://VideoDelivery.NET:443/abc/manifest/video.m3u8",
                "HTTPS://VideoDelivery.NET:443/a.b.c/manifest/video.m3u8",
            ),
            (
                "https://v.net/abc/x/../video.m3u8",
                "https://v.net/a.b.c/x/../video.m3u8",
            ),
            (
                "https://v.net/abc/a b/video%2em3u8?x=1#abc",
                "https://v.net/a.b.c/a b/video%2em3u8?x=1#abc",
            ),
            (
                "https://user:pw@v.net/abc",
                "https://user:pw@v.net/a.b.c",
            ),
            ("https://v.net?abc", "https://v.net?abc"),
        ] {
            assert_eq!(rewrite_playback_url(url, "abc", "a.b.c").unwrap(), expected);
        }
    }

    #[test]
    fn playback_mapping_shares_one_token() {
        let playback = PlaybackUrls::from([
            (
                "hls".to_string(),
                format!("https://videodelivery.net/{UID}/manifest/video.m3u8"),
            ),
            (
                "dash".to_string(),
                format!("https://videodelivery.net/{UID}/manifest/video.mpd"),
            ),
        ]);
        let out = rewrite_playback(&playback, UID, "a.b.c").unwrap();
        assert_eq!(
            out["hls"],
            "https://videodelivery.net/a.b.c/manifest/video.m3u8"
        );
        assert_eq!(out["dash"], "https://videodelivery.net/a.b.c/manifest/video.mpd");
    }

    #[test]
    fn unparseable_playback_url_is_malformed() {
        assert!(matches!(
            rewrite_playback_url("not a url", UID, "t"),
            Err(Error::MalformedResponse(_))
        ));
        assert!(matches!(
            rewrite_playback_url("mailto:someone@example.com", UID, "t"),
            Err(Error::MalformedResponse(_))
        ));
    }
}
