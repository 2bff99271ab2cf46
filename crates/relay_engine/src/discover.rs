//! Candidate media URLs from an item's markup and enclosures.

use std::fmt::Write;

use relay_core::{RawItem, SourceProfile};
use scraper::{ElementRef, Html};
use url::Url;

/// The platform accepts at most four attachments per post.
pub const MAX_MEDIA: usize = 4;

const WORDPRESS_PLUGIN_PATH: &str = "/wp-content/plugins/";

/// Collect candidate media URLs for `item`, unique, in first-seen order.
///
/// Anchors and images in the summary and every content part come first,
/// then enclosures (and `enclosure` links) declared as image or video.
pub fn candidate_urls(item: &RawItem, profile: SourceProfile) -> Vec<String> {
    let base = Url::parse(item.link()).ok();
    let mut urls = Vec::new();

    if let Some(summary) = item.summary.as_deref() {
        collect_markup_urls(summary, base.as_ref(), &mut urls);
    }
    for part in &item.content {
        collect_markup_urls(part, base.as_ref(), &mut urls);
    }

    let declared = item
        .enclosures
        .iter()
        .map(|enclosure| (enclosure.href.as_str(), enclosure.media_type.as_deref()))
        .chain(
            item.links_with_rel("enclosure")
                .map(|link| (link.href.as_str(), link.media_type.as_deref())),
        );
    for (href, media_type) in declared {
        if !media_type.is_some_and(is_media_type) {
            continue;
        }
        if let Some(url) = resolve_url(href, base.as_ref()) {
            push_unique(&mut urls, url);
        }
    }

    match profile {
        SourceProfile::WordPress => urls
            .into_iter()
            .filter(|url| !url.contains(WORDPRESS_PLUGIN_PATH))
            .map(|url| escape_non_ascii(&url))
            .fold(Vec::new(), |mut unique, url| {
                push_unique(&mut unique, url);
                unique
            }),
        SourceProfile::Generic => urls,
    }
}

/// Whether a content type names an image or a video.
pub fn is_media_type(content_type: &str) -> bool {
    let ct = content_type.trim().to_ascii_lowercase();
    ct.starts_with("image/") || ct.starts_with("video/")
}

/// Percent-escape every non-ASCII character byte by byte (`ü` → `%C3%BC`).
///
/// Some WordPress installs emit raw UTF-8 file names in attachment URLs.
pub fn escape_non_ascii(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut buf = [0u8; 4];
    for ch in url.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            for byte in ch.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

fn collect_markup_urls(markup: &str, base: Option<&Url>, urls: &mut Vec<String>) {
    let fragment = Html::parse_fragment(markup);
    for node in fragment.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let reference = match element.value().name() {
            "a" => element.value().attr("href"),
            "img" => element.value().attr("src"),
            _ => None,
        };
        if let Some(url) = reference.and_then(|raw| resolve_url(raw, base)) {
            push_unique(urls, url);
        }
    }
}

/// Absolute http(s) URL for a reference, resolving relative ones against `base`.
///
/// Absolute references are returned as written.
fn resolve_url(reference: &str, base: Option<&Url>) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(url) => is_http(&url).then(|| trimmed.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => base
            .and_then(|base| base.join(trimmed).ok())
            .filter(is_http)
            .map(String::from),
        Err(_) => None,
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn push_unique(urls: &mut Vec<String>, url: String) {
    if !urls.contains(&url) {
        urls.push(url);
    }
}
