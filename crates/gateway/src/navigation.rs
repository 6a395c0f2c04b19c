//! Redirect targets and flash messages.
//!
//! Flash messages ride on the redirect target as `notice` / `alert` query
//! parameters, so nothing is kept between requests on the server.

use axum::http::{header, HeaderMap, Uri};
use url::form_urlencoded;

pub const FLASH_KEYS: [&str; 2] = ["notice", "alert"];

pub fn channel_path(channel_id: i64) -> String {
    format!("/channels/{}", channel_id)
}

pub fn user_path(user_id: i64) -> String {
    format!("/users/{}", user_id)
}

/// `path` with a single flash message attached, replacing any earlier one.
pub fn flash_url(path: &str, kind: &str, message: &str) -> String {
    let (base, query) = path.split_once('?').unwrap_or((path, ""));

    let mut pairs: Vec<String> = form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| !FLASH_KEYS.contains(&&**key))
        .map(|(key, value)| format!("{}={}", urlencoding::encode(&key), urlencoding::encode(&value)))
        .collect();
    pairs.push(format!("{}={}", kind, urlencoding::encode(message)));

    format!("{}?{}", base, pairs.join("&"))
}

/// Only same-origin absolute paths are followed.
pub fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

/// Where a "go back" action lands: `return_to`, then the referring page on
/// this host, then `fallback`.
pub fn back_target(return_to: Option<&str>, headers: &HeaderMap, fallback: &str) -> String {
    if let Some(target) = return_to.map(str::trim).filter(|t| is_local_path(t)) {
        return target.to_string();
    }

    referer_path(headers).unwrap_or_else(|| fallback.to_string())
}

fn referer_path(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    if is_local_path(referer) {
        return Some(referer.to_string());
    }

    let uri: Uri = referer.parse().ok()?;
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let authority = uri.authority()?;
    if !authority.as_str().eq_ignore_ascii_case(host) {
        return None;
    }

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .filter(|path| is_local_path(path))
}
