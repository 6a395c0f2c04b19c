//! Middleware for authentication and request logging

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use channeldesk_auth::AuthError;

use crate::state::GatewayState;

/// Resolve the session token to a user and store it in the request
/// extensions. Requests without a valid session continue anonymously; the
/// `CurrentUser` extractor decides whether that is acceptable.
pub async fn auth_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(request.headers(), state.session_cookie()) {
        match state.authenticator().authenticate_token(&token).await {
            Ok((user, _session)) => {
                request.extensions_mut().insert(user);
            }
            Err(AuthError::SessionNotFound | AuthError::SessionExpired | AuthError::UserNotFound) => {
                debug!("ignoring unknown or expired session token");
            }
            Err(error) => {
                warn!(%error, "session lookup failed");
            }
        }
    }

    next.run(request).await
}

/// Bearer token first, then the session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == cookie_name && !value.is_empty()).then(|| value.to_string())
        })
}

/// Logging middleware for request/response logging
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("channeldesk_session=xyz"));
        assert_eq!(session_token(&headers, "channeldesk_session").as_deref(), Some("abc"));
    }

    #[test]
    fn test_cookie_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; channeldesk_session=xyz; other=1"),
        );
        assert_eq!(session_token(&headers, "channeldesk_session").as_deref(), Some("xyz"));
        assert_eq!(session_token(&headers, "missing"), None);
    }

    #[test]
    fn test_malformed_authorization_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(session_token(&headers, "channeldesk_session"), None);
    }
}
