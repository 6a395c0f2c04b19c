//! Response format negotiation

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, Uri},
};
use url::form_urlencoded;

/// The representation a client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Html,
    Json,
    Csv,
}

impl Format {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "html" => Some(Format::Html),
            "json" => Some(Format::Json),
            "csv" => Some(Format::Csv),
            _ => None,
        }
    }

    /// `?format=` wins over `Accept`; anything unrecognised is HTML.
    pub fn detect(uri: &Uri, headers: &HeaderMap) -> Self {
        if let Some(format) = query_param(uri, "format").and_then(|value| Self::from_name(&value)) {
            return format;
        }

        let accept = headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        accept
            .split(',')
            .map(|item| item.split(';').next().unwrap_or_default().trim())
            .find_map(|media| match media {
                "text/html" | "application/xhtml+xml" => Some(Format::Html),
                "application/json" => Some(Format::Json),
                "text/csv" => Some(Format::Csv),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::detect(&parts.uri, &parts.headers)
    }

    pub fn is_html(&self) -> bool {
        matches!(self, Format::Html)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Format
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// First value of a query parameter, percent-decoded.
pub fn query_param(uri: &Uri, name: &str) -> Option<String> {
    form_urlencoded::parse(uri.query()?.as_bytes())
        .find_map(|(key, value)| (key == name).then(|| value.into_owned()))
}

/// Every query parameter except the named ones, in request order.
pub fn query_pairs_except(uri: &Uri, skip: &[&str]) -> Vec<(String, String)> {
    let Some(query) = uri.query() else {
        return Vec::new();
    };

    form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| !skip.contains(&&**key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
