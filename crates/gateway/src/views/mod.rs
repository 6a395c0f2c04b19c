//! Server-rendered HTML views.
//!
//! Templates are compiled into the binary and rendered with tera; the
//! formatting helpers are registered as filters.

pub mod helpers;

use std::sync::Arc;

use axum::{http::Uri, response::Html};
use channeldesk_database::User;
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::GatewayResult;
use crate::format::query_param;

pub use helpers::{
    abbreviate_number, bootstrap_class_for, pagination_links, print_or_dashes, short_time, PageLink,
};

const TEMPLATES: [(&str, &str); 9] = [
    ("layout.html", include_str!("../../templates/layout.html")),
    ("macros.html", include_str!("../../templates/macros.html")),
    ("home.html", include_str!("../../templates/home.html")),
    ("channels/index.html", include_str!("../../templates/channels/index.html")),
    ("channels/show.html", include_str!("../../templates/channels/show.html")),
    ("channels/all.html", include_str!("../../templates/channels/all.html")),
    ("channels/form.html", include_str!("../../templates/channels/form.html")),
    (
        "channels/list_subscribers.html",
        include_str!("../../templates/channels/list_subscribers.html"),
    ),
    ("users/show.html", include_str!("../../templates/users/show.html")),
];

/// Compiled template set
#[derive(Clone)]
pub struct Views {
    tera: Arc<Tera>,
}

impl Views {
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.register_filter("print_or_dashes", helpers::print_or_dashes_filter);
        tera.register_filter("bootstrap_class_for", helpers::bootstrap_class_filter);
        tera.register_filter("abbreviate_number", helpers::abbreviate_number_filter);
        tera.register_filter("short_time", helpers::short_time_filter);
        tera.add_raw_templates(TEMPLATES)?;

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn render(&self, template: &str, context: &Context) -> GatewayResult<Html<String>> {
        Ok(Html(self.tera.render(template, context)?))
    }
}

/// A one-shot message carried on the query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub kind: &'static str,
    pub message: String,
}

pub fn flashes(uri: &Uri) -> Vec<Flash> {
    ["notice", "alert"]
        .into_iter()
        .filter_map(|kind| {
            query_param(uri, kind)
                .filter(|message| !message.trim().is_empty())
                .map(|message| Flash { kind, message })
        })
        .collect()
}

/// Context every page starts from: the signed-in user and the flash.
pub fn page_context(user: Option<&User>, uri: &Uri) -> Context {
    let mut context = Context::new();
    context.insert("current_user", &user);
    context.insert("flashes", &flashes(uri));
    context
}
