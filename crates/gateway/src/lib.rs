//! # Channeldesk Gateway Crate
//!
//! The HTTP layer of Channeldesk: it authenticates requests, guards channel
//! ownership, negotiates the response format and renders HTML, JSON or CSV
//! from the channel services.
//!
//! ## Architecture
//!
//! - **REST**: route handlers for channels, memberships and user profiles
//! - **Guard**: extractors that authenticate and check ownership before a handler runs
//! - **Views**: tera templates and formatting helpers
//! - **Middleware**: session resolution and request logging
//!
//! ## Usage
//!
//! ```rust,no_run
//! use channeldesk_gateway::{create_router, GatewayState};
//! # async fn run(pool: sqlx::SqlitePool, authenticator: channeldesk_auth::Authenticator) -> anyhow::Result<()> {
//! let state = GatewayState::new(pool, authenticator, &channeldesk_config::AuthConfig::default())?;
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:7070").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod format;
pub mod guard;
pub mod middleware;
pub mod navigation;
pub mod rest;
pub mod state;
pub mod views;

// Re-export main types for convenience
pub use error::{GatewayError, GatewayResult};
pub use format::Format;
pub use middleware::auth_middleware;
pub use state::GatewayState;

use axum::{http::Method, middleware as axum_middleware, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        rest::health::health_check,
        rest::users::show_user,
        rest::channels::index,
        rest::channels::show,
        rest::channels::create,
        rest::channels::update,
        rest::channels::destroy,
        rest::channels::messages_report,
        rest::channels::export,
        rest::subscribers::list_subscribers,
        rest::subscribers::add_subscriber,
        rest::subscribers::remove_subscriber,
    ),
    components(schemas(rest::health::HealthResponse, error::ErrorBody)),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Users", description = "User profiles"),
        (name = "Channels", description = "Channel administration"),
        (name = "Subscribers", description = "Channel membership"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .merge(rest::create_rest_routes())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers(Any),
        )
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
