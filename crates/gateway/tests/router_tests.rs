use axum::{
    body::Body,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use channeldesk_auth::Authenticator;
use channeldesk_config::{AuthConfig, DatabaseConfig};
use channeldesk_database::{
    initialize_database, ChannelGroupRepository, CreateChannelGroupRequest, CreateMessageRequest,
    MessageKind, MessageRepository,
};
use channeldesk_gateway::{create_router, GatewayState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    pool: SqlitePool,
    authenticator: Authenticator,
    _db_dir: TempDir,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    text: String,
    json: Value,
}

impl TestResponse {
    fn location(&self) -> &str {
        self.headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }
}

impl TestApp {
    async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_dir.path().join("gateway.db").display()),
            max_connections: 4,
        };
        let pool = initialize_database(&config).await.expect("initialise database");

        let auth = AuthConfig::default();
        let authenticator = Authenticator::new(pool.clone(), auth.clone());
        let state = GatewayState::new(pool.clone(), authenticator.clone(), &auth)
            .expect("build gateway state");

        Self {
            router: create_router(state),
            pool,
            authenticator,
            _db_dir: db_dir,
        }
    }

    /// A user and a live session token for them.
    async fn sign_in(&self, email: &str) -> (i64, String) {
        let user = self
            .authenticator
            .ensure_user(email, None)
            .await
            .expect("create user");
        let session = self
            .authenticator
            .issue_session(user.id)
            .await
            .expect("issue session");
        (user.id, session.token)
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("dispatch request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap_or_default();
        let json = serde_json::from_str(&text).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            text,
            json,
        }
    }

    async fn json(&self, method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ACCEPT, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).expect("serialize body"))
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("build request")).await
    }

    async fn html(&self, method: Method, uri: &str, form: Option<&str>, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ACCEPT, "text/html");
        if let Some(token) = token {
            builder = builder.header(COOKIE, format!("channeldesk_session={}", token));
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("build request")).await
    }

    async fn create_channel(&self, token: &str, name: &str) -> i64 {
        let response = self
            .json(
                Method::POST,
                "/channels",
                Some(json!({"name": name, "type": "AnnouncementsChannel"})),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.json["id"].as_i64().expect("channel id")
    }
}

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new().await;
    let response = app.json(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["status"], "ok");
    assert!(response.json["timestamp"].is_string());
}

#[tokio::test]
async fn openapi_document_lists_channel_routes() {
    let app = TestApp::new().await;
    let response = app.json(Method::GET, "/api-docs/openapi.json", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let paths = response.json["paths"].as_object().expect("paths object");
    assert!(paths.contains_key("/channels"));
    assert!(paths.contains_key("/channels/{id}/export"));
    assert!(paths.contains_key("/channels/{id}/subscribers/{subscriber_id}"));

    let denied = &response.json["paths"]["/channels/{id}"]["get"]["responses"]["403"];
    assert_eq!(
        denied["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/ErrorBody"
    );
    assert!(response.json["components"]["schemas"]["ErrorBody"].is_object());
}

#[tokio::test]
async fn anonymous_json_requests_get_401() {
    let app = TestApp::new().await;
    let response = app.json(Method::GET, "/channels", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json["error"], "401");
}

#[tokio::test]
async fn anonymous_html_requests_redirect_home_with_alert() {
    let app = TestApp::new().await;
    let response = app.html(Method::GET, "/channels", None, None).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.location(),
        "/?alert=You%20need%20to%20sign%20in%20before%20continuing."
    );
}

#[tokio::test]
async fn unknown_tokens_are_treated_as_anonymous() {
    let app = TestApp::new().await;
    let response = app.json(Method::GET, "/channels", None, Some("not-a-session")).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn home_page_renders_flash_for_anonymous_visitors() {
    let app = TestApp::new().await;
    let response = app.html(Method::GET, "/?alert=Access%20Denied", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("Access Denied"));
    assert!(response.text.contains("alert-danger"));
}

#[tokio::test]
async fn json_create_returns_location_and_lists_only_own_channels() {
    let app = TestApp::new().await;
    let (_, owner) = app.sign_in("owner@example.com").await;
    let (_, other) = app.sign_in("other@example.com").await;

    let response = app
        .json(
            Method::POST,
            "/channels",
            Some(json!({"name": "Daily tips", "type": "AnnouncementsChannel"})),
            Some(&owner),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let id = response.json["id"].as_i64().unwrap();
    assert_eq!(response.location(), format!("/channels/{}", id));
    assert_eq!(response.json["type"], "AnnouncementsChannel");

    app.create_channel(&other, "Someone else").await;

    let listing = app.json(Method::GET, "/channels", None, Some(&owner)).await;
    assert_eq!(listing.status, StatusCode::OK);
    let names: Vec<&str> = listing
        .json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|channel| channel["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Daily tips"]);
}

#[tokio::test]
async fn json_validation_errors_are_keyed_by_field() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("owner@example.com").await;

    let response = app
        .json(
            Method::POST,
            "/channels",
            Some(json!({"name": "   ", "type": "AnnouncementsChannel"})),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.json["errors"]["name"].is_array());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM channels")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn html_create_redirects_with_notice() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("owner@example.com").await;

    let response = app
        .html(
            Method::POST,
            "/channels",
            Some("name=Morning+news&type=AnnouncementsChannel"),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(response.location().starts_with("/channels/"));
    assert!(response
        .location()
        .ends_with("?notice=Channel%20was%20successfully%20created."));
}

#[tokio::test]
async fn html_create_with_errors_renders_the_form() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("owner@example.com").await;

    let response = app
        .html(
            Method::POST,
            "/channels",
            Some("name=&type=AnnouncementsChannel&description=kept"),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text.contains("error_explanation"));
    assert!(response.text.contains("kept"));
}

#[tokio::test]
async fn foreign_channels_are_denied_without_leaking_data() {
    let app = TestApp::new().await;
    let (_, owner) = app.sign_in("owner@example.com").await;
    let (_, intruder) = app.sign_in("intruder@example.com").await;
    let id = app.create_channel(&owner, "Private plans").await;

    for path in [
        format!("/channels/{}", id),
        format!("/channels/{}/edit", id),
        format!("/channels/{}/all", id),
        format!("/channels/{}/list_subscribers", id),
        format!("/channels/{}/export", id),
    ] {
        let response = app.json(Method::GET, &path, None, Some(&intruder)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{}", path);
        assert!(!response.text.contains("Private plans"));

        let response = app.html(Method::GET, &path, None, Some(&intruder)).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(response.location(), "/?alert=Access%20Denied");
    }

    let missing = app.json(Method::GET, "/channels/9999", None, Some(&owner)).await;
    assert_eq!(missing.status, StatusCode::FORBIDDEN);

    let malformed = app.json(Method::GET, "/channels/abc", None, Some(&owner)).await;
    assert_eq!(malformed.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn new_channel_rejects_foreign_groups() {
    let app = TestApp::new().await;
    let (owner_id, owner) = app.sign_in("owner@example.com").await;
    let (_, intruder) = app.sign_in("intruder@example.com").await;

    let group = ChannelGroupRepository::new(app.pool.clone())
        .create(&CreateChannelGroupRequest::new(owner_id, "Campaigns"))
        .await
        .unwrap();
    let path = format!("/channels/new?channel_group_id={}", group.id);

    let own = app.json(Method::GET, &path, None, Some(&owner)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.json["channel_group_id"], group.id.to_string());

    let foreign = app.json(Method::GET, &path, None, Some(&intruder)).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn show_page_renders_messages_and_type_tabs() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("owner@example.com").await;
    let id = app.create_channel(&token, "Tips").await;

    let messages = MessageRepository::new(app.pool.clone());
    let simple = messages
        .create(&CreateMessageRequest::new(id, MessageKind::SimpleMessage, "drink water"))
        .await
        .unwrap();
    let poll = messages
        .create(&CreateMessageRequest::new(id, MessageKind::PollMessage, "favourite colour?"))
        .await
        .unwrap();

    let response = app
        .html(Method::GET, &format!("/channels/{}", id), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("messages_table"));
    assert!(response.text.contains(&format!("message_{}", simple.id)));
    assert!(response.text.contains(&format!("message_{}", poll.id)));

    let filtered = app
        .html(
            Method::GET,
            &format!("/channels/{}?message_type=PollMessage", id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(filtered.status, StatusCode::OK);
    assert!(filtered.text.contains(&format!("message_{}", poll.id)));
    assert!(!filtered.text.contains(&format!("id=\"message_{}\"", simple.id)));
}

#[tokio::test]
async fn update_keeps_absent_fields_and_destroy_returns_to_profile() {
    let app = TestApp::new().await;
    let (user_id, token) = app.sign_in("owner@example.com").await;
    let id = app.create_channel(&token, "Before").await;
    let path = format!("/channels/{}", id);

    let updated = app
        .json(Method::PATCH, &path, Some(json!({"description": "now described"})), Some(&token))
        .await;
    assert_eq!(updated.status, StatusCode::NO_CONTENT);

    let shown = app.json(Method::GET, &path, None, Some(&token)).await;
    assert_eq!(shown.json["name"], "Before");
    assert_eq!(shown.json["description"], "now described");

    let destroyed = app
        .html(Method::POST, &format!("{}?_method=delete", path), None, Some(&token))
        .await;
    assert_eq!(destroyed.status, StatusCode::SEE_OTHER);
    assert!(destroyed.location().starts_with(&format!("/users/{}", user_id)));

    let gone = app.json(Method::GET, &path, None, Some(&token)).await;
    assert_eq!(gone.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn users_see_only_their_own_profile() {
    let app = TestApp::new().await;
    let (user_id, token) = app.sign_in("owner@example.com").await;
    let (other_id, _) = app.sign_in("other@example.com").await;

    let own = app
        .json(Method::GET, &format!("/users/{}", user_id), None, Some(&token))
        .await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.json["email"], "owner@example.com");

    let other = app
        .json(Method::GET, &format!("/users/{}", other_id), None, Some(&token))
        .await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);
}
