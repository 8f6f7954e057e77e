// In-process stand-in for the photo API, served by axum on an ephemeral port.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use image_feed::ImageFeedApp;
use image_feed::interface_adapters::{InMemoryTokenStore, ReqwestTransport};
use image_feed::use_cases::Endpoints;
use serde_json::{Value, json};

pub const GOOD_CODE: &str = "good-code";
pub const SERVER_TOKEN: &str = "tok-server";

// Pages overlap on purpose: "c" is served twice.
const PAGES: &[&[&str]] = &[&["a", "b", "c"], &["c", "d", "e"]];

#[derive(Default)]
pub struct MockState {
    liked: HashSet<String>,
    // Log of "METHOD path?query" lines, in arrival order.
    pub requests: Vec<String>,
}

pub type Shared = Arc<Mutex<MockState>>;

fn record(state: &Shared, line: String) {
    state.lock().expect("mock mutex poisoned").requests.push(line);
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {SERVER_TOKEN}");
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str())
}

fn photo(id: &str, liked: bool) -> Value {
    json!({
        "id": id,
        "created_at": "2024-03-01T12:00:00Z",
        "width": 1600,
        "height": 1200,
        "liked_by_user": liked,
        "description": null,
        "urls": {
            "thumb": format!("https://images.example/{id}/thumb"),
            "full": format!("https://images.example/{id}/full"),
        }
    })
}

async fn token(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    record(&state, "POST /oauth/token".to_string());
    let grant_ok = params.get("grant_type").map(String::as_str) == Some("authorization_code");
    let code_ok = params.get("code").map(String::as_str) == Some(GOOD_CODE);
    let client_ok = params.get("client_id").map(String::as_str) == Some("access-key")
        && params.get("client_secret").map(String::as_str) == Some("secret-key");
    if !(grant_ok && code_ok && client_ok) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "access_token": SERVER_TOKEN,
        "token_type": "bearer",
        "scope": "public read_user write_likes",
        "created_at": 1_700_000_000
    })))
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    record(&state, "GET /me".to_string());
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "username": "ansel",
        "first_name": "Ansel",
        "last_name": "Adams",
        "bio": "Landscapes"
    })))
}

async fn user(
    State(state): State<Shared>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    record(&state, format!("GET /users/{username}"));
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "profile_image": {
            "small": format!("https://images.example/{username}/small"),
            "medium": format!("https://images.example/{username}/medium"),
            "large": format!("https://images.example/{username}/large")
        }
    })))
}

async fn photos(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let page: usize = params
        .get("page")
        .and_then(|page| page.parse().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;
    record(&state, format!("GET /photos?page={page}"));
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let guard = state.lock().expect("mock mutex poisoned");
    let items: Vec<Value> = PAGES
        .get(page.saturating_sub(1))
        .copied()
        .unwrap_or_default()
        .iter()
        .map(|id| photo(id, guard.liked.contains(*id)))
        .collect();
    Ok(Json(Value::Array(items)))
}

async fn like(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    record(&state, format!("POST /photos/{id}/like"));
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    state.lock().expect("mock mutex poisoned").liked.insert(id.clone());
    Ok((StatusCode::CREATED, Json(json!({ "photo": photo(&id, true) }))))
}

async fn unlike(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    record(&state, format!("DELETE /photos/{id}/like"));
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    state.lock().expect("mock mutex poisoned").liked.remove(&id);
    Ok(Json(json!({ "photo": photo(&id, false) })))
}

pub struct MockApi {
    pub host: String,
    pub state: Shared,
}

impl MockApi {
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().expect("mock mutex poisoned").requests.clone()
    }
}

// Start the mock API on an ephemeral port for the current test runtime.
pub async fn start_mock_api() -> MockApi {
    let state: Shared = Arc::new(Mutex::new(MockState::default()));
    let app = Router::new()
        .route("/oauth/token", post(token))
        .route("/me", get(me))
        .route("/users/{username}", get(user))
        .route("/photos", get(photos))
        .route("/photos/{id}/like", post(like).delete(unlike))
        .with_state(state.clone());

    // Bind to an ephemeral port to avoid collisions with local services.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock api failed");
    });

    MockApi {
        host: addr.to_string(),
        state,
    }
}

pub fn endpoints(host: &str) -> Endpoints {
    Endpoints {
        access_key: "access-key".to_string(),
        secret_key: "secret-key".to_string(),
        redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
        scope: "public read_user write_likes".to_string(),
        scheme: "http".to_string(),
        auth_host: host.to_string(),
        api_host: host.to_string(),
    }
}

// App wired to the mock API through the real reqwest transport.
pub fn app_for(host: &str) -> ImageFeedApp {
    let transport = ReqwestTransport::new(Duration::from_secs(5)).expect("build http client");
    ImageFeedApp::new(
        endpoints(host),
        Arc::new(transport),
        Arc::new(InMemoryTokenStore::default()),
    )
}
