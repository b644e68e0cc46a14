//! JSON control surface over the engine handle.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use engine_logging::engine_error;
use feedpost_engine::{EngineError, EngineHandle, StartOutcome, StartRequest, UserConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type AppState = Arc<EngineHandle>;

pub fn router(engine: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/metrics", get(metrics))
        .route("/logs", get(logs))
        .route("/config", get(config))
        .route("/save", post(save))
        .route("/start", post(start))
        .route("/stop", post(stop))
        .with_state(engine)
}

/// Body of `/save` and `/start`; omitted fields are blank.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigForm {
    username: String,
    password: String,
    rss_url: String,
    session_cookie: String,
}

impl From<ConfigForm> for StartRequest {
    fn from(form: ConfigForm) -> Self {
        StartRequest {
            username: form.username,
            password: form.password,
            rss_url: form.rss_url,
            session_cookie: form.session_cookie,
        }
    }
}

#[derive(Debug, Serialize)]
struct ConfigView {
    rss_url: String,
    username: String,
    password_set: bool,
    session_cookie_set: bool,
}

impl From<UserConfig> for ConfigView {
    fn from(config: UserConfig) -> Self {
        ConfigView {
            rss_url: config.rss_url,
            username: config.username,
            password_set: !config.password.is_empty(),
            session_cookie_set: !config.session_cookie.trim().is_empty(),
        }
    }
}

struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        engine_error!("Control request failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

async fn status(State(engine): State<AppState>) -> impl IntoResponse {
    Json(json!({ "running": engine.is_running() }))
}

async fn metrics(State(engine): State<AppState>) -> impl IntoResponse {
    Json(engine.metrics())
}

async fn logs(State(engine): State<AppState>) -> impl IntoResponse {
    Json(json!({ "lines": engine.recent_logs() }))
}

async fn config(State(engine): State<AppState>) -> Result<Json<ConfigView>, ApiError> {
    Ok(Json(engine.config()?.into()))
}

async fn save(
    State(engine): State<AppState>,
    Json(form): Json<ConfigForm>,
) -> Result<Json<ConfigView>, ApiError> {
    Ok(Json(engine.save_config(form.into())?.into()))
}

async fn start(
    State(engine): State<AppState>,
    Json(form): Json<ConfigForm>,
) -> Result<Response, ApiError> {
    let response = match engine.start(form.into())? {
        StartOutcome::Started => Json(json!({ "started": true, "running": true })).into_response(),
        StartOutcome::AlreadyRunning => {
            Json(json!({ "started": false, "running": true })).into_response()
        }
        StartOutcome::MissingCredentials => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "username and password are required" })),
        )
            .into_response(),
    };
    Ok(response)
}

async fn stop(State(engine): State<AppState>) -> impl IntoResponse {
    engine.stop();
    Json(json!({ "stopping": true }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use engine_logging::LogBuffer;
    use feedpost_core::{CaptionSettings, SharedRunState};
    use feedpost_engine::{
        BridgeSettings, EngineConfig, EngineHandle, ExtractSettings, HttpPlatformClient, LoopDeps,
        StateStore, StorePaths, WebContentSource,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::router;

    fn app(dir: &TempDir) -> axum::Router {
        let config = EngineConfig {
            default_feed_url: "https://news.example/feed".to_string(),
            check_interval: Duration::from_secs(60),
            media_dir: dir.path().join("images"),
            caption: CaptionSettings::default(),
        };
        let platform =
            HttpPlatformClient::new("http://127.0.0.1:9", BridgeSettings::default()).unwrap();
        let deps = LoopDeps {
            source: Arc::new(WebContentSource::new(ExtractSettings::default())),
            platform: Arc::new(platform),
            store: StateStore::new(StorePaths::in_dir(dir.path())),
            run_state: SharedRunState::new(),
        };
        let buffer = LogBuffer::new();
        buffer.push("[2024-01-01 00:00:00] INFO  ready");
        router(Arc::new(EngineHandle::new(config, deps, buffer)))
    }

    async fn call(
        app: &axum::Router,
        method: Method,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn status_reports_idle_engine() {
        let dir = TempDir::new().unwrap();
        let (status, body) = call(&app(&dir), Method::GET, "/status", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "running": false }));
    }

    #[tokio::test]
    async fn logs_and_metrics_are_served() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let (_, logs) = call(&app, Method::GET, "/logs", Value::Null).await;
        assert_eq!(logs, json!({ "lines": ["[2024-01-01 00:00:00] INFO  ready"] }));

        let (_, metrics) = call(&app, Method::GET, "/metrics", Value::Null).await;
        assert_eq!(metrics["running"], json!(false));
        assert_eq!(metrics["phase"], json!("STOPPED"));
        assert_eq!(metrics["posts_count"], json!(0));
    }

    #[tokio::test]
    async fn saved_config_is_returned_without_password() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let (status, _) = call(
            &app,
            Method::POST,
            "/save",
            json!({ "username": "editor", "password": "hunter2" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, config) = call(&app, Method::GET, "/config", Value::Null).await;
        assert_eq!(
            config,
            json!({
                "rss_url": "https://news.example/feed",
                "username": "editor",
                "password_set": true,
                "session_cookie_set": false,
            })
        );
        assert!(!config.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn start_without_credentials_is_rejected() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let (status, body) = call(&app, Method::POST, "/start", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("required"));

        let (_, stopped) = call(&app, Method::POST, "/stop", Value::Null).await;
        assert_eq!(stopped, json!({ "stopping": true }));
    }
}
