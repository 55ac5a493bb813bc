use std::net::SocketAddr;

use anyhow::Context as _;
use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use repository::Repository;
use toml::{map::Map, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod event;
pub mod healthz;
pub mod not_found;
mod response;
pub mod webhook;

pub use response::{ApiError, ApiResponse};

const DEFAULT_ADDR: &str = "127.0.0.1:10000";

#[derive(Clone, Debug)]
pub struct Config {
    pub enabled: bool,
    pub addr: SocketAddr,
}

pub fn init_config(config: &Map<String, Value>) -> anyhow::Result<Config> {
    let enabled = util::get_bool(config, "server", "enabled")?.unwrap_or(true);

    let addr = util::get_str(config, "server", "addr")?
        .unwrap_or(DEFAULT_ADDR)
        .parse::<SocketAddr>()
        .context("failed to parse server.addr config")?;

    Ok(Config { enabled, addr })
}

pub fn serve(repository: Repository) -> Router {
    info!(task = "start api serving");

    // the feed page may be hosted elsewhere and only reads
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/events", get(event::get_events))
        .route("/webhook", post(webhook::post_webhook))
        .route("/healthz", get(healthz::get_health))
        .fallback(not_found::get_404)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(repository)
}

#[cfg(test)]
mod test {
    use repository::{init_repository, Repository};
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::{init_config, serve};

    async fn spawn_app() -> (String, Repository) {
        let repository = init_repository();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = serve(repository.clone());
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        (format!("http://{}", addr), repository)
    }

    async fn deliver(
        base_url: &str,
        event_type: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let response = reqwest::Client::new()
            .post(format!("{}/webhook", base_url))
            .header("X-GitHub-Event", event_type)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json::<Value>().await.unwrap())
    }

    #[tokio::test]
    async fn test_push_delivery_is_served_on_events() {
        // Arrange
        let (base_url, repository) = spawn_app().await;
        let body = json!({
            "ref": "refs/heads/main",
            "pusher": { "name": "alice", "email": "alice@example.com" },
            "head_commit": {
                "id": "9f3b2c1d",
                "timestamp": "2023-11-15T07:13:20+09:00"
            }
        });

        // Act
        let (status, message) = deliver(&base_url, "push", body).await;
        let events = reqwest::get(format!("{}/events", base_url))
            .await
            .unwrap()
            .json::<Value>()
            .await
            .unwrap();

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message, json!({ "message": "Event processed" }));
        assert_eq!(repository.event.count().await, 1);
        assert_eq!(
            events,
            json!([{
                "request_id": "9f3b2c1d",
                "author": "alice",
                "action": "PUSH",
                "from_branch": null,
                "to_branch": "main",
                "timestamp": "2023-11-15T07:13:20+09:00"
            }])
        );
    }

    #[tokio::test]
    async fn test_ping() {
        // Arrange
        let (base_url, repository) = spawn_app().await;

        // Act
        let (status, message) =
            deliver(&base_url, "ping", json!({ "zen": "Keep it simple." })).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message, json!({ "message": "Ping received" }));
        assert_eq!(repository.event.count().await, 0);
    }

    #[tokio::test]
    async fn test_unsupported_event_type() {
        // Arrange
        let (base_url, _) = spawn_app().await;

        // Act
        let (status, message) = deliver(&base_url, "issues", json!({})).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, json!({ "error": "Invalid event type" }));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        // Arrange
        let (base_url, repository) = spawn_app().await;

        // Act
        let (status, message) =
            deliver(&base_url, "push", json!({ "ref": "refs/heads/main" })).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message["error"].as_str().unwrap().contains("pusher"));
        assert_eq!(repository.event.count().await, 0);
    }

    #[tokio::test]
    async fn test_ignored_pull_request_action() {
        // Arrange
        let (base_url, repository) = spawn_app().await;
        let body = json!({
            "action": "labeled",
            "pull_request": {
                "id": 1,
                "user": { "login": "bob" },
                "head": { "ref": "feature" },
                "base": { "ref": "main" },
                "created_at": "2023-11-14T22:13:20Z",
                "merged_at": null,
                "merged": false
            }
        });

        // Act
        let (status, message) = deliver(&base_url, "pull_request", body).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message, json!({ "message": "Event ignored" }));
        assert_eq!(repository.event.count().await, 0);
    }

    #[tokio::test]
    async fn test_healthz_and_not_found() {
        // Arrange
        let (base_url, _) = spawn_app().await;

        // Act
        let health = reqwest::get(format!("{}/healthz", base_url)).await.unwrap();
        let missing = reqwest::get(format!("{}/nope", base_url)).await.unwrap();

        // Assert
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_init_config() {
        // Arrange
        let config = toml::from_str::<toml::map::Map<String, toml::Value>>(
            "[server]\naddr = \"0.0.0.0:8080\"\n",
        )
        .unwrap();

        // Act
        let config = init_config(&config).unwrap();
        let defaults = init_config(&toml::map::Map::new()).unwrap();

        // Assert
        assert!(config.enabled);
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(defaults.addr.to_string(), "127.0.0.1:10000");
    }
}
