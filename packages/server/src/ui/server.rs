//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::usecase::GameService;

use super::{
    handler::{get_room_detail, get_rooms, health_check, post_intent},
    signal::shutdown_signal,
    state::AppState,
};

/// Game session server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(service);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    service: GameService,
}

impl Server {
    pub fn new(service: GameService) -> Self {
        Self { service }
    }

    /// Builds the router without binding, so it can be served by tests.
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            service: self.service.clone(),
        });

        Router::new()
            .route("/api/intents", post(post_intent))
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Game server listening on {}", listener.local_addr()?);
        tracing::info!("Post intents to: http://{}/api/intents", bind_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jinro_shared::time::FixedClock;

    use super::*;
    use crate::{
        domain::GameSettings,
        infrastructure::{notifier::LogNotifier, store::InMemoryGameStore},
    };

    async fn spawn_server() -> String {
        let service = GameService::new(
            GameSettings::default(),
            Arc::new(InMemoryGameStore::new()),
            Arc::new(LogNotifier),
            Arc::new(FixedClock::new(0)),
        );
        let app = Server::new(service).router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_intent_endpoint_over_http() {
        // テスト項目: HTTP 経由でインテントを送るとルームが作られ、一覧に現れる
        // given (前提条件):
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        // when (操作):
        let response = client
            .post(format!("{base}/api/intents"))
            .json(&serde_json::json!({
                "intent": "start_game",
                "context_id": "group",
                "actor_id": "gm"
            }))
            .send()
            .await
            .unwrap();
        let status = response.status();
        let outcome: serde_json::Value = response.json().await.unwrap();
        let rooms: serde_json::Value = client
            .get(format!("{base}/api/rooms"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(outcome["kind"], "room_opened");
        assert_eq!(rooms[0]["room_id"], outcome["room_id"]);
        assert_eq!(rooms[0]["gm_id"], "gm");
    }

    #[tokio::test]
    async fn test_rejected_intent_over_http_is_conflict() {
        // テスト項目: フェーズ違いの操作は 409 とエラー分類で返る
        // given (前提条件):
        let base = spawn_server().await;
        let client = reqwest::Client::new();
        let start = serde_json::json!({
            "intent": "start_game",
            "context_id": "group",
            "actor_id": "gm"
        });
        client
            .post(format!("{base}/api/intents"))
            .json(&start)
            .send()
            .await
            .unwrap();

        // when (操作):
        let response = client
            .post(format!("{base}/api/intents"))
            .json(&start)
            .send()
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "wrong_phase");
    }
}
