//! HTTP surface of the relay.
//!
//! Delivery of the produced messages is not handled here; the webhook
//! endpoint simply returns the response value as JSON and an external
//! system posts it to the chat platform.
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower::limit::ConcurrencyLimitLayer;

use crate::relay::{handle_webhook, RelayContext, WebhookResponse};

/// Shared server state for all axum handlers.
pub struct ServerState {
    ctx: RelayContext,
}

impl ServerState {
    pub fn new(ctx: RelayContext) -> Self {
        Self { ctx }
    }
}

pub type ServerStateRef = Arc<ServerState>;

pub fn create_app(state: ServerState) -> Router {
    Router::new()
        .route("/bitbucket", post(bitbucket_webhook_handler))
        .route("/health", get(health_handler))
        .layer(ConcurrencyLimitLayer::new(100))
        .with_state(Arc::new(state))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "")
}

/// Axum handler that receives a webhook delivery and returns the relay's
/// response. Ignored events and formatting failures are part of the response
/// body; the HTTP status is 200 either way.
async fn bitbucket_webhook_handler(
    State(state): State<ServerStateRef>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<WebhookResponse> {
    Json(handle_webhook(&state.ctx, &headers, &body))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::RelayConfig;
    use crate::tests::load_test_file;

    fn app() -> Router {
        create_app(ServerState::new(RelayContext::new(RelayConfig::default())))
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn webhook_endpoint_returns_message_content() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/bitbucket")
            .header("content-type", "application/json")
            .header("x-event-key", "pullrequest:created")
            .body(Body::from(load_test_file("webhook/pullrequest-created.json")))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["content"]["parseUrls"], false);
        assert_eq!(json["content"]["color"], "#225159");
        assert_eq!(json["content"]["attachments"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn webhook_endpoint_reports_ignored_events_with_status_ok() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/bitbucket")
            .body(Body::from("{}"))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["error"]["success"], false);
    }

    #[tokio::test]
    async fn health_endpoint() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
