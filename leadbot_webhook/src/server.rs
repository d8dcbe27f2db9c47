use crate::Result;
use crate::handler::{handle_webhook, healthz};
use axum::{
    Router,
    routing::{get, post},
};
use leadbot_conversation::TurnHandler;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub turns: Arc<TurnHandler>,
}

/// HTTP front end for the messaging gateway's webhook.
pub struct WebhookServer {
    state: AppState,
}

impl WebhookServer {
    #[must_use]
    pub fn new(turns: TurnHandler) -> Self {
        Self {
            state: AppState {
                turns: Arc::new(turns),
            },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/webhook", post(handle_webhook))
            .route("/healthz", get(healthz))
            .with_state(self.state.clone())
    }

    /// Serve on `addr` until Ctrl+C.
    pub async fn run(self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("Webhook listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Webhook server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use leadbot_conversation::{InMemoryConversationStore, TurnConfig};
    use leadbot_core::{
        ConversationStore, LLMProvider, MessageGateway, OutboundMessage, ProviderError,
    };
    use leadbot_providers::RetryPolicy;
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    struct FixedProvider(std::result::Result<&'static str, u16>);

    #[async_trait]
    impl LLMProvider for FixedProvider {
        async fn generate(&self, _prompt: &str) -> std::result::Result<String, ProviderError> {
            self.0.map(str::to_string).map_err(|status| ProviderError::Status {
                status,
                message: "fixed".to_string(),
            })
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait]
    impl MessageGateway for RecordingGateway {
        async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    type Fixture = (Router, Arc<InMemoryConversationStore>, Arc<RecordingGateway>);

    fn fixture(reply: std::result::Result<&'static str, u16>) -> Fixture {
        let store = Arc::new(InMemoryConversationStore::new());
        let gateway = Arc::new(RecordingGateway::default());
        let turns = TurnHandler::new(
            store.clone(),
            Arc::new(FixedProvider(reply)),
            gateway.clone(),
            TurnConfig {
                retry: RetryPolicy::new(3, Duration::ZERO),
                ..TurnConfig::default()
            },
        );
        (WebhookServer::new(turns).router(), store, gateway)
    }

    fn form_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_len(response: axum::response::Response) -> usize {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().len()
    }

    #[tokio::test]
    async fn accepted_message_returns_empty_200() {
        let (router, store, gateway) = fixture(Ok("Olá! Qual é o seu nome? 😊"));

        let response = router
            .oneshot(form_request(
                "Body=Oi&From=whatsapp%3A%2B5511999990000&To=whatsapp%3A%2B14155238886&NumMedia=0",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_len(response).await, 0);

        let entry = store.get("whatsapp:+5511999990000").await.unwrap().unwrap();
        assert_eq!(entry.transcript.len(), 2);
        let sent = gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "whatsapp:+5511999990000");
        assert_eq!(sent[0].from, "whatsapp:+14155238886");
    }

    #[tokio::test]
    async fn failed_turn_returns_empty_500() {
        let (router, store, gateway) = fixture(Err(400));

        let response = router
            .oneshot(form_request("Body=Oi&From=A"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_len(response).await, 0);
        assert_eq!(store.get("A").await.unwrap().unwrap().transcript.len(), 1);
        assert!(gateway.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_fields_return_500() {
        let (router, store, _) = fixture(Ok("Olá!"));

        let response = router
            .oneshot(form_request("Body=Oi"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_len(response).await, 0);
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn closing_reply_evicts_conversation() {
        let (router, store, _) = fixture(Ok("Um especialista entrará em contato em breve!"));

        let response = router
            .oneshot(form_request("Body=Torres&From=A"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.get("A").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let (router, _, _) = fixture(Ok("x"));

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
