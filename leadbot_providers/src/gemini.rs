use async_trait::async_trait;
use leadbot_core::{LLMProvider, ProviderError};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini `generateContent` client.
///
/// Makes exactly one HTTP call per `generate`; retrying is left to the
/// caller so the overload status stays visible.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        info!("Creating GeminiProvider: model={model}");
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Concatenate the text parts of the first candidate.
    fn candidate_text(response: &serde_json::Value) -> Result<String, ProviderError> {
        let parts = response["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| {
                let reason = response["promptFeedback"]["blockReason"]
                    .as_str()
                    .unwrap_or("missing candidate content");
                ProviderError::InvalidResponse(reason.to_string())
            })?;

        let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();

        if text.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "candidate has no text".to_string(),
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!(
            "Sending request to Gemini API: model={}, prompt_len={}",
            self.model,
            prompt.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let text = Self::candidate_text(&body)?;
        debug!("Received response from Gemini API: {} chars", text.len());
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
    };

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn sends_prompt_and_reads_candidate_text() {
        let router = Router::new().route(
            "/v1beta/models/{call}",
            post(
                |Path(call): Path<String>, headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(call, "gemini-test:generateContent");
                    assert_eq!(headers["x-goog-api-key"], "secret");
                    assert_eq!(body["contents"][0]["parts"][0]["text"], "Diga oi");
                    Json(json!({
                        "candidates": [{
                            "content": { "parts": [{ "text": "Olá! " }, { "text": "Qual é o seu nome? 😊" }] }
                        }]
                    }))
                },
            ),
        );
        let base = spawn(router).await;

        let provider = GeminiProvider::new("secret".to_string(), "gemini-test".to_string())
            .with_base_url(base);
        let text = provider.generate("Diga oi").await.unwrap();

        assert_eq!(text, "Olá! Qual é o seu nome? 😊");
    }

    #[tokio::test]
    async fn overload_status_is_preserved() {
        let router = Router::new().route(
            "/v1beta/models/{call}",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "The model is overloaded.") }),
        );
        let base = spawn(router).await;

        let provider =
            GeminiProvider::new("k".to_string(), "m".to_string()).with_base_url(base);
        let err = provider.generate("x").await.unwrap_err();

        assert!(err.is_overloaded());
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn blocked_prompt_is_invalid_response() {
        let router = Router::new().route(
            "/v1beta/models/{call}",
            post(|| async { Json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })) }),
        );
        let base = spawn(router).await;

        let provider =
            GeminiProvider::new("k".to_string(), "m".to_string()).with_base_url(base);
        let err = provider.generate("x").await.unwrap_err();

        assert!(matches!(err, ProviderError::InvalidResponse(ref r) if r == "SAFETY"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn endpoint_includes_model() {
        let provider = GeminiProvider::new("k".to_string(), "gemini-1.5-flash".to_string())
            .with_base_url("http://localhost:9/".to_string());
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
