use super::CommandStrategy;
use leadbot_config::Config;
use leadbot_conversation::{
    InMemoryConversationStore, MarkerPhrase, PromptBuilder, TurnConfig, TurnHandler,
};
use leadbot_core::TranscriptLabels;
use leadbot_providers::{GeminiProvider, RetryPolicy};
use leadbot_webhook::{TwilioGateway, WebhookServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Input for the serve command.
#[derive(Debug, Clone, Default)]
pub struct ServeInput {
    /// Bind address override
    pub host: Option<String>,
    /// Port override
    pub port: Option<u16>,
}

/// Strategy for running the webhook server.
///
/// Loads configuration, wires the Gemini provider, the Twilio gateway and the
/// in-memory conversation store into a `TurnHandler`, then serves until Ctrl+C.
#[derive(Debug, Clone, Copy)]
pub struct ServeStrategy;

impl CommandStrategy for ServeStrategy {
    type Input = ServeInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        config.validate()?;

        let turns = build_turn_handler(&config);

        let host = input.host.unwrap_or_else(|| config.server.host.clone());
        let port = input.port.unwrap_or(config.server.port);
        let addr = format!("{host}:{port}");

        info!(
            "Starting leadbot with model {} as {}",
            config.providers.gemini.model, config.conversation.persona_name
        );
        WebhookServer::new(turns).run(&addr).await?;

        Ok(())
    }
}

fn build_turn_handler(config: &Config) -> TurnHandler {
    let gemini = &config.providers.gemini;
    let mut provider = GeminiProvider::new(gemini.api_key.clone(), gemini.model.clone());
    if let Some(base_url) = &gemini.base_url {
        provider = provider.with_base_url(base_url.clone());
    }

    let twilio = &config.twilio;
    let mut gateway = TwilioGateway::new(twilio.account_sid.clone(), twilio.auth_token.clone());
    if let Some(base_url) = &twilio.base_url {
        gateway = gateway.with_base_url(base_url.clone());
    }

    let settings = &config.conversation;
    let turn_config = TurnConfig {
        sender_address: twilio.from.clone(),
        labels: TranscriptLabels {
            customer: settings.customer_label.clone(),
            assistant: settings.persona_name.clone(),
        },
        retry: RetryPolicy::new(
            settings.max_attempts,
            Duration::from_millis(settings.initial_backoff_ms),
        ),
    };

    TurnHandler::new(
        Arc::new(InMemoryConversationStore::new()),
        Arc::new(provider),
        Arc::new(gateway),
        turn_config,
    )
    .with_prompts(PromptBuilder::new(
        settings.persona_name.clone(),
        settings.developments.clone(),
    ))
    .with_closing_detector(Arc::new(MarkerPhrase::new(&settings.closing_marker)))
}
