//! Turn handler for inbound customer messages.
//!
//! One call to [`TurnHandler::handle_message`] is one turn: the customer line
//! is recorded, a reply is generated and dispatched, the assistant line is
//! recorded and, when the reply closes the conversation, the entry is evicted
//! and the lead extracted from it.

use leadbot_core::{
    ConversationStore, LLMProvider, MessageGateway, OutboundMessage, ProviderError, Role,
    TranscriptLabels,
};
use leadbot_providers::{RetryError, RetryPolicy, generate_with_retry};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::closing::{ClosingDetector, MarkerPhrase};
use crate::extraction::{ExtractedLead, LeadExtractor};
use crate::prompt::PromptBuilder;
use crate::sink::{LeadSink, LogLeadSink};

/// Static settings for turn handling.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Gateway address replies are sent from
    pub sender_address: String,
    pub labels: TranscriptLabels,
    pub retry: RetryPolicy,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            sender_address: "whatsapp:+14155238886".to_string(),
            labels: TranscriptLabels::default(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("reply generation failed: {0}")]
    Generation(#[from] RetryError<ProviderError>),

    #[error("failed to dispatch reply: {0}")]
    Dispatch(anyhow::Error),

    #[error("conversation store error: {0}")]
    Store(anyhow::Error),
}

/// Result of a successful turn.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Replied { reply: String },
    /// The reply closed the conversation; the entry has been evicted
    Closed { reply: String, lead: ExtractedLead },
}

impl TurnOutcome {
    #[must_use]
    pub fn reply(&self) -> &str {
        match self {
            Self::Replied { reply } | Self::Closed { reply, .. } => reply,
        }
    }
}

/// Per-sender conversation state. A closed conversation reads as `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    New,
    AwaitingReply,
    Active,
}

pub struct TurnHandler {
    store: Arc<dyn ConversationStore>,
    provider: Arc<dyn LLMProvider>,
    gateway: Arc<dyn MessageGateway>,
    prompts: PromptBuilder,
    closing: Arc<dyn ClosingDetector>,
    extractor: LeadExtractor,
    sink: Arc<dyn LeadSink>,
    config: TurnConfig,
}

impl TurnHandler {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn LLMProvider>,
        gateway: Arc<dyn MessageGateway>,
        config: TurnConfig,
    ) -> Self {
        info!(
            "Creating turn handler: model={}, max_attempts={}",
            provider.model(),
            config.retry.max_attempts
        );
        let prompts = PromptBuilder::default();
        let extractor = LeadExtractor::new(Arc::clone(&provider), prompts.clone(), config.retry);

        Self {
            store,
            provider,
            gateway,
            prompts,
            closing: Arc::new(MarkerPhrase::default()),
            extractor,
            sink: Arc::new(LogLeadSink),
            config,
        }
    }

    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.extractor =
            LeadExtractor::new(Arc::clone(&self.provider), prompts.clone(), self.config.retry);
        self.prompts = prompts;
        self
    }

    #[must_use]
    pub fn with_closing_detector(mut self, closing: Arc<dyn ClosingDetector>) -> Self {
        self.closing = closing;
        self
    }

    #[must_use]
    pub fn with_lead_sink(mut self, sink: Arc<dyn LeadSink>) -> Self {
        self.sink = sink;
        self
    }

    pub async fn state(&self, sender: &str) -> Result<ConversationState, TurnError> {
        let entry = self.store.get(sender).await.map_err(TurnError::Store)?;
        Ok(match entry {
            None => ConversationState::New,
            Some(e) if e.awaiting_reply => ConversationState::AwaitingReply,
            Some(_) => ConversationState::Active,
        })
    }

    /// Process one inbound message from `sender`.
    ///
    /// On failure no reply has been sent and the transcript keeps the
    /// customer line without an answer.
    pub async fn handle_message(&self, sender: &str, body: &str) -> Result<TurnOutcome, TurnError> {
        let existing = self
            .store
            .get_or_create(sender)
            .await
            .map_err(TurnError::Store)?;
        if existing.transcript.is_empty() {
            info!("Starting conversation {} with {sender}", existing.id);
        }

        let entry = self
            .store
            .append(sender, Role::Customer, body)
            .await
            .map_err(TurnError::Store)?
            .ok_or_else(|| {
                TurnError::Store(anyhow::anyhow!("customer line for {sender} was not stored"))
            })?;

        let transcript = entry.transcript.render(&self.config.labels);
        let prompt = self.prompts.build_turn_prompt(&transcript);
        debug!(
            "Turn prompt for {sender}: {} lines, {} chars",
            entry.transcript.len(),
            prompt.len()
        );

        let reply = match generate_with_retry(self.provider.as_ref(), &prompt, &self.config.retry)
            .await
        {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                error!("Reply generation failed for {sender}: {e}");
                self.abandon_turn(sender).await;
                return Err(e.into());
            }
        };

        let message = OutboundMessage {
            body: reply.clone(),
            from: self.config.sender_address.clone(),
            to: sender.to_string(),
        };
        if let Err(e) = self.gateway.send(&message).await {
            error!("Failed to send reply to {sender}: {e}");
            self.abandon_turn(sender).await;
            return Err(TurnError::Dispatch(e));
        }
        info!("Reply sent to {sender}: {reply:?}");

        let appended = self
            .store
            .append(sender, Role::Assistant, &reply)
            .await
            .map_err(TurnError::Store)?;
        let Some(entry) = appended else {
            warn!("Conversation with {sender} closed while a reply was in flight, dropping it");
            return Ok(TurnOutcome::Replied { reply });
        };

        if !self.closing.is_closing(&reply) {
            return Ok(TurnOutcome::Replied { reply });
        }

        // Extraction runs on the evicted snapshot.
        let closed = self
            .store
            .evict(sender)
            .await
            .map_err(TurnError::Store)?
            .unwrap_or(entry);
        info!(
            "Conversation {} with {sender} closed after {} lines",
            closed.id,
            closed.transcript.len()
        );

        let transcript = closed.transcript.render(&self.config.labels);
        let lead = self.extractor.extract_lead(sender, &transcript).await;
        if let Err(e) = self.sink.submit(&lead).await {
            warn!("Lead sink rejected lead for {sender}: {e}");
        }

        Ok(TurnOutcome::Closed { reply, lead })
    }

    /// Return the entry to `Active` after a failed turn.
    async fn abandon_turn(&self, sender: &str) {
        if let Err(e) = self.store.settle(sender).await {
            warn!("Failed to settle conversation for {sender}: {e}");
        }
    }
}
