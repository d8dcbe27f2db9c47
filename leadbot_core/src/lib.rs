#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod transcript;

pub use error::{ProviderError, SERVICE_UNAVAILABLE};
pub use transcript::{ConversationEntry, Transcript, TranscriptLabels, TranscriptLine};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Assistant,
}

/// A message handed to the messaging gateway for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub body: String,
    pub from: String,
    pub to: String,
}

/// Single prompt in, single completion out.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
    fn model(&self) -> &str;
}

#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()>;
}

/// Per-sender transcript storage.
///
/// At most one entry exists per sender. Implementations only need
/// read-your-writes within a process; nothing is ordered across senders.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Return the entry for `sender`, creating an empty one if absent.
    async fn get_or_create(&self, sender: &str) -> anyhow::Result<ConversationEntry>;

    async fn get(&self, sender: &str) -> anyhow::Result<Option<ConversationEntry>>;

    /// Append one line and return a snapshot of the entry afterwards.
    ///
    /// A customer line marks the entry as awaiting a reply and creates the
    /// entry if it does not exist. An assistant line clears that mark; it is
    /// dropped and `None` returned when the sender has no entry.
    async fn append(
        &self,
        sender: &str,
        role: Role,
        text: &str,
    ) -> anyhow::Result<Option<ConversationEntry>>;

    /// Clear the awaiting-reply mark without appending anything.
    async fn settle(&self, sender: &str) -> anyhow::Result<()>;

    async fn evict(&self, sender: &str) -> anyhow::Result<Option<ConversationEntry>>;

    async fn len(&self) -> anyhow::Result<usize>;
}
