//! In-memory conversation store.

use async_trait::async_trait;
use leadbot_core::{ConversationEntry, ConversationStore, Role};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::debug;

/// Transcripts for the lifetime of the process.
///
/// Cloning shares the same map. The lock is taken per operation only, so
/// two requests for the same sender can interleave their appends.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    entries: Arc<Mutex<HashMap<String, ConversationEntry>>>,
}

impl InMemoryConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_or_create(&self, sender: &str) -> anyhow::Result<ConversationEntry> {
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(sender.to_string()).or_insert_with(|| {
            debug!("Creating conversation entry for {sender}");
            ConversationEntry::new(sender)
        });
        Ok(entry.clone())
    }

    async fn get(&self, sender: &str) -> anyhow::Result<Option<ConversationEntry>> {
        Ok(self.entries.lock().await.get(sender).cloned())
    }

    async fn append(
        &self,
        sender: &str,
        role: Role,
        text: &str,
    ) -> anyhow::Result<Option<ConversationEntry>> {
        let mut entries = self.entries.lock().await;
        let entry = match role {
            Role::Customer => entries
                .entry(sender.to_string())
                .or_insert_with(|| ConversationEntry::new(sender)),
            Role::Assistant => match entries.get_mut(sender) {
                Some(entry) => entry,
                None => return Ok(None),
            },
        };
        entry.append(role, text);
        Ok(Some(entry.clone()))
    }

    async fn settle(&self, sender: &str) -> anyhow::Result<()> {
        if let Some(entry) = self.entries.lock().await.get_mut(sender) {
            entry.settle();
        }
        Ok(())
    }

    async fn evict(&self, sender: &str) -> anyhow::Result<Option<ConversationEntry>> {
        Ok(self.entries.lock().await.remove(sender))
    }

    async fn len(&self) -> anyhow::Result<usize> {
        Ok(self.entries.lock().await.len())
    }
}
