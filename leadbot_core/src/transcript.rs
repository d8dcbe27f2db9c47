//! Transcript and conversation entry types.
//!
//! A transcript is an append-only list of lines tagged with the speaker.
//! It renders to the plain text log the prompts embed, one
//! `"<label>: <text>"` line per message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Role;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptLine {
    pub role: Role,
    pub text: String,
}

/// Speaker labels used when rendering a transcript to text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptLabels {
    pub customer: String,
    pub assistant: String,
}

impl Default for TranscriptLabels {
    fn default() -> Self {
        Self {
            customer: "Cliente".to_string(),
            assistant: "Heloísa".to_string(),
        }
    }
}

impl TranscriptLabels {
    #[must_use]
    pub fn label(&self, role: Role) -> &str {
        match role {
            Role::Customer => &self.customer,
            Role::Assistant => &self.assistant,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
}

impl Transcript {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.lines.push(TranscriptLine {
            role,
            text: text.into(),
        });
    }

    #[must_use]
    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn count(&self, role: Role) -> usize {
        self.lines.iter().filter(|l| l.role == role).count()
    }

    #[must_use]
    pub fn last(&self) -> Option<&TranscriptLine> {
        self.lines.last()
    }

    /// Render as a text log, one newline-terminated line per message.
    #[must_use]
    pub fn render(&self, labels: &TranscriptLabels) -> String {
        self.lines.iter().fold(String::new(), |mut out, line| {
            out.push_str(labels.label(line.role));
            out.push_str(": ");
            out.push_str(&line.text);
            out.push('\n');
            out
        })
    }
}

/// Everything the store keeps for one sender.
#[derive(Debug, Clone)]
pub struct ConversationEntry {
    /// Correlates log lines of one conversation lifecycle
    pub id: Uuid,
    pub sender: String,
    pub transcript: Transcript,
    /// Set while a customer line has no reply yet
    pub awaiting_reply: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationEntry {
    #[must_use]
    pub fn new(sender: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            sender: sender.into(),
            transcript: Transcript::new(),
            awaiting_reply: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn append(&mut self, role: Role, text: impl Into<String>) {
        self.transcript.push(role, text);
        self.awaiting_reply = role == Role::Customer;
        self.updated_at = Utc::now();
    }

    pub fn settle(&mut self) {
        self.awaiting_reply = false;
        self.updated_at = Utc::now();
    }
}
