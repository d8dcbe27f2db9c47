//! Structured lead extraction from a finished conversation.
//!
//! The model is asked for JSON only, but replies often wrap the object in
//! prose or code fences. The first `{` through the last `}` is taken as the
//! candidate object.

use chrono::{DateTime, Utc};
use leadbot_core::LLMProvider;
use leadbot_providers::{RetryPolicy, generate_with_retry};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::prompt::PromptBuilder;

/// Field value reported when extraction did not produce an object.
pub const EXTRACTION_SENTINEL: &str = "could not extract";

static JSON_OBJECT: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn json_object() -> &'static Regex {
    JSON_OBJECT.get_or_init(|| {
        Regex::new(r"(?s)\{.*\}").expect("Static regex pattern is guaranteed to be valid")
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub interest: Option<String>,
}

/// What the extraction pass produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Parsed(LeadFields),
    /// The reply held no JSON object, or the object did not fit the schema
    Unparseable { raw: String },
    /// The extraction request itself failed
    Unavailable { reason: String },
}

impl ExtractionOutcome {
    /// Parse the first brace-delimited object out of a free-form reply.
    #[must_use]
    pub fn parse(response: &str) -> Self {
        let Some(candidate) = json_object().find(response) else {
            return Self::Unparseable {
                raw: response.to_string(),
            };
        };

        match serde_json::from_str::<LeadFields>(candidate.as_str()) {
            Ok(fields) => Self::Parsed(fields),
            Err(e) => {
                warn!("Extraction reply is not a lead object: {e}");
                Self::Unparseable {
                    raw: response.to_string(),
                }
            }
        }
    }

    #[must_use]
    pub const fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// Lead record produced once per conversation, at eviction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLead {
    pub sender: String,
    pub outcome: ExtractionOutcome,
    /// Full transcript as rendered for the prompts
    pub transcript: String,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractedLead {
    fn field<'a>(&'a self, pick: impl Fn(&'a LeadFields) -> &'a Option<String>) -> Option<&'a str> {
        match &self.outcome {
            ExtractionOutcome::Parsed(fields) => pick(fields).as_deref(),
            ExtractionOutcome::Unparseable { .. } | ExtractionOutcome::Unavailable { .. } => {
                Some(EXTRACTION_SENTINEL)
            }
        }
    }

    /// `None` only when the model reported the field as unknown.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.field(|f| &f.name)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.field(|f| &f.email)
    }

    #[must_use]
    pub fn interest(&self) -> Option<&str> {
        self.field(|f| &f.interest)
    }
}

/// Runs the second generation pass over a closed conversation.
#[derive(Clone)]
pub struct LeadExtractor {
    provider: Arc<dyn LLMProvider>,
    prompts: PromptBuilder,
    retry: RetryPolicy,
}

impl LeadExtractor {
    #[must_use]
    pub fn new(provider: Arc<dyn LLMProvider>, prompts: PromptBuilder, retry: RetryPolicy) -> Self {
        Self {
            provider,
            prompts,
            retry,
        }
    }

    /// Never fails: a failed request or unparseable reply is recorded in
    /// the outcome and every field falls back to [`EXTRACTION_SENTINEL`].
    pub async fn extract_lead(&self, sender: &str, transcript: &str) -> ExtractedLead {
        let prompt = self.prompts.build_extraction_prompt(transcript);

        let outcome = match generate_with_retry(self.provider.as_ref(), &prompt, &self.retry).await
        {
            Ok(response) => ExtractionOutcome::parse(&response),
            Err(e) => {
                warn!("Lead extraction request failed for {sender}: {e}");
                ExtractionOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        info!(
            "Lead extraction for {sender}: {}",
            if outcome.is_parsed() { "parsed" } else { "degraded" }
        );

        ExtractedLead {
            sender: sender.to_string(),
            outcome,
            transcript: transcript.to_string(),
            extracted_at: Utc::now(),
        }
    }
}
