#![warn(
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

//! Lead-qualification conversations.
//!
//! Each sender gets one transcript that grows by a customer line and an
//! assistant line per turn. When the assistant's reply closes the
//! conversation, a second generation pass extracts the lead's details and
//! the transcript is dropped.
//!
//! # Key Pieces
//! - [`InMemoryConversationStore`]: process-local transcripts keyed by sender
//! - [`PromptBuilder`]: persona/flow template and extraction template
//! - [`ClosingDetector`]: decides whether a reply ends the conversation
//! - [`LeadExtractor`]: JSON-in-prose extraction with sentinel fallback
//! - [`TurnHandler`]: one inbound message, start to finish

mod closing;
mod extraction;
mod handler;
mod prompt;
mod sink;
mod store;

pub use closing::{ClosingDetector, MarkerPhrase};
pub use extraction::{
    EXTRACTION_SENTINEL, ExtractedLead, ExtractionOutcome, LeadExtractor, LeadFields,
};
pub use handler::{ConversationState, TurnConfig, TurnError, TurnHandler, TurnOutcome};
pub use prompt::PromptBuilder;
pub use sink::{LeadSink, LogLeadSink};
pub use store::InMemoryConversationStore;
