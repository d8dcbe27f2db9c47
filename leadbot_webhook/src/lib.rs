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

//! Twilio WhatsApp webhook front end.

mod error;
mod handler;
mod server;
mod twilio;

pub use error::{Error, Result};
pub use handler::InboundMessage;
pub use server::{AppState, WebhookServer};
pub use twilio::TwilioGateway;
