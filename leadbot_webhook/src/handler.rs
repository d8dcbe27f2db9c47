use crate::{Error, Result, server::AppState};
use axum::{
    extract::{Form, State, rejection::FormRejection},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

/// The fields of a Twilio inbound-message webhook this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "From")]
    pub from: String,
}

/// POST /webhook - one inbound customer message
pub async fn handle_webhook(
    State(state): State<AppState>,
    payload: std::result::Result<Form<InboundMessage>, FormRejection>,
) -> Result<StatusCode> {
    let Form(message) = payload.map_err(|e| Error::Payload(e.body_text()))?;

    info!("[{}] Message: {:?}", message.from, message.body);

    state
        .turns
        .handle_message(&message.from, &message.body)
        .await?;

    Ok(StatusCode::OK)
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
