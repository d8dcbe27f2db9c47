use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use leadbot_conversation::TurnError;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Turn failed: {0}")]
    Turn(#[from] TurnError),

    #[error("Malformed webhook payload: {0}")]
    Payload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Every failure is a bare 500; the gateway only learns accept or reject.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("Webhook request failed: {self}");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
