use thiserror::Error;

/// HTTP status the generation service uses to signal transient overload.
pub const SERVICE_UNAVAILABLE: u16 = 503;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("generation service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request to generation service failed: {0}")]
    Transport(String),

    #[error("invalid response from generation service: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::InvalidResponse(_) => None,
        }
    }

    /// Whether the failure is the transient-overload condition worth retrying.
    #[must_use]
    pub const fn is_overloaded(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: SERVICE_UNAVAILABLE,
                ..
            }
        )
    }
}
