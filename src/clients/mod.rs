pub mod http;

use crate::credentials::Secret;
use crate::models::LanguageModel;
use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpModelClient;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

impl SendError {
    /// Transient failures worth another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Sends one prompt to one model endpoint and returns the response text.
///
/// Implementations hold no per-request state and are shared between the
/// concurrent tasks of a dispatch.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn send(
        &self,
        model: &LanguageModel,
        prompt: &str,
        secret: &Secret,
    ) -> Result<String, SendError>;
}
