//! Generation API request/response types and the client trait.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// Wire request for a single image generation.
///
/// One of these is produced per batch item; the `seed` is the only field
/// that varies between items of the same batch.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
}

/// A successfully generated image.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Errors from the generation API layer.
///
/// The split matters for retry policy: transient transport and server
/// conditions are retried with backoff, request-shaped problems are not.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The per-item deadline elapsed before the API responded.
    #[error("Generation timed out after {after:?}")]
    Timeout { after: Duration },

    /// The API rejected the request with 429.
    #[error("Generation API rate limited the request")]
    RateLimited,

    /// The API returned an unexpected status code.
    #[error("Generation API error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// The HTTP request itself failed (connect, DNS, TLS, mid-body, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// The API rejected the request as invalid (400/422).
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    /// The account's generation quota is spent (402).
    #[error("Generation quota exhausted")]
    QuotaExhausted,

    /// A 2xx response whose body could not be used as an image.
    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),
}

impl GenerateError {
    /// Whether another attempt at the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimited | Self::Network(_) => true,
            Self::Upstream { status, .. } => *status >= 500,
            Self::InvalidRequest(_) | Self::QuotaExhausted | Self::MalformedResponse(_) => false,
        }
    }
}

/// Client interface for the image generation service.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    /// Generate a single image.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, GenerateError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
