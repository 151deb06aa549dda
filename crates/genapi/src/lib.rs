//! Client for the image generation HTTP API.
//!
//! [`GenerationApi`] is the seam the scheduler engine calls through;
//! [`http::HttpGenerationClient`] is the production implementation and tests
//! substitute scripted fakes. Retry pacing for failed calls lives in
//! [`backoff`]; the decision of whether to retry at all belongs to
//! [`api::GenerateError::is_retryable`].

pub mod api;
pub mod backoff;
pub mod http;

pub use api::{GenerateError, GeneratedImage, GenerationApi, GenerationRequest};
pub use backoff::{next_backoff, RetryConfig};
pub use http::HttpGenerationClient;
