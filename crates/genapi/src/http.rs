//! HTTP implementation of [`GenerationApi`] using [`reqwest`].
//!
//! A successful generation returns the image bytes directly in the response
//! body with the content type in the header; errors are classified by
//! status code into the [`GenerateError`] taxonomy.

use async_trait::async_trait;

use crate::api::{GenerateError, GeneratedImage, GenerationApi, GenerationRequest};

/// Content type assumed when the API omits the header.
const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// HTTP client for the generation service.
pub struct HttpGenerationClient {
    client: reqwest::Client,
    api_url: String,
}

impl HttpGenerationClient {
    /// Create a new client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8188`.
    pub fn new(api_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (useful for
    /// connection pooling with other API consumers).
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or the classified [`GenerateError`] built from
    /// the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GenerateError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(Self::classify_status(status.as_u16(), body))
    }

    /// Map a non-2xx status to the error taxonomy.
    fn classify_status(status: u16, body: String) -> GenerateError {
        match status {
            400 | 422 => GenerateError::InvalidRequest(body),
            402 => GenerateError::QuotaExhausted,
            429 => GenerateError::RateLimited,
            _ => GenerateError::Upstream { status, body },
        }
    }
}

#[async_trait]
impl GenerationApi for HttpGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, GenerateError> {
        let response = self
            .client
            .post(format!("{}/v1/generations", self.api_url))
            .json(request)
            .send()
            .await
            .map_err(|e| GenerateError::Network(e.to_string()))?;

        let response = Self::ensure_success(response).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| GenerateError::Network(e.to_string()))?
            .to_vec();
        if data.is_empty() {
            return Err(GenerateError::MalformedResponse(
                "response body was empty".to_string(),
            ));
        }

        Ok(GeneratedImage { data, content_type })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
