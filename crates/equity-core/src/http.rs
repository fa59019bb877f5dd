//! Shared HTTP request and status handling.
//!
//! Providers build their own [`reqwest::Client`] and request, then hand the
//! request to [`get_json`], which maps transport failures and HTTP status
//! codes onto [`ProviderError`] consistently.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ProviderError, Result};

/// Builds an HTTP client with the given timeout and user agent.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {e}")))
}

/// Sends `request` and decodes the JSON body.
///
/// `provider` is used in rate-limit errors, `subject` (usually a symbol) in
/// not-found errors.
pub async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
    subject: &str,
) -> Result<T> {
    let text = get_text(request, provider, subject).await?;
    decode_json(&text)
}

/// Sends `request` and returns the body of a successful response.
pub async fn get_text(request: RequestBuilder, provider: &str, subject: &str) -> Result<String> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    debug!(provider, %status, "Received response");

    if let Some(error) = status_error(status, provider, subject) {
        return Err(error);
    }

    response.text().await.map_err(transport_error)
}

/// Decodes a JSON body, keeping a short excerpt of the payload in the error.
pub fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| {
        let excerpt: String = text.chars().take(200).collect();
        ProviderError::Parse(format!("{e}: {excerpt}"))
    })
}

/// Maps a non-success status to an error; `None` for 2xx.
#[must_use]
pub fn status_error(status: StatusCode, provider: &str, subject: &str) -> Option<ProviderError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            provider: provider.to_string(),
            retry_after: Some(Duration::from_secs(60)),
        },
        StatusCode::NOT_FOUND => ProviderError::NotFound(subject.to_string()),
        _ => ProviderError::Upstream(format!("HTTP {status} from {provider} for {subject}")),
    })
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_decode() {
        ProviderError::Parse(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}
