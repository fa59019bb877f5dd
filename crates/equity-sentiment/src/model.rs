//! Model-based sentiment classification.

use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use equity_core::{ProviderConfig, ProviderError, RateLimiter, Result, http, provider::ids};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::label::SentimentLabel;

/// Hugging Face inference endpoint for FinBERT.
const FINBERT_URL: &str = "https://api-inference.huggingface.co/models/ProsusAI/finbert";

/// Display name used in errors and logs.
const PROVIDER_NAME: &str = "Hugging Face";

/// User agent for HTTP requests.
const USER_AGENT: &str = "equity-sentiment/0.1";

/// Default input limit for transformer classifiers.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 512;

/// Confidence for one class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    /// Class label.
    pub label: SentimentLabel,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// A classifier returning per-class confidences for a text.
#[async_trait]
pub trait ModelScorer: Send + Sync + Debug {
    /// Name recorded in results.
    fn name(&self) -> &str;

    /// Longest input the model accepts, in characters.
    fn max_input_chars(&self) -> usize {
        DEFAULT_MAX_INPUT_CHARS
    }

    /// Classifies `text`, already truncated to [`Self::max_input_chars`].
    async fn classify(&self, text: &str) -> Result<Vec<ClassScore>>;
}

/// Returns the class with the highest confidence.
///
/// Ties keep the first class reported.
#[must_use]
pub fn top_class(scores: &[ClassScore]) -> Option<ClassScore> {
    scores
        .iter()
        .copied()
        .filter(|s| s.confidence.is_finite())
        .reduce(|best, s| if s.confidence > best.confidence { s } else { best })
}

/// Truncates `text` to at most `max_chars` characters on a char boundary.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// FinBERT over the Hugging Face inference API.
#[derive(Clone)]
pub struct FinBertClient {
    client: reqwest::Client,
    api_key: String,
    limiter: Arc<RateLimiter>,
}

impl Debug for FinBertClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinBertClient")
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl FinBertClient {
    /// Creates a client when an API key is configured; `Ok(None)` otherwise.
    pub fn from_config(config: &ProviderConfig, limiter: Arc<RateLimiter>) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };
        let client = http::build_client(config.request_timeout, USER_AGENT)?;
        Ok(Some(Self::with_client(client, api_key, limiter)))
    }

    /// Creates a client with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, api_key: impl Into<String>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            limiter,
        }
    }
}

#[async_trait]
impl ModelScorer for FinBertClient {
    fn name(&self) -> &str {
        "finbert"
    }

    async fn classify(&self, text: &str) -> Result<Vec<ClassScore>> {
        self.limiter
            .try_acquire(ids::HUGGINGFACE)
            .map_err(|denied| denied.into_error(PROVIDER_NAME))?;

        trace!(chars = text.chars().count(), "FinBERT request");
        let request = self
            .client
            .post(FINBERT_URL)
            .bearer_auth(&self.api_key)
            .json(&InferenceRequest { inputs: text });

        let response: InferenceResponse = http::get_json(request, PROVIDER_NAME, "finbert").await?;
        let scores = parse_scores(response);
        if scores.is_empty() {
            return Err(ProviderError::Parse("FinBERT returned no known labels".to_string()));
        }
        Ok(scores)
    }
}

/// Maps raw labels to [`ClassScore`]s, skipping labels that are not one of
/// positive, neutral or negative.
fn parse_scores(response: InferenceResponse) -> Vec<ClassScore> {
    let raw = match response {
        InferenceResponse::Nested(mut batches) => {
            if batches.is_empty() {
                Vec::new()
            } else {
                batches.swap_remove(0)
            }
        }
        InferenceResponse::Flat(scores) => scores,
    };

    raw.into_iter()
        .filter_map(|s| {
            Some(ClassScore {
                label: s.label.parse().ok()?,
                confidence: s.score,
            })
        })
        .collect()
}

// ============================================================================
// Inference API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// The API answers `[[{label, score}, ...]]` for one input, though some
/// deployments return the flat list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<RawScore>>),
    Flat(Vec<RawScore>),
}

#[derive(Debug, Deserialize)]
struct RawScore {
    label: String,
    score: f64,
}
