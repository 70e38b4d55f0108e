//! Client for a hosted model inference endpoint.
//!
//! Models are addressed as `POST {base_url}/models/{model}` with a JSON body
//! of `{"inputs": ..., "parameters": ...}`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use newsdigest_core::{Sentiment, SentimentLabel};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::NlpError;
use crate::{ensure_summarizable, truncate_chars, SentimentClassifier, Summarizer};

/// Character budget sent to the summarization model.
const SUMMARY_INPUT_CHARS: usize = 2_000;

/// Character budget sent to the classifier (its encoder caps at 512 tokens).
const CLASSIFIER_INPUT_CHARS: usize = 512;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Shared HTTP client for the inference endpoint.
#[derive(Debug)]
pub struct InferenceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl InferenceClient {
    /// # Errors
    ///
    /// Returns [`NlpError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, NlpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn invoke<T: DeserializeOwned>(&self, model: &str, body: &Value) -> Result<T, NlpError> {
        let url = format!("{}/models/{model}", self.base_url);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NlpError::UnexpectedStatus {
                model: model.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str::<T>(&text).map_err(|e| NlpError::InvalidResponse {
            model: model.to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Classification endpoints answer either with a flat list of label scores
/// or with one list per input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationOutput {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationOutput {
    fn best(self) -> Option<LabelScore> {
        let candidates = match self {
            ClassificationOutput::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            ClassificationOutput::Flat(scores) => scores,
        };
        candidates
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Summarizer backed by a sequence-to-sequence model.
#[derive(Debug)]
pub struct InferenceSummarizer {
    client: Arc<InferenceClient>,
    model: String,
    min_length: u32,
    max_length: u32,
}

impl InferenceSummarizer {
    #[must_use]
    pub fn new(
        client: Arc<InferenceClient>,
        model: &str,
        min_length: u32,
        max_length: u32,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            min_length,
            max_length,
        }
    }
}

#[async_trait]
impl Summarizer for InferenceSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, NlpError> {
        ensure_summarizable(text)?;
        let body = json!({
            "inputs": truncate_chars(text.trim(), SUMMARY_INPUT_CHARS),
            "parameters": {
                "min_length": self.min_length,
                "max_length": self.max_length,
                "do_sample": false,
            },
            "options": { "wait_for_model": true },
        });

        let outputs: Vec<SummaryOutput> = self.client.invoke(&self.model, &body).await?;
        let summary = outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| NlpError::InvalidResponse {
                model: self.model.clone(),
                reason: "no summary_text in response".to_string(),
            })?;
        Ok(summary)
    }
}

/// Sentiment classifier backed by a sequence-classification model.
#[derive(Debug)]
pub struct InferenceClassifier {
    client: Arc<InferenceClient>,
    model: String,
}

impl InferenceClassifier {
    #[must_use]
    pub fn new(client: Arc<InferenceClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SentimentClassifier for InferenceClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment, NlpError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NlpError::InputTooShort { chars: 0, min: 1 });
        }
        let body = json!({
            "inputs": truncate_chars(text, CLASSIFIER_INPUT_CHARS),
            "options": { "wait_for_model": true },
        });

        let output: ClassificationOutput = self.client.invoke(&self.model, &body).await?;
        let best = output.best().ok_or_else(|| NlpError::InvalidResponse {
            model: self.model.clone(),
            reason: "empty label list".to_string(),
        })?;

        let label = SentimentLabel::from_model_label(&best.label)
            .map_err(|_| NlpError::UnknownLabel(best.label.clone()))?;
        Ok(Sentiment {
            label,
            score: best.score.clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_output_picks_highest_score() {
        let output: ClassificationOutput = serde_json::from_str(
            r#"[[{"label":"LABEL_0","score":0.1},{"label":"LABEL_2","score":0.7},{"label":"LABEL_1","score":0.2}]]"#,
        )
        .unwrap();
        let best = output.best().unwrap();
        assert_eq!(best.label, "LABEL_2");
    }

    #[test]
    fn flat_output_picks_highest_score() {
        let output: ClassificationOutput =
            serde_json::from_str(r#"[{"label":"negative","score":0.91}]"#).unwrap();
        assert_eq!(output.best().unwrap().label, "negative");
    }

    #[test]
    fn empty_output_has_no_best() {
        let output: ClassificationOutput = serde_json::from_str("[]").unwrap();
        assert!(output.best().is_none());
    }
}
