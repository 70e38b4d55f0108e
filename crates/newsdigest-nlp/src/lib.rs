//! Summarization and sentiment classification for scraped articles.
//!
//! Two interchangeable backends implement the [`Summarizer`] and
//! [`SentimentClassifier`] traits: a remote model inference endpoint and an
//! offline lexicon backend used in development and tests.

pub mod error;
pub mod inference;
pub mod lexicon;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use newsdigest_core::{AppConfig, NlpBackend, Sentiment};

pub use error::NlpError;
pub use inference::{InferenceClassifier, InferenceClient, InferenceSummarizer};
pub use lexicon::{lexicon_score, LeadSummarizer, LexiconClassifier};

/// Content shorter than this (in characters) is not worth summarizing.
pub const MIN_INPUT_CHARS: usize = 30;

/// Produces an abstractive summary of article text.
#[async_trait]
pub trait Summarizer: Send + Sync + fmt::Debug {
    /// # Errors
    ///
    /// Returns [`NlpError::InputTooShort`] for empty or very short text, or a
    /// backend-specific error if the model call fails.
    async fn summarize(&self, text: &str) -> Result<String, NlpError>;
}

/// Assigns a three-way sentiment label with a confidence score.
#[async_trait]
pub trait SentimentClassifier: Send + Sync + fmt::Debug {
    /// # Errors
    ///
    /// Returns an error if the text is empty, the model call fails, or the
    /// model answers with a label outside the known set.
    async fn classify(&self, text: &str) -> Result<Sentiment, NlpError>;
}

/// The summarizer/classifier pair selected by configuration.
#[derive(Debug, Clone)]
pub struct NlpBackends {
    pub summarizer: Arc<dyn Summarizer>,
    pub classifier: Arc<dyn SentimentClassifier>,
}

/// Build the configured NLP backends.
///
/// # Errors
///
/// Returns [`NlpError::Http`] if the inference HTTP client cannot be built.
pub fn build_backends(config: &AppConfig) -> Result<NlpBackends, NlpError> {
    let min = usize::try_from(config.summary_min_length).unwrap_or(usize::MAX);
    let max = usize::try_from(config.summary_max_length).unwrap_or(usize::MAX);

    match (&config.nlp_backend, config.inference_url.as_deref()) {
        (NlpBackend::Inference, Some(url)) => {
            let client = Arc::new(InferenceClient::new(
                url,
                config.inference_api_key.clone(),
            )?);
            Ok(NlpBackends {
                summarizer: Arc::new(InferenceSummarizer::new(
                    Arc::clone(&client),
                    &config.summary_model,
                    config.summary_min_length,
                    config.summary_max_length,
                )),
                classifier: Arc::new(InferenceClassifier::new(client, &config.sentiment_model)),
            })
        }
        (NlpBackend::Inference, None) => {
            tracing::warn!("inference backend selected without a URL; using lexicon backend");
            Ok(lexicon_backends(min, max))
        }
        (NlpBackend::Lexicon, _) => Ok(lexicon_backends(min, max)),
    }
}

fn lexicon_backends(min_words: usize, max_words: usize) -> NlpBackends {
    NlpBackends {
        summarizer: Arc::new(LeadSummarizer::new(min_words, max_words)),
        classifier: Arc::new(LexiconClassifier),
    }
}

/// Reject text that is empty or shorter than [`MIN_INPUT_CHARS`].
pub(crate) fn ensure_summarizable(text: &str) -> Result<(), NlpError> {
    let chars = text.trim().chars().count();
    if chars < MIN_INPUT_CHARS {
        return Err(NlpError::InputTooShort {
            chars,
            min: MIN_INPUT_CHARS,
        });
    }
    Ok(())
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_rejected() {
        let err = ensure_summarizable("   too short   ").unwrap_err();
        assert!(
            matches!(err, NlpError::InputTooShort { chars: 9, min: 30 }),
            "got: {err:?}"
        );
        assert!(ensure_summarizable("").is_err());
    }

    #[test]
    fn long_enough_input_is_accepted() {
        assert!(ensure_summarizable(&"가".repeat(MIN_INPUT_CHARS)).is_ok());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("한국어 기사", 3), "한국어");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
