use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Three-way sentiment label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Positive,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Positive => "positive",
        }
    }

    /// Maps a raw classifier label to a sentiment.
    ///
    /// Index labels follow the three-class financial sentiment head:
    /// `LABEL_0` negative, `LABEL_1` neutral, `LABEL_2` positive.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSentimentLabel`] for any other label.
    pub fn from_model_label(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LABEL_0" | "NEGATIVE" => Ok(SentimentLabel::Negative),
            "LABEL_1" | "NEUTRAL" => Ok(SentimentLabel::Neutral),
            "LABEL_2" | "POSITIVE" => Ok(SentimentLabel::Positive),
            _ => Err(CoreError::UnknownSentimentLabel(raw.to_string())),
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            "positive" => Ok(SentimentLabel::Positive),
            _ => Err(CoreError::UnknownSentimentLabel(s.to_string())),
        }
    }
}
