use thiserror::Error;

#[derive(Debug, Error)]
pub enum NlpError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("input too short: {chars} characters (minimum {min})")]
    InputTooShort { chars: usize, min: usize },

    #[error("model {model} returned status {status}")]
    UnexpectedStatus { model: String, status: u16 },

    #[error("unusable response from model {model}: {reason}")]
    InvalidResponse { model: String, reason: String },

    #[error("unknown sentiment label from classifier: {0}")]
    UnknownLabel(String),
}
