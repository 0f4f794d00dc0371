use thiserror::Error;

#[derive(Debug, Error)]
pub enum NewsbridgeError {
    #[error("parse error: {0}")]
    Parse(String),

    /// The envelope was readable but this item must not be ingested.
    #[error("item skipped: {0}")]
    SkipItem(String),

    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid timestamp {value:?}")]
    Timestamp { value: String },

    #[error("vocabulary {id} is not available")]
    MissingVocabulary { id: String },

    #[error("item {id} not found in archive")]
    ItemNotFound { id: String },

    /// Outbound HTTP against a Belga catalog failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("media blob {id} not found")]
    MediaNotFound { id: String },

    #[error("formatting failed for subscriber {subscriber}: {message}")]
    Format { subscriber: String, message: String },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl NewsbridgeError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn skip(message: impl Into<String>) -> Self {
        Self::SkipItem(message.into())
    }

    pub fn timestamp(value: impl Into<String>) -> Self {
        Self::Timestamp {
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NewsbridgeError>;
