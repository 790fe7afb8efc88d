// src/error.rs
use thiserror::Error;

/// Failures talking to the hosted model
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode Gemini response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether sending the same request again might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Http(e) => e.is_timeout() || e.is_connect(),
            TransportError::Status { status, .. } => *status == 429 || *status >= 500,
            TransportError::Decode(_) => false,
        }
    }
}

/// The model answered, but not with a usable classification object
#[derive(Debug, Error)]
pub enum ResultParseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response JSON is not an object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' should be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// A label string outside the fixed vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown label '{0}'")]
pub struct UnknownLabel(pub String);

/// Could not turn an image source into bytes
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image encoding failed: {0}")]
    Encoding(String),

    #[error("image decoding failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image fetch failed: {0}")]
    Fetch(String),

    #[error("image stream reported an error: {0}")]
    Resolution(String),

    #[error("image stream closed before delivering a frame")]
    StreamClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("an API key is required")]
    MissingApiKey,

    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("could not build HTTP client: {0}")]
    HttpClient(String),
}

/// Everything a single classification call can fail with.
///
/// An empty answer from the model is not in here: that is `Ok(None)`.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed classification response: {0}")]
    MalformedResponse(#[from] ResultParseError),

    #[error("could not acquire image: {0}")]
    ImageAcquisition(#[from] ImageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl ClassifyError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClassifyError::Transport(e) if e.is_retryable())
    }

    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifyError::Transport(_) => "transport",
            ClassifyError::MalformedResponse(_) => "malformed_response",
            ClassifyError::ImageAcquisition(_) => "image_acquisition",
            ClassifyError::Config(_) => "config",
        }
    }
}
