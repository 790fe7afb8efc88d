//! Sensitive content classification for text and images.
//!
//! Images are normalized to bytes ([`image_source`]), sent together with the text to a
//! hosted Gemini model ([`ai`]), and the JSON verdict is parsed into a
//! [`ClassificationResult`].

pub mod ai;
pub mod classifier;
pub mod config;
pub mod error;
pub mod image_source;
pub mod result;

pub use classifier::{GlobalLogger, SensitiveContentClassifier};
pub use config::ClassifierConfig;
pub use error::{
    ClassifyError, ConfigError, ImageError, ResultParseError, TransportError,
    UnknownLabel,
};
pub use image_source::{FileImage, ImageSource, LazyImage, NetworkImage};
pub use result::{ClassificationResult, Label};
