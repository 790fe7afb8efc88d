// src/ai/connector.rs
use async_trait::async_trait;

use super::prompt::ContentPart;
use crate::error::TransportError;

/// Interface to a hosted generative model
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Send one request and return the model's text answer.
    ///
    /// `Ok(None)` means the model answered without any usable text.
    async fn generate(&self, parts: &[ContentPart]) -> Result<Option<String>, TransportError>;
}
