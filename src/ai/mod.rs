// src/ai/mod.rs
pub mod connector;
pub mod gemini;
pub mod prompt;

pub use connector::GenerativeModel;
pub use gemini::GeminiModel;
pub use prompt::{build_parts, ContentPart, IMAGE_MIME_TYPE};
