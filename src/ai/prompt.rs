// src/ai/prompt.rs
use serde_json::{json, Value};

use crate::result::Label;

/// Images are always declared as JPEG to the model, whatever the actual encoding
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

pub const INSTRUCTION: &str = "You are a content moderation assistant. \
Classify the image and the text provided after this instruction. \
For each one choose exactly one label from: gore, violence, nudity, racism, hateSpeech, offensive, notSensitive. \
Use none for imageClassification when no image is provided and for textClassification when the text is empty. \
Set isSensitive to true if either classification is anything other than notSensitive or none. \
Respond only with JSON containing imageClassification, textClassification and isSensitive.";

/// One piece of the request content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

impl ContentPart {
    pub fn is_image(&self) -> bool {
        matches!(self, ContentPart::InlineData { .. })
    }
}

/// Instruction, user text, then the image when there is one
pub fn build_parts(image: Option<&[u8]>, text: &str) -> Vec<ContentPart> {
    let mut parts = vec![
        ContentPart::Text(INSTRUCTION.to_string()),
        ContentPart::Text(text.to_string()),
    ];
    if let Some(bytes) = image {
        parts.push(ContentPart::InlineData {
            mime_type: IMAGE_MIME_TYPE.to_string(),
            data: bytes.to_vec(),
        });
    }
    parts
}

/// JSON schema the model's answer is forced into
pub fn response_schema() -> Value {
    let labels: Vec<&str> = Label::ALL.iter().map(Label::as_str).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "imageClassification": { "type": "STRING", "format": "enum", "enum": labels },
            "textClassification": { "type": "STRING", "format": "enum", "enum": labels },
            "isSensitive": { "type": "BOOLEAN" }
        },
        "required": ["imageClassification", "textClassification", "isSensitive"]
    })
}
