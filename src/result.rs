// src/result.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{ResultParseError, UnknownLabel};

const IMAGE_CLASSIFICATION: &str = "imageClassification";
const TEXT_CLASSIFICATION: &str = "textClassification";
const IS_SENSITIVE: &str = "isSensitive";

/// Vocabulary the model is told to pick from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Gore,
    Violence,
    Nudity,
    Racism,
    HateSpeech,
    Offensive,
    NotSensitive,
    None,
}

impl Label {
    pub const ALL: [Label; 8] = [
        Label::Gore,
        Label::Violence,
        Label::Nudity,
        Label::Racism,
        Label::HateSpeech,
        Label::Offensive,
        Label::NotSensitive,
        Label::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Gore => "gore",
            Label::Violence => "violence",
            Label::Nudity => "nudity",
            Label::Racism => "racism",
            Label::HateSpeech => "hateSpeech",
            Label::Offensive => "offensive",
            Label::NotSensitive => "notSensitive",
            Label::None => "none",
        }
    }

    pub fn is_sensitive(&self) -> bool {
        !matches!(self, Label::NotSensitive | Label::None)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// Verdict returned by the model for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    image_classification: String,
    text_classification: String,
    is_sensitive: bool,
}

impl ClassificationResult {
    pub fn new(
        image_classification: impl Into<String>,
        text_classification: impl Into<String>,
        is_sensitive: bool,
    ) -> Self {
        Self {
            image_classification: image_classification.into(),
            text_classification: text_classification.into(),
            is_sensitive,
        }
    }

    pub fn image_classification(&self) -> &str {
        &self.image_classification
    }

    pub fn text_classification(&self) -> &str {
        &self.text_classification
    }

    pub fn is_sensitive(&self) -> bool {
        self.is_sensitive
    }

    pub fn image_label(&self) -> Option<Label> {
        self.image_classification.parse().ok()
    }

    pub fn text_label(&self) -> Option<Label> {
        self.text_classification.parse().ok()
    }

    /// Whether the reported flag agrees with the two labels.
    ///
    /// Unknown labels count as sensitive. Nothing in the crate acts on this; the
    /// provider's `isSensitive` is always returned as-is.
    pub fn flag_matches_labels(&self) -> bool {
        let sensitive = |label: Option<Label>| label.map_or(true, |l| l.is_sensitive());
        let derived = sensitive(self.image_label()) || sensitive(self.text_label());
        derived == self.is_sensitive
    }

    pub fn with_image_classification(&self, image_classification: impl Into<String>) -> Self {
        Self {
            image_classification: image_classification.into(),
            ..self.clone()
        }
    }

    pub fn with_text_classification(&self, text_classification: impl Into<String>) -> Self {
        Self {
            text_classification: text_classification.into(),
            ..self.clone()
        }
    }

    pub fn with_sensitive(&self, is_sensitive: bool) -> Self {
        Self {
            is_sensitive,
            ..self.clone()
        }
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            IMAGE_CLASSIFICATION.to_string(),
            Value::String(self.image_classification.clone()),
        );
        map.insert(
            TEXT_CLASSIFICATION.to_string(),
            Value::String(self.text_classification.clone()),
        );
        map.insert(IS_SENSITIVE.to_string(), Value::Bool(self.is_sensitive));
        map
    }

    /// Strict conversion: every key must be present with the right JSON type
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ResultParseError> {
        Ok(Self {
            image_classification: string_field(map, IMAGE_CLASSIFICATION)?,
            text_classification: string_field(map, TEXT_CLASSIFICATION)?,
            is_sensitive: bool_field(map, IS_SENSITIVE)?,
        })
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.to_map()).to_string()
    }

    pub fn from_json(text: &str) -> Result<Self, ResultParseError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Self::from_map(&map),
            _ => Err(ResultParseError::NotAnObject),
        }
    }
}

fn string_field(map: &Map<String, Value>, field: &'static str) -> Result<String, ResultParseError> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ResultParseError::WrongType { field, expected: "string" }),
        None => Err(ResultParseError::MissingField(field)),
    }
}

fn bool_field(map: &Map<String, Value>, field: &'static str) -> Result<bool, ResultParseError> {
    match map.get(field) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ResultParseError::WrongType { field, expected: "boolean" }),
        None => Err(ResultParseError::MissingField(field)),
    }
}
