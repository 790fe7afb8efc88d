// src/classifier.rs
use image::DynamicImage;
use log::{Level, Log, Metadata, Record};
use std::fmt;
use std::sync::Arc;

use crate::ai::{build_parts, GeminiModel, GenerativeModel};
use crate::config::ClassifierConfig;
use crate::error::{ClassifyError, ImageError};
use crate::image_source::{encode_png, normalize, resolve_to_bytes, ImageSource, LazyImage};
use crate::result::ClassificationResult;

const LOG_TARGET: &str = "snapguard::classifier";

/// Forwards to whatever logger the process installed
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalLogger;

impl Log for GlobalLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        log::logger().log(record)
    }

    fn flush(&self) {
        log::logger().flush()
    }
}

/// Classifies text and images as sensitive or not through a hosted model
pub struct SensitiveContentClassifier {
    model: Arc<dyn GenerativeModel>,
    logger: Arc<dyn Log>,
}

impl SensitiveContentClassifier {
    /// Build a classifier backed by Gemini
    pub fn new(config: ClassifierConfig, logger: Arc<dyn Log>) -> Result<Self, ClassifyError> {
        let model = GeminiModel::new(&config)?;
        Ok(Self::with_model(Arc::new(model), logger))
    }

    /// Build a classifier on top of any model backend
    pub fn with_model(model: Arc<dyn GenerativeModel>, logger: Arc<dyn Log>) -> Self {
        Self { model, logger }
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder().level(level).target(LOG_TARGET).build();
        if self.logger.enabled(&metadata) {
            self.logger.log(
                &Record::builder()
                    .metadata(metadata)
                    .args(args)
                    .module_path_static(Some(module_path!()))
                    .file_static(Some(file!()))
                    .build(),
            );
        }
    }

    /// Classify text and optional image bytes.
    ///
    /// `Ok(None)` means the model gave back no usable text.
    pub async fn try_classify(
        &self,
        image: Option<&[u8]>,
        text: &str,
    ) -> Result<Option<ClassificationResult>, ClassifyError> {
        let parts = build_parts(image, text);
        self.emit(
            Level::Info,
            format_args!(
                "Classifying {} chars of text{}",
                text.chars().count(),
                image.map_or(String::new(), |b| format!(" and a {} byte image", b.len()))
            ),
        );

        let answer = match self.model.generate(&parts).await? {
            Some(answer) => answer,
            None => {
                self.emit(Level::Warn, format_args!("Model returned no classification text"));
                return Ok(None);
            }
        };

        let result = ClassificationResult::from_json(&answer)?;
        self.emit(
            Level::Debug,
            format_args!(
                "Classified image={} text={} sensitive={}",
                result.image_classification(),
                result.text_classification(),
                result.is_sensitive()
            ),
        );
        Ok(Some(result))
    }

    /// Like [`try_classify`](Self::try_classify) but logs failures and returns `None`
    pub async fn classify(&self, image: Option<&[u8]>, text: &str) -> Option<ClassificationResult> {
        let outcome = self.try_classify(image, text).await;
        self.collapse(outcome)
    }

    pub async fn try_classify_decoded_image(
        &self,
        image: &DynamicImage,
        text: &str,
    ) -> Result<Option<ClassificationResult>, ClassifyError> {
        let bytes = encode_png(image)?;
        self.try_classify(Some(bytes.as_slice()), text).await
    }

    pub async fn classify_decoded_image(
        &self,
        image: &DynamicImage,
        text: &str,
    ) -> Option<ClassificationResult> {
        let outcome = self.try_classify_decoded_image(image, text).await;
        self.collapse(outcome)
    }

    pub async fn try_classify_image_source(
        &self,
        source: &dyn LazyImage,
        text: &str,
    ) -> Result<Option<ClassificationResult>, ClassifyError> {
        let bytes = resolve_to_bytes(source).await?;
        self.try_classify(Some(bytes.as_slice()), text).await
    }

    pub async fn classify_image_source(
        &self,
        source: &dyn LazyImage,
        text: &str,
    ) -> Option<ClassificationResult> {
        let outcome = self.try_classify_image_source(source, text).await;
        self.collapse(outcome)
    }

    /// Classify any [`ImageSource`], or text alone when `source` is `None`
    pub async fn try_classify_source(
        &self,
        source: Option<ImageSource>,
        text: &str,
    ) -> Result<Option<ClassificationResult>, ClassifyError> {
        let bytes = match source {
            Some(source) => Some(normalize(source).await?),
            None => None,
        };
        self.try_classify(bytes.as_deref(), text).await
    }

    fn collapse(
        &self,
        outcome: Result<Option<ClassificationResult>, ClassifyError>,
    ) -> Option<ClassificationResult> {
        match outcome {
            Ok(result) => result,
            Err(e) => {
                let level = match &e {
                    ClassifyError::ImageAcquisition(ImageError::StreamClosed) => Level::Warn,
                    _ => Level::Error,
                };
                self.emit(
                    level,
                    format_args!("Classification failed ({}): {}", e.kind(), e),
                );
                None
            }
        }
    }
}
