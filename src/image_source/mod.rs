// src/image_source/mod.rs
use image::{DynamicImage, GenericImageView};
use std::fmt;
use std::sync::Arc;

pub mod encode;
pub mod providers;
pub mod stream;

pub use encode::encode_png;
pub use providers::{FileImage, NetworkImage};
pub use stream::{
    first_frame, ImageEvent, ImageListener, ImageProducer, ImageStream, ImageStreamCompleter,
    LazyImage, ListenerId,
};

use crate::error::ImageError;

/// The different shapes an image can arrive in
pub enum ImageSource {
    /// Already encoded; forwarded untouched
    Bytes(Vec<u8>),
    /// Decoded pixels; encoded to PNG before sending
    Decoded(DynamicImage),
    /// Not resolved yet; the first frame is taken then encoded to PNG
    Lazy(Arc<dyn LazyImage>),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            ImageSource::Decoded(image) => f
                .debug_tuple("Decoded")
                .field(&(image.width(), image.height()))
                .finish(),
            ImageSource::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

/// Turn any image source into the bytes sent to the model
pub async fn normalize(source: ImageSource) -> Result<Vec<u8>, ImageError> {
    match source {
        ImageSource::Bytes(bytes) => Ok(bytes),
        ImageSource::Decoded(image) => encode_png(&image),
        ImageSource::Lazy(lazy) => resolve_to_bytes(lazy.as_ref()).await,
    }
}

/// Resolve a lazy image, take its first frame and encode it
pub async fn resolve_to_bytes(lazy: &dyn LazyImage) -> Result<Vec<u8>, ImageError> {
    let stream = lazy.resolve();
    let frame = first_frame(stream.as_ref()).await?;
    encode_png(&frame)
}
