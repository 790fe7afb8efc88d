// src/image_source/encode.rs
use image::{DynamicImage, ImageOutputFormat};
use std::io::Cursor;

use crate::error::ImageError;

/// Encode a decoded image as PNG
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ImageError::Encoding(e.to_string()))?;

    if buffer.is_empty() {
        return Err(ImageError::Encoding("encoder produced no bytes".to_string()));
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn encodes_to_png_signature() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 255])));
        let bytes = encode_png(&image).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }
}
