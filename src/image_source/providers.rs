// src/image_source/providers.rs
use log::{info, warn};
use reqwest::Client;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;

use super::stream::{ImageStream, ImageStreamCompleter, LazyImage};
use crate::error::ImageError;

// Run `load` on the current runtime and report its outcome into a fresh stream
fn spawn_load<F>(source: String, load: F) -> Arc<dyn ImageStream>
where
    F: Future<Output = Result<image::DynamicImage, ImageError>> + Send + 'static,
{
    let completer = Arc::new(ImageStreamCompleter::new());
    let producer = completer.producer();

    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                info!("Loading image from {}", source);
                match load.await {
                    Ok(image) => producer.set_frame(image),
                    Err(e) => {
                        warn!("Failed to load {}: {}", source, e);
                        producer.set_error(e.to_string());
                    }
                }
            });
        }
        Err(_) => {
            warn!("No tokio runtime to load {}", source);
            producer.set_error(format!("no tokio runtime available to load {}", source));
        }
    }

    completer
}

/// Image file on disk, read and decoded when resolved
#[derive(Debug, Clone)]
pub struct FileImage {
    path: PathBuf,
}

impl FileImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(path: PathBuf) -> Result<image::DynamicImage, ImageError> {
        let bytes = tokio::fs::read(&path).await?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

impl LazyImage for FileImage {
    fn resolve(&self) -> Arc<dyn ImageStream> {
        spawn_load(self.path.display().to_string(), Self::load(self.path.clone()))
    }
}

/// Image behind an HTTP(S) URL, fetched and decoded when resolved
#[derive(Debug, Clone)]
pub struct NetworkImage {
    url: String,
    client: Client,
}

impl NetworkImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, Client::new())
    }

    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    async fn fetch(client: Client, url: String) -> Result<image::DynamicImage, ImageError> {
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageError::Fetch(format!("{} returned {}", url, response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

impl LazyImage for NetworkImage {
    fn resolve(&self) -> Arc<dyn ImageStream> {
        spawn_load(self.url.clone(), Self::fetch(self.client.clone(), self.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_source::stream::{first_frame, ImageEvent};
    use image::{DynamicImage, GenericImageView, ImageOutputFormat};
    use std::io::Cursor;
    use std::sync::Mutex;

    #[tokio::test]
    async fn file_image_resolves_to_decoded_frame() {
        let mut png = Vec::new();
        DynamicImage::new_rgb8(6, 2)
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .unwrap();
        let path = std::env::temp_dir().join(format!("snapguard-file-image-{}.png", std::process::id()));
        std::fs::write(&path, &png).unwrap();

        let stream = FileImage::new(&path).resolve();
        let frame = first_frame(stream.as_ref()).await.unwrap();
        assert_eq!((frame.width(), frame.height()), (6, 2));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_reports_resolution_error() {
        let stream = FileImage::new("/definitely/not/here.png").resolve();
        assert!(matches!(
            first_frame(stream.as_ref()).await,
            Err(ImageError::Resolution(_))
        ));
    }

    #[tokio::test]
    async fn undecodable_file_reports_decode_failure() {
        let path = std::env::temp_dir().join(format!("snapguard-not-an-image-{}.png", std::process::id()));
        std::fs::write(&path, b"definitely not a png").unwrap();

        let stream = FileImage::new(&path).resolve();
        match first_frame(stream.as_ref()).await {
            Err(ImageError::Resolution(message)) => {
                assert!(message.starts_with("image decoding failed"), "{message}");
            }
            other => panic!("expected resolution error, got {other:?}"),
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn resolving_outside_a_runtime_reports_an_error() {
        let stream = FileImage::new("/tmp/whatever.png").resolve();

        let seen: Arc<Mutex<Option<ImageEvent>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        stream.add_listener(Arc::new(move |event: ImageEvent| {
            *slot.lock().unwrap() = Some(event);
        }));

        match seen.lock().unwrap().take() {
            Some(Err(message)) => assert!(message.contains("no tokio runtime"), "{message}"),
            other => panic!("expected an error event, got {other:?}"),
        };
    }
}
