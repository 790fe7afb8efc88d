// src/image_source/stream.rs
use image::{DynamicImage, GenericImageView};
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

use crate::error::ImageError;

/// What a stream hands its listeners: a decoded frame or an error message
pub type ImageEvent = Result<Arc<DynamicImage>, String>;

pub type ImageListener = Arc<dyn Fn(ImageEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An image that resolves asynchronously and notifies registered listeners.
///
/// Multi-frame sources may notify the same listener more than once.
pub trait ImageStream: Send + Sync {
    fn add_listener(&self, listener: ImageListener) -> ListenerId;
    fn remove_listener(&self, id: ListenerId);
}

/// Reference to image data that is not decoded yet (a file, a URL, ...)
pub trait LazyImage: Send + Sync {
    /// Start resolving and return the stream that will report the result.
    ///
    /// Implementations that load in the background need a running tokio runtime;
    /// without one the returned stream reports an error instead.
    fn resolve(&self) -> Arc<dyn ImageStream>;
}

#[derive(Default)]
struct CompleterState {
    next_id: u64,
    listeners: Vec<(ListenerId, ImageListener)>,
    latest: Option<ImageEvent>,
    closed: bool,
}

/// Listener registry that producers push frames or errors into.
///
/// A listener added after an event was reported gets that latest event straight away.
#[derive(Default)]
pub struct ImageStreamCompleter {
    state: Mutex<CompleterState>,
}

impl ImageStreamCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CompleterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_frame(&self, frame: DynamicImage) {
        self.report(Ok(Arc::new(frame)));
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.report(Err(message.into()));
    }

    pub fn listener_count(&self) -> usize {
        self.state().listeners.len()
    }

    /// Handle for the task that loads the image. Closes the stream if dropped unreported.
    pub fn producer(self: &Arc<Self>) -> ImageProducer {
        ImageProducer {
            completer: Arc::clone(self),
            reported: false,
        }
    }

    /// No more events will come. Listeners still waiting are dropped uncalled.
    pub fn close(&self) {
        let dropped = {
            let mut state = self.state();
            state.closed = true;
            std::mem::take(&mut state.listeners)
        };
        drop(dropped);
    }

    fn report(&self, event: ImageEvent) {
        // Call listeners outside the lock so they may add or remove listeners
        let listeners: Vec<ImageListener> = {
            let mut state = self.state();
            state.latest = Some(event.clone());
            state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(event.clone());
        }
    }
}

impl ImageStream for ImageStreamCompleter {
    fn add_listener(&self, listener: ImageListener) -> ListenerId {
        let (id, replay) = {
            let mut state = self.state();
            let id = ListenerId(state.next_id);
            state.next_id += 1;
            if !state.closed {
                state.listeners.push((id, Arc::clone(&listener)));
            }
            (id, state.latest.clone())
        };
        if let Some(event) = replay {
            listener(event);
        }
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.state().listeners.retain(|(existing, _)| *existing != id);
    }
}

/// Reporting side of an [`ImageStreamCompleter`].
///
/// Dropping it without reporting (task panicked or aborted) closes the stream, so
/// waiters see [`ImageError::StreamClosed`] instead of hanging.
pub struct ImageProducer {
    completer: Arc<ImageStreamCompleter>,
    reported: bool,
}

impl ImageProducer {
    pub fn set_frame(mut self, frame: DynamicImage) {
        self.reported = true;
        self.completer.set_frame(frame);
    }

    pub fn set_error(mut self, message: impl Into<String>) {
        self.reported = true;
        self.completer.set_error(message);
    }
}

impl Drop for ImageProducer {
    fn drop(&mut self) {
        if !self.reported {
            debug!("Image producer dropped without reporting, closing stream");
            self.completer.close();
        }
    }
}

// Unregisters on drop, so every exit from the wait (including cancellation) cleans up
struct ListenerGuard<'a> {
    stream: &'a dyn ImageStream,
    id: ListenerId,
}

impl Drop for ListenerGuard<'_> {
    fn drop(&mut self) {
        self.stream.remove_listener(self.id);
    }
}

/// Wait for the first event from `stream`, then unregister.
///
/// Registers exactly one listener and removes it exactly once. Later frames of
/// animated sources are ignored.
pub async fn first_frame(stream: &dyn ImageStream) -> Result<Arc<DynamicImage>, ImageError> {
    let (tx, rx) = oneshot::channel::<ImageEvent>();
    let slot = Mutex::new(Some(tx));

    let listener: ImageListener = Arc::new(move |event: ImageEvent| {
        let sender = slot.lock().ok().and_then(|mut s| s.take());
        if let Some(sender) = sender {
            let _ = sender.send(event);
        }
    });

    let id = stream.add_listener(listener);
    let _guard = ListenerGuard { stream, id };

    match rx.await {
        Ok(Ok(frame)) => {
            debug!("Image stream resolved: {}x{}", frame.width(), frame.height());
            Ok(frame)
        }
        Ok(Err(message)) => Err(ImageError::Resolution(message)),
        // The stream dropped our listener without ever calling it
        Err(_) => Err(ImageError::StreamClosed),
    }
}
