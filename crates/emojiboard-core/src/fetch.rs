//! Background asset resolution.
//!
//! Turns the document's background reference into renderable image bytes.
//! Remote references are retrieved on worker threads; completions come
//! back through a channel and are applied on the owner thread by
//! [`BackgroundLoader::poll`], where a staleness check discards results
//! for references the document no longer holds.

use crate::document::Background;
use crate::events::{BoardEvent, EventHub};
use image::RgbaImage;
use log::{debug, warn};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;
use thiserror::Error;

/// Errors while resolving a remote background.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("image decode failed: {0}")]
    Decode(String),
}

/// User-visible state of the background resolution pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Nothing in flight.
    Idle,
    /// A remote retrieval is in flight.
    Fetching,
    /// The most recent retrieval for this url failed. No automatic retry.
    Failed(String),
}

/// Retrieves the raw bytes behind a url. The network provider is supplied
/// by the embedding application; implementations run on a worker thread
/// and may block.
pub trait ImageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

type Completion = (String, Result<Vec<u8>, FetchError>);

/// Resolves the current background into an [`RgbaImage`].
///
/// Owns no document state: the editing engine tells it when the background
/// value changed, and `poll` receives the background that is current at
/// completion time for the staleness check.
pub struct BackgroundLoader {
    fetcher: Arc<dyn ImageFetcher>,
    status: FetchStatus,
    image: Option<RgbaImage>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    events: EventHub,
}

impl BackgroundLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, events: EventHub) -> Self {
        let (completion_tx, completion_rx) = channel();
        Self {
            fetcher,
            status: FetchStatus::Idle,
            image: None,
            completion_tx,
            completion_rx,
            events,
        }
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    /// The resolved background image, if any.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// React to the current snapshot's background differing from the
    /// previous snapshot's. Any previously resolved image is cleared;
    /// embedded bytes decode synchronously, remote references start an
    /// asynchronous retrieval.
    pub fn background_changed(&mut self, background: &Background) {
        self.image = None;
        match background {
            Background::Blank => self.set_status(FetchStatus::Idle),
            Background::ImageData(data) => {
                match decode(data) {
                    Ok(img) => {
                        self.image = Some(img);
                        self.events.publish(BoardEvent::ImageResolved);
                    }
                    Err(e) => warn!("embedded background bytes failed to decode: {e}"),
                }
                self.set_status(FetchStatus::Idle);
            }
            Background::Url(url) => {
                self.set_status(FetchStatus::Fetching);
                let fetcher = Arc::clone(&self.fetcher);
                let tx = self.completion_tx.clone();
                let url = url.clone();
                thread::spawn(move || {
                    let result = fetcher.fetch(&url);
                    // If the loader is gone by completion time there is
                    // nobody to tell; the result is simply dropped.
                    let _ = tx.send((url, result));
                });
            }
        }
    }

    /// Drain completed retrievals on the owner thread. `current` is the
    /// background of the document as of this call; a completion for any
    /// other value is stale and discarded without touching state. Returns
    /// the number of completions drained, stale ones included.
    pub fn poll(&mut self, current: &Background) -> usize {
        let mut drained = 0;
        while let Ok((url, result)) = self.completion_rx.try_recv() {
            drained += 1;
            if !matches!(current, Background::Url(u) if *u == url) {
                debug!("discarding stale fetch result for {url}");
                continue;
            }
            match result.and_then(|bytes| decode(&bytes)) {
                Ok(img) => {
                    self.image = Some(img);
                    self.events.publish(BoardEvent::ImageResolved);
                    self.set_status(FetchStatus::Idle);
                }
                Err(e) => {
                    warn!("background fetch for {url} failed: {e}");
                    self.image = None;
                    self.set_status(FetchStatus::Failed(url));
                }
            }
        }
        drained
    }

    fn set_status(&mut self, status: FetchStatus) {
        if self.status != status {
            self.status = status;
            self.events
                .publish(BoardEvent::FetchStatusChanged(self.status.clone()));
        }
    }

    #[cfg(test)]
    pub(crate) fn completion_sender(&self) -> Sender<Completion> {
        self.completion_tx.clone()
    }
}

fn decode(bytes: &[u8]) -> Result<RgbaImage, FetchError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| FetchError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Fetcher whose worker threads never complete; tests drive the
    /// completion channel directly for deterministic interleavings.
    struct NeverFetcher;

    impl ImageFetcher for NeverFetcher {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            loop {
                thread::park();
            }
        }
    }

    struct PngFetcher;

    impl ImageFetcher for PngFetcher {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(png_bytes())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn loader(fetcher: impl ImageFetcher) -> BackgroundLoader {
        BackgroundLoader::new(Arc::new(fetcher), EventHub::new())
    }

    /// Poll until `n` completions have been drained or a timeout passes.
    fn poll_until(loader: &mut BackgroundLoader, current: &Background, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut drained = 0;
        while drained < n {
            drained += loader.poll(current);
            if Instant::now() > deadline {
                panic!("timed out waiting for {n} fetch completions");
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_blank_background_resolves_to_no_image() {
        let mut loader = loader(NeverFetcher);
        loader.background_changed(&Background::Blank);
        assert!(loader.image().is_none());
        assert_eq!(loader.status(), &FetchStatus::Idle);
    }

    #[test]
    fn test_embedded_bytes_decode_synchronously() {
        let mut loader = loader(NeverFetcher);
        loader.background_changed(&Background::ImageData(png_bytes()));
        assert!(loader.image().is_some());
        assert_eq!(loader.status(), &FetchStatus::Idle);
    }

    #[test]
    fn test_undecodable_embedded_bytes_leave_no_image() {
        let mut loader = loader(NeverFetcher);
        loader.background_changed(&Background::ImageData(vec![0, 1, 2, 3]));
        assert!(loader.image().is_none());
        assert_eq!(loader.status(), &FetchStatus::Idle);
    }

    #[test]
    fn test_remote_fetch_resolves_through_worker() {
        let mut loader = loader(PngFetcher);
        let bg = Background::Url("http://x/img.png".into());

        loader.background_changed(&bg);
        assert_eq!(loader.status(), &FetchStatus::Fetching);

        poll_until(&mut loader, &bg, 1);
        assert!(loader.image().is_some());
        assert_eq!(loader.status(), &FetchStatus::Idle);
    }

    #[test]
    fn test_failed_fetch_sets_failed_status() {
        let mut loader = loader(NeverFetcher);
        let bg = Background::Url("http://x/img.png".into());
        loader.background_changed(&bg);

        loader
            .completion_sender()
            .send((
                "http://x/img.png".into(),
                Err(FetchError::Request("connection refused".into())),
            ))
            .unwrap();
        loader.poll(&bg);

        assert_eq!(
            loader.status(),
            &FetchStatus::Failed("http://x/img.png".into())
        );
        assert!(loader.image().is_none());
    }

    #[test]
    fn test_undecodable_fetched_bytes_set_failed_status() {
        let mut loader = loader(NeverFetcher);
        let bg = Background::Url("http://x/a".into());
        loader.background_changed(&bg);

        loader
            .completion_sender()
            .send(("http://x/a".into(), Ok(vec![9, 9, 9])))
            .unwrap();
        loader.poll(&bg);

        assert_eq!(loader.status(), &FetchStatus::Failed("http://x/a".into()));
        assert!(loader.image().is_none());
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut loader = loader(NeverFetcher);
        let a = Background::Url("http://x/a".into());
        let b = Background::Url("http://x/b".into());

        loader.background_changed(&a);
        loader.background_changed(&b);
        assert_eq!(loader.status(), &FetchStatus::Fetching);

        // A's retrieval finishes after the document moved on to B.
        loader
            .completion_sender()
            .send(("http://x/a".into(), Ok(png_bytes())))
            .unwrap();
        assert_eq!(loader.poll(&b), 1);
        assert!(loader.image().is_none());
        assert_eq!(loader.status(), &FetchStatus::Fetching);

        // B's own result still lands normally.
        loader
            .completion_sender()
            .send(("http://x/b".into(), Ok(png_bytes())))
            .unwrap();
        assert_eq!(loader.poll(&b), 1);
        assert!(loader.image().is_some());
        assert_eq!(loader.status(), &FetchStatus::Idle);
    }

    #[test]
    fn test_stale_failure_does_not_clobber_status() {
        let mut loader = loader(NeverFetcher);
        let a = Background::Url("http://x/a".into());
        let b = Background::Url("http://x/b".into());

        loader.background_changed(&a);
        loader.background_changed(&b);

        loader
            .completion_sender()
            .send((
                "http://x/a".into(),
                Err(FetchError::Request("timeout".into())),
            ))
            .unwrap();
        loader.poll(&b);
        assert_eq!(loader.status(), &FetchStatus::Fetching);
    }

    #[test]
    fn test_status_change_is_published() {
        let hub = EventHub::new();
        let rx = hub.subscribe();
        let mut loader = BackgroundLoader::new(Arc::new(NeverFetcher), hub);
        let bg = Background::Url("http://x/a".into());

        loader.background_changed(&bg);
        assert_eq!(
            rx.try_recv().unwrap(),
            BoardEvent::FetchStatusChanged(FetchStatus::Fetching)
        );

        loader
            .completion_sender()
            .send(("http://x/a".into(), Ok(png_bytes())))
            .unwrap();
        loader.poll(&bg);
        assert_eq!(rx.try_recv().unwrap(), BoardEvent::ImageResolved);
        assert_eq!(
            rx.try_recv().unwrap(),
            BoardEvent::FetchStatusChanged(FetchStatus::Idle)
        );
    }
}
